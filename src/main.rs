use std::sync::Arc;

use clap::Parser;
use latency_heatmap::config::positive_duration;
use latency_heatmap::{HeatmapConfig, IcmpProber, LatencyHeatmap};
use log::{info, warn};

/// Ping a set of hosts repeatedly and print latency statistics and a heatmap grid as JSON.
#[derive(Parser, Debug)]
#[command(name = "latency-heatmap", version, about, long_about = None)]
struct Cli {
    /// Comma separated target hosts
    #[arg(value_name = "TARGETS")]
    positional_targets: Option<String>,

    /// Comma separated target hosts (alternative to the positional form)
    #[arg(short, long, conflicts_with = "positional_targets")]
    targets: Option<String>,

    /// Seconds between rounds
    #[arg(short, long)]
    interval: Option<f64>,

    /// Rounds per target
    #[arg(short = 'n', long)]
    samples: Option<u32>,

    /// Seconds before a round counts as lost
    #[arg(short = 'w', long)]
    timeout: Option<f64>,

    /// ICMP payload size in bytes
    #[arg(short = 's', long)]
    packet_size: Option<usize>,

    /// Mark the report as not meant for graphing
    #[arg(long)]
    no_graph: bool,

    /// Stop sampling after this many seconds and report what was collected
    #[arg(long)]
    deadline: Option<f64>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,
}

impl Cli {
    fn apply(self, config: &mut HeatmapConfig) {
        if let Some(targets) = self.positional_targets.or(self.targets) {
            config.targets = targets.split(',').map(|t| t.trim().to_string()).collect();
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(packet_size) = self.packet_size {
            config.packet_size = packet_size;
        }
        if self.no_graph {
            config.show_graph = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let deadline = cli
        .deadline
        .map(|secs| positive_duration("deadline", secs))
        .transpose()?;
    let compact = cli.compact;

    let mut config = HeatmapConfig::load();
    cli.apply(&mut config);

    let mut heatmap = LatencyHeatmap::new(config, Arc::new(IcmpProber::new()))?;
    if let Some(deadline) = deadline {
        heatmap = heatmap.with_deadline(deadline);
    }

    let cancel = heatmap.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with partial results");
            cancel.cancel();
        }
    });

    let report = heatmap.run().await;
    info!("Collected statistics for {} targets", report.statistics.len());

    let output = if compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{output}");
    Ok(())
}
