pub mod config;
pub mod heatmap;
pub mod ping;
pub mod prober;
pub mod report;
pub mod sampler;
pub mod scheduler;
pub mod statistics;
pub mod wire;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::info;
use tokio_util::sync::CancellationToken;

pub use config::{ConfigError, HeatmapConfig};
pub use heatmap::{HeatmapCell, HeatmapGrid};
pub use ping::Sample;
pub use prober::{IcmpProber, ProbeOutcome, Prober};
pub use report::HeatmapReport;
pub use statistics::TargetStatistics;

use sampler::SampleSettings;
use scheduler::Scheduler;

/// One latency heatmap run over a validated configuration.
pub struct LatencyHeatmap {
    config: HeatmapConfig,
    settings: SampleSettings,
    prober: Arc<dyn Prober>,
    cancel: CancellationToken,
    deadline: Option<Duration>,
}

impl LatencyHeatmap {
    pub fn new(config: HeatmapConfig, prober: Arc<dyn Prober>) -> Result<Self, ConfigError> {
        config.validate()?;
        let settings = SampleSettings {
            samples: config.samples,
            interval: config.interval_duration()?,
            timeout: config.timeout_duration()?,
            packet_size: config.packet_size,
        };
        Ok(Self {
            config,
            settings,
            prober,
            cancel: CancellationToken::new(),
            deadline: None,
        })
    }

    /// Stops sampling once `deadline` has elapsed since `run` started.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Token shared by every sampler of this run. Cancelling it stops
    /// further rounds; `run` still returns a report of what was collected.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub async fn run(self) -> HeatmapReport {
        let started = Instant::now();
        info!(
            "Sampling {} targets, {} rounds every {}s",
            self.config.targets.len(),
            self.config.samples,
            self.config.interval
        );

        let timer = self
            .deadline
            .map(|d| scheduler::spawn_deadline(d, self.cancel.clone()));

        let samples = Scheduler::new(self.config.targets.clone(), self.settings, self.prober)
            .collect(self.cancel.clone())
            .await;

        if let Some(timer) = timer {
            timer.abort();
        }
        if self.cancel.is_cancelled() {
            info!("Run cancelled, reporting {} collected samples", samples.len());
        }

        let statistics = statistics::aggregate(samples);
        let report = HeatmapReport::assemble(&self.config, statistics, Utc::now());
        info!("Run finished in {:.1?}", started.elapsed());
        report
    }
}
