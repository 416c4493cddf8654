use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ping::Sample;
use crate::wire;

/// Summary of one target's rounds. Latencies are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetStatistics {
    pub target: String,
    pub min_rtt: f64,
    pub avg_rtt: f64,
    pub max_rtt: f64,
    pub median_rtt: f64,
    pub jitter: f64,
    /// Percentage of rounds without a reply.
    pub packet_loss: f64,
    #[serde(serialize_with = "wire::serialize_rtts")]
    pub rtts: Vec<Option<f64>>,
    #[serde(serialize_with = "wire::serialize_timestamps")]
    pub timestamps: Vec<DateTime<Utc>>,
}

impl TargetStatistics {
    /// Builds the summary from one target's samples, which must already be
    /// in time order.
    pub fn from_samples(target: impl Into<String>, samples: &[Sample]) -> Self {
        let rtts: Vec<Option<f64>> = samples.iter().map(|s| s.rtt_ms).collect();
        let timestamps = samples.iter().map(|s| s.timestamp).collect();

        let mut successes: Vec<f64> = rtts.iter().flatten().copied().collect();
        successes.sort_by(f64::total_cmp);

        let (min_rtt, max_rtt) = match (successes.first(), successes.last()) {
            (Some(min), Some(max)) => (*min, *max),
            _ => (0.0, 0.0),
        };
        let avg_rtt = mean(&successes);
        let median_rtt = median(&successes);
        let jitter = mean_absolute_deviation(&successes, avg_rtt);

        let total = rtts.len();
        let packet_loss = if total == 0 {
            0.0
        } else {
            (total - successes.len()) as f64 / total as f64 * 100.0
        };

        Self {
            target: target.into(),
            min_rtt: round2(min_rtt),
            avg_rtt: round2(avg_rtt),
            max_rtt: round2(max_rtt),
            median_rtt: round2(median_rtt),
            jitter: round2(jitter),
            packet_loss: round2(packet_loss),
            rtts,
            timestamps,
        }
    }

    pub fn successful_samples(&self) -> usize {
        self.rtts.iter().flatten().count()
    }
}

/// Groups samples by target, orders each group by time and summarizes it.
/// The result is sorted by target name.
pub fn aggregate(samples: Vec<Sample>) -> Vec<TargetStatistics> {
    let mut by_target: HashMap<String, Vec<Sample>> = HashMap::new();
    for sample in samples {
        by_target.entry(sample.target.clone()).or_default().push(sample);
    }

    let mut stats: Vec<TargetStatistics> = by_target
        .into_iter()
        .map(|(target, mut group)| {
            group.sort_by_key(|s| s.timestamp);
            TargetStatistics::from_samples(target, &group)
        })
        .collect();

    stats.sort_by(|a, b| a.target.cmp(&b.target));
    stats
}

/// Round half up to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `sorted` must be in ascending order.
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 0 => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
        _ => sorted[n / 2],
    }
}

fn mean_absolute_deviation(values: &[f64], center: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| (v - center).abs()).sum::<f64>() / values.len() as f64
}
