use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::statistics::TargetStatistics;
use crate::wire;

/// Display range used when no cell holds a positive latency.
pub const FALLBACK_RANGE: (f64, f64) = (0.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HeatmapCell {
    /// No sample at this position.
    #[default]
    Empty,
    Failed,
    Latency(f64),
}

impl HeatmapCell {
    pub fn as_f64(self) -> f64 {
        match self {
            HeatmapCell::Empty => 0.0,
            HeatmapCell::Failed => wire::FAILED_RTT,
            HeatmapCell::Latency(ms) => ms,
        }
    }
}

impl From<Option<f64>> for HeatmapCell {
    fn from(rtt: Option<f64>) -> Self {
        rtt.map_or(HeatmapCell::Failed, HeatmapCell::Latency)
    }
}

impl Serialize for HeatmapCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// Target-by-time latency matrix plus the bounds for color scaling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapGrid {
    pub targets: Vec<String>,
    #[serde(serialize_with = "wire::serialize_timestamps")]
    pub timestamps: Vec<DateTime<Utc>>,
    pub latency_data: Vec<Vec<HeatmapCell>>,
    pub min_latency: f64,
    pub max_latency: f64,
}

impl HeatmapGrid {
    /// Lays the statistics out on the first target's timeline.
    ///
    /// Rows follow the order of `stats`. A series longer than the timeline
    /// is truncated; a shorter one leaves its trailing cells empty.
    pub fn build(stats: &[TargetStatistics]) -> Self {
        let targets: Vec<String> = stats.iter().map(|s| s.target.clone()).collect();
        let timestamps = stats
            .first()
            .map(|s| s.timestamps.clone())
            .unwrap_or_default();
        let width = timestamps.len();

        let mut bounds: Option<(f64, f64)> = None;
        let latency_data = stats
            .iter()
            .map(|stat| {
                let mut row = vec![HeatmapCell::Empty; width];
                for (cell, rtt) in row.iter_mut().zip(&stat.rtts) {
                    *cell = HeatmapCell::from(*rtt);
                    if let Some(ms) = rtt.filter(|ms| *ms > 0.0) {
                        bounds = Some(match bounds {
                            Some((lo, hi)) => (lo.min(ms), hi.max(ms)),
                            None => (ms, ms),
                        });
                    }
                }
                row
            })
            .collect();

        let (min_latency, max_latency) = bounds.unwrap_or(FALLBACK_RANGE);

        Self {
            targets,
            timestamps,
            latency_data,
            min_latency,
            max_latency,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.targets.len(), self.timestamps.len())
    }
}
