use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::HeatmapConfig;
use crate::heatmap::HeatmapGrid;
use crate::statistics::TargetStatistics;
use crate::wire;

/// Final payload of a run: the config echo, per-target statistics and the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapReport {
    pub targets: Vec<String>,
    pub interval: f64,
    pub samples: u32,
    pub timeout: f64,
    pub packet_size: usize,
    pub statistics: Vec<TargetStatistics>,
    pub heatmap_data: HeatmapGrid,
    pub show_graph: bool,
    #[serde(serialize_with = "wire::serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl HeatmapReport {
    pub fn assemble(
        config: &HeatmapConfig,
        statistics: Vec<TargetStatistics>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let heatmap_data = HeatmapGrid::build(&statistics);
        Self {
            targets: config.targets.clone(),
            interval: config.interval,
            samples: config.samples,
            timeout: config.timeout,
            packet_size: config.packet_size,
            statistics,
            heatmap_data,
            show_graph: config.show_graph,
            timestamp,
        }
    }

    pub fn statistics_for(&self, target: &str) -> Option<&TargetStatistics> {
        self.statistics.iter().find(|s| s.target == target)
    }
}
