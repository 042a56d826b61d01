use std::time::Duration;

use nd_storage::DEFAULT_TTL;

use crate::params::ParameterGrid;
use crate::segment::SegmenterConfig;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub segmenter: SegmenterConfig,
    pub grid: ParameterGrid,
    /// Seed for per-cluster sampling; `None` draws from entropy
    pub seed: Option<u64>,
    pub cache_ttl: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            grid: ParameterGrid::default(),
            seed: None,
            cache_ttl: DEFAULT_TTL,
        }
    }
}

impl PipelineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_segmenter(mut self, segmenter: SegmenterConfig) -> Self {
        self.segmenter = segmenter;
        self
    }
}
