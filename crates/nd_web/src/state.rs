use std::sync::Arc;

use nd_core::{CacheStore, InferenceModel};
use nd_pipeline::Pipeline;

pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn model(&self) -> &Arc<dyn InferenceModel> {
        self.pipeline.model()
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        self.pipeline.cache().store_handle()
    }
}
