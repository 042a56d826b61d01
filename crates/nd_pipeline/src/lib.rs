pub mod config;
pub mod dbscan;
pub mod dedup;
pub mod normalize;
pub mod orchestrator;
pub mod params;
pub mod process;
pub mod segment;
pub mod vectorize;

pub use config::PipelineConfig;
pub use dedup::{deduplicate, samples_per_cluster, Deduplicated};
pub use normalize::{clean_html, format_published_at, normalize_record};
pub use orchestrator::{compose_keywords, Pipeline, KEYWORD_QUERY_MESSAGE, RETRY_MESSAGE};
pub use params::{search_parameters, select_parameters, ParameterGrid};
pub use process::{process_batch, BatchOutcome};
pub use segment::{CohesionModel, SegmenterConfig};
pub use vectorize::{DistanceMatrix, TfidfMatrix};

pub mod prelude {
    pub use super::{Pipeline, PipelineConfig, SegmenterConfig};
    pub use nd_core::{ArticleRecord, PipelineResponse, Result, Error, SearchSession};
}
