pub mod error;
pub mod models;
pub mod source;
pub mod storage;
pub mod types;

pub use error::Error;
pub use models::InferenceModel;
pub use source::{NewsSource, SortMode};
pub use storage::CacheStore;
pub use types::*;

pub type Result<T> = std::result::Result<T, Error>;
