pub mod client;
pub mod collect;
pub mod logging;

pub use client::{NaverNewsClient, SearchConfig};
pub use collect::collect_articles;
pub use logging::{init_logging, Logger};

pub mod prelude {
    pub use super::client::{NaverNewsClient, SearchConfig};
    pub use super::collect::collect_articles;
    pub use nd_core::{NewsSource, RawArticle, Result, Error, SortMode};
}
