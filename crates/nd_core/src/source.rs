use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::types::RawArticle;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Relevance order
    #[default]
    Sim,
    /// Newest first
    Date,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Sim => "sim",
            SortMode::Date => "date",
        }
    }
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Returns the name of the search provider
    fn name(&self) -> &str;

    /// Fetches one page of results. `start` is 1-based.
    async fn fetch_page(
        &self,
        query: &str,
        display: usize,
        start: usize,
        sort: SortMode,
    ) -> Result<Vec<RawArticle>>;
}
