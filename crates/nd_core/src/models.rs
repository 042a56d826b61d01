use async_trait::async_trait;
use crate::types::ArticleRecord;
use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync {
    fn name(&self) -> &str;

    /// Extract a ranked list of thematic keywords from a set of articles
    async fn extract_keywords(&self, articles: &[ArticleRecord]) -> Result<Vec<String>>;

    /// Summarize a set of articles into a short paragraph
    async fn summarize_articles(&self, articles: &[ArticleRecord]) -> Result<String>;

    /// Write a prose report from chosen keywords and a summary
    async fn generate_report(&self, keywords: &[String], summary: &str) -> Result<String>;
}
