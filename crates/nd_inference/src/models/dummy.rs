use std::collections::HashMap;
use std::fmt;
use nd_core::{ArticleRecord, InferenceModel, Result};
use crate::keywords::filter_echoed_keywords;
use crate::Config;

/// Offline stand-in: frequency-ranked tokens as keywords, leading titles as summary.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub async fn new(_config: Option<Config>) -> Result<Self> {
        Ok(Self)
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn extract_keywords(&self, articles: &[ArticleRecord]) -> Result<Vec<String>> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for article in articles {
            for token in article.processed_text.split_whitespace() {
                if token.chars().count() >= 2 {
                    *counts.entry(token).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let keywords = ranked.into_iter().map(|(token, _)| token.to_string()).collect();
        Ok(filter_echoed_keywords(keywords, &[]))
    }

    async fn summarize_articles(&self, articles: &[ArticleRecord]) -> Result<String> {
        Ok(articles
            .iter()
            .take(5)
            .map(|a| a.title.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(". "))
    }

    async fn generate_report(&self, keywords: &[String], summary: &str) -> Result<String> {
        Ok(format!("{}: {}", keywords.join(", "), summary))
    }
}
