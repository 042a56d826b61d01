use std::time::Duration;

pub mod keywords;
pub mod models;

pub use nd_core::InferenceModel;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    /// `openai` (default) or `dummy`
    pub model_name: Option<String>,
    pub base_url: Option<String>,
    pub chat_model: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: None,
            base_url: None,
            chat_model: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::create_model;
    pub use super::keywords::{filter_echoed_keywords, parse_keywords};
    pub use nd_core::{ArticleRecord, Result, Error, InferenceModel};
}

pub use models::create_model;
