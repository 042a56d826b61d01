use std::sync::Arc;
use nd_core::{Error, InferenceModel, Result};
use tracing::info;
use crate::Config;

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAIModel;

/// Build the model named by `config.model_name` (`openai` when unset).
pub async fn create_model(config: Option<Config>) -> Result<Arc<dyn InferenceModel>> {
    let config = config.unwrap_or_default();
    let name = config.model_name.clone().unwrap_or_else(|| "openai".to_string());

    let model: Arc<dyn InferenceModel> = match name.as_str() {
        "openai" => Arc::new(OpenAIModel::new(&config)?),
        "dummy" => Arc::new(DummyModel::new(Some(config)).await?),
        other => {
            return Err(Error::Config(format!(
                "Unknown model: {}. Available models: openai, dummy",
                other
            )));
        }
    };

    info!("🧠 Inference model ready (using {})", model.name());
    Ok(model)
}
