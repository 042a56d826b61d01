use clap::Parser;
use nd_core::{CacheStore, Error, Result, SearchSession};
use nd_inference::Config as InferenceConfig;
use nd_pipeline::{Pipeline, PipelineConfig};
use nd_search::{init_logging, Logger, NaverNewsClient, SearchConfig};
use nd_storage::ArticleCache;
use nd_web::AppState;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Parse a timeout such as `30s` or `1m 30s`; zero is rejected.
fn parse_timeout(s: &str) -> std::result::Result<Duration, String> {
    let duration = humantime::parse_duration(s).map_err(|e| e.to_string())?;
    if duration.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(duration)
}

async fn check_storage_with_retry(store: &Arc<dyn CacheStore>, max_retries: u32, timeout: Duration, log: &Logger) -> Result<()> {
    let mut retries = 0;
    let mut last_error = None;

    while retries < max_retries {
        match tokio::time::timeout(timeout, store.ping()).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => last_error = Some(e),
            Err(elapsed) => {
                last_error = Some(Error::Storage(format!("Storage health check timed out: {}", elapsed)));
            }
        }
        retries += 1;
        if retries < max_retries {
            log.warn(&format!("Storage health check failed, retrying {}/{}...", retries, max_retries));
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| Error::Storage("Storage health check failed after all retries".to_string())))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Keyword news search with duplicate clustering", long_about = None)]
pub struct Cli {
    /// Cache backend: memory or sqlite
    #[arg(long, env = "ND_STORAGE", default_value = "memory")]
    storage: String,
    /// SQLite database path for the sqlite backend
    #[arg(long, env = "ND_SQLITE_PATH")]
    backend_url: Option<String>,
    #[arg(long, env = "ND_MODEL", default_value = "openai", help = "Keyword model. Available models: openai (default), dummy")]
    model: String,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
    #[arg(long, env = "OPENAI_BASE_URL")]
    model_url: Option<String>,
    #[arg(long, env = "NAVER_CLIENT_ID", hide_env_values = true)]
    naver_client_id: Option<String>,
    #[arg(long, env = "NAVER_CLIENT_SECRET", hide_env_values = true)]
    naver_client_secret: Option<String>,
    /// Upper bound on collected items per search
    #[arg(long, env = "ND_MAX_RESULTS", default_value_t = 500)]
    max_results: usize,
    /// Timeout for outbound HTTP calls (e.g. 30s, 1m)
    #[arg(long, env = "ND_HTTP_TIMEOUT", default_value = "30s", value_parser = parse_timeout)]
    http_timeout: Duration,
    /// Seed for per-cluster sampling
    #[arg(long, env = "ND_SEED")]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "ND_BIND", default_value = "0.0.0.0:5001")]
        bind: String,
    },
    /// Run one search and print the JSON response
    Search {
        #[arg(required = true)]
        terms: Vec<String>,
        /// Refine a previous search: no keyword extraction, no cache write
        #[arg(long)]
        derived: bool,
    },
    /// Inspect or clear the cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
enum CacheCommands {
    List,
    Clear,
}

impl Cli {
    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            client_id: self.naver_client_id.clone().unwrap_or_default(),
            client_secret: self.naver_client_secret.clone().unwrap_or_default(),
            max_results: self.max_results,
            timeout: self.http_timeout,
            ..Default::default()
        }
    }

    fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            api_key: self.openai_api_key.clone(),
            model_name: Some(self.model.clone()),
            base_url: self.model_url.clone(),
            timeout: self.http_timeout,
            ..Default::default()
        }
    }

    async fn pipeline(&self, cache: ArticleCache, log: &Logger) -> Result<Pipeline> {
        let search = self.search_config();
        let source = Arc::new(NaverNewsClient::new(search.clone())?);
        log.info("🦗 Naver news client initialized");

        let model = nd_inference::create_model(Some(self.inference_config())).await?;
        log.info(&format!("🧠 Keyword model initialized (using {})", model.name()));

        let config = PipelineConfig {
            seed: self.seed,
            ..Default::default()
        };
        Ok(Pipeline::new(source, model, cache, search, config))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let log = init_logging().with_new_prefixes("[nd]".to_string());
    let cli = Cli::parse();

    let store = nd_storage::create_storage(cli.storage.as_str(), cli.backend_url.as_deref()).await?;
    log.info("💾 Checking storage connection...");
    check_storage_with_retry(&store, 3, Duration::from_secs(10), &log).await?;
    let cache = ArticleCache::new(store);

    match &cli.command {
        Commands::Serve { bind } => {
            let pipeline = cli.pipeline(cache, &log).await?;
            nd_web::serve(AppState::new(pipeline), bind).await?;
        }
        Commands::Search { terms, derived } => {
            let pipeline = cli.pipeline(cache, &log).await?;
            let session = if *derived {
                SearchSession::derived(terms.clone())
            } else {
                SearchSession::initial(terms.join(" "))
            };
            let response = pipeline.search(&session).await;
            info!("✅ {} articles, keywords: {:?}", response.articles.len(), response.keywords);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Cache { command: CacheCommands::List } => {
            let entries = cache.list_entries().await?;
            log.info(&format!("📦 {} cached keyword entries", entries.len()));
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Cache { command: CacheCommands::Clear } => {
            let deleted = cache.clear().await?;
            println!("Deleted {} keys", deleted);
        }
    }

    Ok(())
}
