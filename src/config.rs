use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub type Number = f32;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_DIMENSIONS: usize = 1536;
pub const DEFAULT_TOP_K: usize = 5;
/// Largest batch the embeddings endpoint accepts in one request.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 2048;
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 100;

#[derive(Deserialize)]
pub struct LogsaiConfig {
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub embedding_model: Option<String>,
    pub chat_model: Option<String>,
    pub dimensions: Option<usize>,
    pub top_k: Option<usize>,
    pub embed_batch_size: Option<usize>,
    pub max_upload_mb: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub verbose: Option<bool>,
}

impl LogsaiConfig {
    pub fn try_from(config: &Config) -> Result<Self, ConfigError> {
        Ok(LogsaiConfig {
            api_base: config.get("api_base").ok(),
            api_key: config.get("api_key").ok(),
            embedding_model: config.get("embedding_model").ok(),
            chat_model: config.get("chat_model").ok(),
            dimensions: config.get("dimensions").ok(),
            top_k: config.get("top_k").ok(),
            embed_batch_size: config.get("embed_batch_size").ok(),
            max_upload_mb: config.get("max_upload_mb").ok(),
            request_timeout_secs: config.get("request_timeout_secs").ok(),
            verbose: config.get("verbose").ok(),
        })
    }
}

pub struct State {
    pub api_base: String,
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    pub dimensions: usize,
    pub top_k: usize,
    pub embed_batch_size: usize,
    pub max_upload_bytes: u64,
    pub request_timeout: Option<Duration>,
    pub verbose: bool,
}

impl State {
    /// Loads `logsai_config.*` from the working directory, then `LOGSAI_*` variables.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .add_source(ConfigFile::with_name("logsai_config").required(false))
            .add_source(Environment::with_prefix("LOGSAI"))
            .build()?;

        let logsai_config = LogsaiConfig::try_from(&config)?;
        Self::from_config(logsai_config)
    }

    pub fn from_config(logsai_config: LogsaiConfig) -> Result<Self> {
        let api_base = logsai_config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let api_key = logsai_config
            .api_key
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.is_empty());

        let embedding_model = logsai_config
            .embedding_model
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        let chat_model = logsai_config
            .chat_model
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        let dimensions = logsai_config.dimensions.unwrap_or(DEFAULT_DIMENSIONS);
        let top_k = logsai_config.top_k.unwrap_or(DEFAULT_TOP_K);
        let embed_batch_size = logsai_config
            .embed_batch_size
            .unwrap_or(DEFAULT_EMBED_BATCH_SIZE);
        let max_upload_mb = logsai_config.max_upload_mb.unwrap_or(DEFAULT_MAX_UPLOAD_MB);

        if dimensions == 0 {
            anyhow::bail!("LOGSAI_DIMENSIONS must be at least 1.");
        }
        if top_k == 0 {
            anyhow::bail!("LOGSAI_TOP_K must be at least 1.");
        }
        if embed_batch_size == 0 {
            anyhow::bail!("LOGSAI_EMBED_BATCH_SIZE must be at least 1.");
        }

        Ok(Self {
            api_base,
            api_key,
            embedding_model,
            chat_model,
            dimensions,
            top_k,
            embed_batch_size,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            request_timeout: logsai_config.request_timeout_secs.map(Duration::from_secs),
            verbose: logsai_config.verbose.unwrap_or(false),
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("LOGSAI_API_KEY (or OPENAI_API_KEY) not set in config or environment")
    }

    pub fn print_config(&self) {
        println!("api_base={}", self.api_base);
        println!(
            "api_key={}",
            if self.api_key.is_some() { "<set>" } else { "<unset>" }
        );
        println!("embedding_model={}", self.embedding_model);
        println!("chat_model={}", self.chat_model);
        println!("dimensions={}", self.dimensions);
        println!("top_k={}", self.top_k);
        println!("embed_batch_size={}", self.embed_batch_size);
        println!("max_upload_bytes={}", self.max_upload_bytes);
        match self.request_timeout {
            Some(timeout) => println!("request_timeout_secs={}", timeout.as_secs()),
            None => println!("request_timeout_secs=none"),
        }
        println!("verbose={}", self.verbose);
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the `verbose` default.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "logsai=debug" } else { "logsai=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
