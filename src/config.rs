use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Court Index server.
///
/// Every credential is optional at startup so that `/health` stays useful on a
/// half-configured deployment; the pipeline reports the missing piece at
/// request time instead.
#[derive(Debug)]
pub struct Config {
    /// API key for the Pinecone index that stores content vectors.
    pub pinecone_api_key: Option<String>,
    /// Optional data-plane host override, bypassing control-plane discovery.
    pub pinecone_index_host: Option<String>,
    /// OpenAI API key used by the batch endpoint to generate embeddings.
    pub openai_api_key: Option<String>,
    /// Airtable API key used by the batch endpoint to read the content table.
    pub airtable_api_key: Option<String>,
    /// Airtable base holding the content table.
    pub airtable_base_id: Option<String>,
    /// Name of the Airtable table to pull content records from.
    pub airtable_table_name: String,
    /// Embedding model identifier used for batch embedding requests.
    pub embedding_model: String,
    /// Dimensionality every stored vector must match.
    pub embedding_dimension: usize,
    /// Port the HTTP server listens on.
    pub server_port: u16,
}

/// Default embedding model; its output dimensionality matches the index.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";

/// Default vector dimensionality of the target index.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 3072;

/// Default listening port.
pub const DEFAULT_SERVER_PORT: u16 = 10000;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            pinecone_api_key: load_env_optional("PINECONE_API_KEY"),
            pinecone_index_host: load_env_optional("PINECONE_INDEX_HOST"),
            openai_api_key: load_env_optional("OPENAI_API_KEY"),
            airtable_api_key: load_env_optional("AIRTABLE_API_KEY"),
            airtable_base_id: load_env_optional("AIRTABLE_BASE_ID"),
            airtable_table_name: load_env_optional("AIRTABLE_TABLE_NAME")
                .unwrap_or_else(|| "Content".to_string()),
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimension: load_env_optional("EMBEDDING_DIMENSION")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_EMBEDDING_DIMENSION),
            server_port: load_env_optional("PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("PORT".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_SERVER_PORT),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        has_pinecone_key = config.pinecone_api_key.is_some(),
        has_openai_key = config.openai_api_key.is_some(),
        has_airtable_key = config.airtable_api_key.is_some(),
        embedding_dimension = config.embedding_dimension,
        server_port = config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
