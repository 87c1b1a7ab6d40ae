use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Chat bot API token
    pub bot_token: String,

    /// Catalogue store API key
    pub catalogue_api_key: String,

    /// Catalogue base identifier
    pub catalogue_base_id: String,

    /// Catalogue API endpoint (override for testing)
    #[serde(default = "default_catalogue_url")]
    pub catalogue_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Comma-separated chat ids allowed to talk to the bot
    #[serde(default)]
    pub allowed_chat_ids: String,

    /// Default approval threshold for large movements
    #[serde(default = "default_approval_threshold")]
    pub default_approval_threshold: f64,

    /// TTL for idempotency keys in seconds (default: 1 hour)
    #[serde(default = "default_idempotency_ttl")]
    pub idempotency_ttl_seconds: u64,

    /// TTL for the catalogue snapshot cache in seconds (default: 5 minutes)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Timeout for catalogue requests in seconds
    #[serde(default = "default_request_timeout")]
    pub catalogue_timeout_seconds: u64,
}

fn default_catalogue_url() -> String {
    "https://api.airtable.com/v0".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_approval_threshold() -> f64 {
    100.0
}

fn default_idempotency_ttl() -> u64 {
    3600 // 1 hour
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_request_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            .set_default("bot_token", "")?
            .set_default("catalogue_api_key", "")?
            .set_default("catalogue_base_id", "")?
            .add_source(config::Environment::default());

        let config = builder.build()?;
        config.try_deserialize::<Config>()
    }

    /// Parse the allowed chat id list
    pub fn allowed_chats(&self) -> Vec<i64> {
        self.allowed_chat_ids
            .split(',')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }
}
