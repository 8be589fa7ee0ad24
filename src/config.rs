//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the bot's constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from config files and environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Google Custom Search API key
    pub google_api_key: String,
    /// Programmable Search Engine id (`cx`)
    pub google_search_engine_id: String,

    /// Custom Search JSON API endpoint
    #[serde(default = "default_search_api_url")]
    pub search_api_url: String,

    /// Timeout applied to every outbound HTTP request
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Upper bound for a single downloaded image
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// How many image downloads of one command may run at once
    #[serde(default = "default_image_fetch_concurrency")]
    pub image_fetch_concurrency: usize,
}

fn default_search_api_url() -> String {
    SEARCH_API_URL.to_string()
}

const fn default_http_timeout_secs() -> u64 {
    HTTP_TIMEOUT_SECS
}

const fn default_max_image_bytes() -> usize {
    MAX_IMAGE_BYTES
}

const fn default_image_fetch_concurrency() -> usize {
    1
}

/// Build the layered configuration source shared by all settings loaders.
///
/// # Errors
///
/// Returns a `ConfigError` if any present source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg.. `APP_HTTP_TIMEOUT_SECS=10 ./target/app`
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        // Environment::default() maps UPPER_SNAKE_CASE to snake_case
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use oxide_search_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key is missing or blank.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = build_config()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("telegram_token", &self.telegram_token),
            ("google_api_key", &self.google_api_key),
            ("google_search_engine_id", &self.google_search_engine_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{key} must not be empty")));
            }
        }
        if self.image_fetch_concurrency == 0 {
            return Err(ConfigError::Message(
                "image_fetch_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default Google Custom Search JSON API endpoint
pub const SEARCH_API_URL: &str = "https://customsearch.googleapis.com/customsearch/v1";

/// Placeholder for metadata the search API did not return
pub const NOT_AVAILABLE: &str = "Not available";

/// Largest `num` the Custom Search API accepts
pub const MAX_IMAGE_COUNT: u32 = 10;

/// Default outbound HTTP timeout in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default image size cap (Telegram rejects photos above 10 MB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum message length for Telegram with safety margin
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

// Telegram API retry configuration
/// Maximum retry attempts for Telegram API calls
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Initial backoff in milliseconds
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Backoff ceiling in milliseconds
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
