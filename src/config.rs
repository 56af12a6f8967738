use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Default model requested from the summarization backend.
pub const DEFAULT_SUMMARIZATION_MODEL: &str = "llama3";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Rusty Roster server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Backend used to write student summaries.
    pub summarization_provider: SummarizationProvider,
    /// Model identifier passed to the summarization backend.
    pub summarization_model: String,
    /// Optional base URL of the Ollama runtime.
    pub ollama_url: Option<String>,
    /// Optional upper bound for a single summarization request, in seconds.
    pub summarization_timeout_secs: Option<u64>,
}

/// Supported text-generation backends for student summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummarizationProvider {
    /// Summaries are disabled; every request yields the fallback text.
    None,
    /// Local Ollama runtime.
    Ollama,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server_port: parse_optional("SERVER_PORT")?,
            summarization_provider: load_env_optional("SUMMARIZATION_PROVIDER")
                .map(|value| {
                    value.parse().map_err(|()| {
                        ConfigError::InvalidValue("SUMMARIZATION_PROVIDER".to_string())
                    })
                })
                .transpose()?
                .unwrap_or(SummarizationProvider::Ollama),
            summarization_model: load_env_optional("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_MODEL.to_string()),
            ollama_url: load_env_optional("OLLAMA_URL"),
            summarization_timeout_secs: parse_optional("SUMMARIZATION_TIMEOUT_SECS")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: None,
            summarization_provider: SummarizationProvider::Ollama,
            summarization_model: DEFAULT_SUMMARIZATION_MODEL.to_string(),
            ollama_url: None,
            summarization_timeout_secs: None,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| parse_value(key, &value))
        .transpose()
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

impl std::str::FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" | "disabled" => Ok(Self::None),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<(), ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        server_port = ?config.server_port,
        provider = ?config.summarization_provider,
        model = %config.summarization_model,
        ollama_url = ?config.ollama_url,
        timeout_secs = ?config.summarization_timeout_secs,
        "Loaded configuration"
    );
    // A second initialization keeps the first configuration.
    let _ = CONFIG.set(config);
    Ok(())
}
