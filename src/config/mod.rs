// Configuration management module
// Handles TOML configuration for the embedding endpoint, the language model
// endpoint, and search tuning

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, LlmConfig, OllamaConfig, SearchConfig};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("recall"))
        .ok_or(ConfigError::DirectoryError)
}
