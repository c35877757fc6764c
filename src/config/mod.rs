// Configuration management module
// Handles the optional TOML configuration file and environment overrides

pub mod settings;


use std::path::Path;

use anyhow::{Context, Result};

pub use settings::{
    CONFIG_FILE_NAME, Config, ConfigError, IndexConfig, IngestConfig, LlmConfig, OllamaConfig,
    ServerConfig,
};

/// Load the configuration from `base_dir` and apply overrides from the process environment
#[inline]
pub fn load_config<P: AsRef<Path>>(base_dir: P) -> Result<Config> {
    let mut config = Config::load(base_dir)?;
    config
        .apply_env_overrides(|key| std::env::var(key).ok())
        .context("Invalid environment override")?;
    Ok(config)
}

/// Print the effective configuration as TOML
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;
    println!("# {}", config.config_file_path().display());
    println!("{}", content);

    let key_state = if config.llm.api_key(|key| std::env::var(key).ok()).is_some() {
        "set"
    } else {
        "missing"
    };
    println!("# {}: {}", config.llm.api_key_env, key_state);
    println!(
        "# vector index: {} ({})",
        config.index_path().display(),
        if config.index_path().exists() {
            "present"
        } else {
            "absent"
        }
    );
    Ok(())
}
