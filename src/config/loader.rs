//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::BookieConfig;
use crate::config::validation::{validate_config, ValidationIssue};

/// Environment variables that override file settings.
pub const ENV_CONTRACT_ID: &str = "BOOKIE_CONTRACT_ID";
pub const ENV_FORCE_REAL: &str = "BOOKIE_FORCE_REAL_TRANSACTIONS";
pub const ENV_BUILD: &str = "BOOKIE_BUILD";
pub const ENV_RPC_URL: &str = "BOOKIE_RPC_URL";
pub const ENV_HORIZON_URL: &str = "BOOKIE_HORIZON_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationIssue>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<BookieConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: BookieConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    finish(config)
}

/// Load from `path` when given, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<BookieConfig, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => finish(BookieConfig::default()),
    }
}

fn finish(mut config: BookieConfig) -> Result<BookieConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply overrides from `lookup`. Only the literal `"true"` enables real transactions.
pub fn apply_env_overrides<F>(config: &mut BookieConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(id) = lookup(ENV_CONTRACT_ID) {
        config.contract.id = id;
    }
    if let Some(flag) = lookup(ENV_FORCE_REAL) {
        config.contract.force_real_transactions = flag == "true";
    }
    if let Some(build) = lookup(ENV_BUILD) {
        config.contract.build = build.parse().map_err(|message| ConfigError::Env {
            var: ENV_BUILD,
            message,
        })?;
    }
    if let Some(url) = lookup(ENV_RPC_URL) {
        config.network.rpc_url = url;
    }
    if let Some(url) = lookup(ENV_HORIZON_URL) {
        config.network.horizon_url = url;
    }
    Ok(())
}
