//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::OfferConfig;
use crate::config::validation::ValidationError;
use crate::error::OfferError;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
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

impl From<ConfigError> for OfferError {
    fn from(e: ConfigError) -> Self {
        OfferError::Config(e.to_string())
    }
}

/// Parse a TOML file without validating it.
///
/// Command line overrides are applied on top before
/// [`validate_config`](crate::config::validation::validate_config) runs.
pub fn read_config(path: &Path) -> Result<OfferConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}
