use std::path::PathBuf;

use thiserror::Error;

use aletheia_streams::BrokerGroup;

/// Tool configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON topology plan to validate.
    pub topology_path: PathBuf,
    /// Broker list used instead of the one inferred from the plan's endpoints.
    pub bootstrap_override: Option<BrokerGroup>,
    /// Envelope file to decode and describe.
    pub inspect_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let topology_path: PathBuf = var("ALETHEIA_TOPOLOGY")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("ALETHEIA_TOPOLOGY"))?
            .into();

        let bootstrap_override = match var("ALETHEIA_BOOTSTRAP_SERVERS") {
            Some(s) if !s.is_empty() => Some(s.parse::<BrokerGroup>().map_err(|_| {
                ConfigError::Invalid(
                    "ALETHEIA_BOOTSTRAP_SERVERS",
                    "must be a comma-separated list of host:port",
                )
            })?),
            _ => None,
        };

        let inspect_path = var("ALETHEIA_INSPECT")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Config {
            topology_path,
            bootstrap_override,
            inspect_path,
        })
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
