//! Configuration types for poolsd
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Default Exoscale compute API endpoint
pub const DEFAULT_EXOSCALE_ENDPOINT: &str = "https://api.exoscale.ch/v1/";

/// Default location of the static service discovery file
pub const DEFAULT_OUTPUT_PATH: &str = "/var/run/prometheus-sd-exoscale-instance-pools/config.json";

/// Main poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Instance pool to watch
    pub pool: InstancePoolConfig,

    /// Cloud provider configuration
    pub provider: ProviderConfig,

    /// Discovery file configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Seconds between two poll cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Number of consecutive transient lookup failures tolerated before the
    /// poller gives up
    ///
    /// 0 makes every failure fatal.
    #[serde(default)]
    pub max_consecutive_failures: u32,

    /// Capacity of the poller event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl PollerConfig {
    /// Create a new configuration with defaults for everything but the pool
    /// and the provider
    pub fn new(pool: InstancePoolConfig, provider: ProviderConfig) -> Self {
        Self {
            pool,
            provider,
            output: OutputConfig::default(),
            poll_interval_secs: default_poll_interval_secs(),
            max_consecutive_failures: 0,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the discovery file path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output.path = path.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.pool.validate()?;
        self.provider.validate()?;
        self.output.validate()?;

        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

/// Identifiers of the watched instance pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePoolConfig {
    /// Zone the pool lives in
    pub zone_id: Uuid,
    /// Instance pool ID
    pub pool_id: Uuid,
}

impl InstancePoolConfig {
    pub fn new(zone_id: Uuid, pool_id: Uuid) -> Self {
        Self { zone_id, pool_id }
    }

    /// Validate the pool identifiers
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.is_nil() {
            return Err(crate::Error::config("Zone ID is required"));
        }
        if self.pool_id.is_nil() {
            return Err(crate::Error::config("Instance pool ID is required"));
        }
        Ok(())
    }
}

/// Cloud provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Exoscale compute API v1
    Exoscale {
        /// API endpoint URL
        #[serde(default = "default_exoscale_endpoint")]
        endpoint: String,
        /// API key
        api_key: String,
        /// API secret
        api_secret: String,
    },
}

impl ProviderConfig {
    /// Exoscale configuration against the public endpoint
    pub fn exoscale(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        ProviderConfig::Exoscale {
            endpoint: default_exoscale_endpoint(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Exoscale {
                endpoint,
                api_key,
                api_secret,
            } => {
                if endpoint.is_empty() {
                    return Err(crate::Error::config("Exoscale endpoint cannot be empty"));
                }
                if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "Exoscale endpoint must use HTTP or HTTPS scheme. Got: {}",
                        endpoint
                    )));
                }
                if api_key.is_empty() {
                    return Err(crate::Error::config("Exoscale API key cannot be empty"));
                }
                if api_secret.is_empty() {
                    return Err(crate::Error::config("Exoscale API secret cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Exoscale { .. } => "exoscale",
        }
    }
}

// Hides the API secret
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Exoscale {
                endpoint, api_key, ..
            } => f
                .debug_struct("Exoscale")
                .field("endpoint", endpoint)
                .field("api_key", api_key)
                .field("api_secret", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Discovery file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the static service discovery file
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl OutputConfig {
    /// Validate the output configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.path.as_os_str().is_empty() {
            return Err(crate::Error::config("Discovery file path cannot be empty"));
        }
        if self.path.is_dir() {
            return Err(crate::Error::config(format!(
                "Discovery file path is a directory: {}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_exoscale_endpoint() -> String {
    DEFAULT_EXOSCALE_ENDPOINT.to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> InstancePoolConfig {
        InstancePoolConfig::new(Uuid::from_u128(1), Uuid::from_u128(2))
    }

    #[test]
    fn test_defaults() {
        let config = PollerConfig::new(pool(), ProviderConfig::exoscale("key", "secret"));

        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.max_consecutive_failures, 0);
        assert_eq!(config.output.path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        match &config.provider {
            ProviderConfig::Exoscale { endpoint, .. } => {
                assert_eq!(endpoint, DEFAULT_EXOSCALE_ENDPOINT)
            }
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nil_ids_rejected() {
        let config = PollerConfig::new(
            InstancePoolConfig::new(Uuid::nil(), Uuid::from_u128(2)),
            ProviderConfig::exoscale("key", "secret"),
        );
        assert!(config.validate().is_err());

        let config = PollerConfig::new(
            InstancePoolConfig::new(Uuid::from_u128(1), Uuid::nil()),
            ProviderConfig::exoscale("key", "secret"),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_validation() {
        assert!(ProviderConfig::exoscale("", "secret").validate().is_err());
        assert!(ProviderConfig::exoscale("key", "").validate().is_err());

        let bad_scheme = ProviderConfig::Exoscale {
            endpoint: "ftp://api.example.com".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        };
        assert!(bad_scheme.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = PollerConfig::new(pool(), ProviderConfig::exoscale("key", "secret"));
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_output_path_rejected() {
        let config = PollerConfig::new(pool(), ProviderConfig::exoscale("key", "secret"))
            .with_output_path("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let provider = ProviderConfig::exoscale("EXOkey", "super-secret-value");
        let debug = format!("{:?}", provider);
        assert!(debug.contains("EXOkey"));
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = serde_json::json!({
            "pool": {
                "zone_id": "4da1b188-dcd6-4ff5-b7fd-bde984055548",
                "pool_id": "e3c5d2a4-9b1c-4f3e-8a7d-2b6f0c1d9e8f"
            },
            "provider": {
                "type": "exoscale",
                "api_key": "key",
                "api_secret": "secret"
            }
        });

        let config: PollerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.provider.type_name(), "exoscale");
        assert!(config.validate().is_ok());
    }
}
