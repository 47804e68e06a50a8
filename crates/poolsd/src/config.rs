//! Daemon configuration from command-line flags and environment variables

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use poolsd_core::config::{DEFAULT_EXOSCALE_ENDPOINT, DEFAULT_OUTPUT_PATH};
use poolsd_core::{InstancePoolConfig, PollerConfig, ProviderConfig};
use std::path::PathBuf;
use uuid::Uuid;

/// Longest accepted poll interval (1 hour)
const MAX_POLL_INTERVAL_SECS: u64 = 3600;

/// Daemon configuration
///
/// ⚠️ SECURITY: The API secret is NEVER logged.
#[derive(Clone, Parser)]
#[command(name = "poolsd", version, args_override_self = true)]
#[command(about = "Publishes Exoscale instance pool members as a Prometheus static service discovery file")]
pub struct Config {
    /// ID of the instance pool to query
    #[arg(long, env = "POOLSD_INSTANCE_POOL_ID")]
    pub instance_pool_id: Uuid,

    /// Exoscale zone ID
    #[arg(long, env = "POOLSD_EXOSCALE_ZONE_ID")]
    pub exoscale_zone_id: Uuid,

    /// Endpoint URL of the Exoscale API
    #[arg(long, env = "POOLSD_EXOSCALE_ENDPOINT", default_value = DEFAULT_EXOSCALE_ENDPOINT)]
    pub exoscale_endpoint: String,

    /// API key for Exoscale
    #[arg(long, env = "POOLSD_EXOSCALE_API_KEY")]
    pub exoscale_api_key: String,

    /// API secret for Exoscale
    #[arg(long, env = "POOLSD_EXOSCALE_API_SECRET", hide_env_values = true)]
    pub exoscale_api_secret: String,

    /// Static service discovery file for Prometheus
    #[arg(long, env = "POOLSD_PROMETHEUS_FILE", default_value = DEFAULT_OUTPUT_PATH)]
    pub prometheus_file: PathBuf,

    /// Seconds between two refreshes
    #[arg(long, env = "POOLSD_POLL_INTERVAL_SECS", default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Transient API failures tolerated in a row before exiting
    #[arg(long, env = "POOLSD_MAX_CONSECUTIVE_FAILURES", default_value_t = 0)]
    pub max_consecutive_failures: u32,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "POOLSD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

// Custom Debug implementation that hides the API secret
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("instance_pool_id", &self.instance_pool_id)
            .field("exoscale_zone_id", &self.exoscale_zone_id)
            .field("exoscale_endpoint", &self.exoscale_endpoint)
            .field("exoscale_api_key", &self.exoscale_api_key)
            .field("exoscale_api_secret", &"<REDACTED>")
            .field("prometheus_file", &self.prometheus_file)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("max_consecutive_failures", &self.max_consecutive_failures)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Parse flags and environment
    ///
    /// Returns `Ok(None)` once `--help` or `--version` output has been printed.
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(std::env::args_os())
    }

    fn load_from<I, T>(args: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(config) => Ok(Some(config)),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.print()?;
                Ok(None)
            }
            Err(e) => Err(anyhow::anyhow!(e.render().to_string().trim_end().to_string())),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.instance_pool_id.is_nil() {
            anyhow::bail!("POOLSD_INSTANCE_POOL_ID cannot be the nil UUID");
        }

        if self.exoscale_zone_id.is_nil() {
            anyhow::bail!("POOLSD_EXOSCALE_ZONE_ID cannot be the nil UUID");
        }

        if self.exoscale_api_key.is_empty() {
            anyhow::bail!(
                "POOLSD_EXOSCALE_API_KEY is required. \
                Set it via: export POOLSD_EXOSCALE_API_KEY=your_key"
            );
        }

        if self.exoscale_api_secret.is_empty() {
            anyhow::bail!(
                "POOLSD_EXOSCALE_API_SECRET is required. \
                Set it via: export POOLSD_EXOSCALE_API_SECRET=your_secret"
            );
        }

        // Check for obvious placeholder credentials (common mistake)
        for (name, value) in [
            ("POOLSD_EXOSCALE_API_KEY", &self.exoscale_api_key),
            ("POOLSD_EXOSCALE_API_SECRET", &self.exoscale_api_secret),
        ] {
            let lower = value.to_lowercase();
            if lower.contains("your_key")
                || lower.contains("your_secret")
                || lower.contains("replace_me")
                || lower == "key"
                || lower == "secret"
            {
                anyhow::bail!(
                    "{} appears to be a placeholder. \
                    Use an actual API credential from the Exoscale portal.",
                    name
                );
            }
        }

        if !self.exoscale_endpoint.starts_with("https://")
            && !self.exoscale_endpoint.starts_with("http://")
        {
            anyhow::bail!(
                "POOLSD_EXOSCALE_ENDPOINT must use HTTP or HTTPS scheme. Got: {}",
                self.exoscale_endpoint
            );
        }

        if self.prometheus_file.as_os_str().is_empty() {
            anyhow::bail!("POOLSD_PROMETHEUS_FILE cannot be empty");
        }

        if self.poll_interval_secs == 0 {
            anyhow::bail!("POOLSD_POLL_INTERVAL_SECS must be at least 1 second");
        }

        if self.poll_interval_secs > MAX_POLL_INTERVAL_SECS {
            anyhow::bail!(
                "POOLSD_POLL_INTERVAL_SECS too high: {} (max {})",
                self.poll_interval_secs,
                MAX_POLL_INTERVAL_SECS
            );
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            anyhow::bail!(
                "POOLSD_LOG_LEVEL '{}' is not supported. \
                Supported levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    /// Maximum level for the tracing subscriber
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// Convert to the library configuration
    pub fn to_poller_config(&self) -> PollerConfig {
        let pool = InstancePoolConfig::new(self.exoscale_zone_id, self.instance_pool_id);
        let provider = ProviderConfig::Exoscale {
            endpoint: self.exoscale_endpoint.clone(),
            api_key: self.exoscale_api_key.clone(),
            api_secret: self.exoscale_api_secret.clone(),
        };

        let mut config =
            PollerConfig::new(pool, provider).with_output_path(self.prometheus_file.clone());
        config.poll_interval_secs = self.poll_interval_secs;
        config.max_consecutive_failures = self.max_consecutive_failures;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: &str = "4da1b188-dcd6-4ff5-b7fd-bde984055548";
    const POOL: &str = "e3c5d2a4-9b1c-4f3e-8a7d-2b6f0c1d9e8f";

    fn parse(extra: &[&str]) -> Config {
        let mut args = vec![
            "poolsd",
            "--exoscale-zone-id",
            ZONE,
            "--instance-pool-id",
            POOL,
            "--exoscale-api-key",
            "EXO0123456789abcdef",
            "--exoscale-api-secret",
            "s3cr3t-value",
        ];
        args.extend_from_slice(extra);
        Config::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.exoscale_endpoint, "https://api.exoscale.ch/v1/");
        assert_eq!(
            config.prometheus_file,
            PathBuf::from("/var/run/prometheus-sd-exoscale-instance-pools/config.json")
        );
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.max_consecutive_failures, 0);
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_uuid_rejected() {
        let result = Config::try_parse_from([
            "poolsd",
            "--exoscale-zone-id",
            "not-a-uuid",
            "--instance-pool-id",
            POOL,
            "--exoscale-api-key",
            "EXO0123456789abcdef",
            "--exoscale-api-secret",
            "s3cr3t-value",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_is_not_an_error() {
        let result = Config::load_from(["poolsd", "--help"]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_validation() {
        assert!(parse(&["--exoscale-api-key", ""]).validate().is_err());
        assert!(parse(&["--exoscale-api-secret", "replace_me"]).validate().is_err());
        assert!(parse(&["--exoscale-endpoint", "ftp://api.exoscale.ch"]).validate().is_err());
        assert!(parse(&["--poll-interval-secs", "0"]).validate().is_err());
        assert!(parse(&["--poll-interval-secs", "7200"]).validate().is_err());
        assert!(parse(&["--log-level", "verbose"]).validate().is_err());
        assert!(parse(&["--log-level", "debug"]).validate().is_ok());
    }

    #[test]
    fn test_nil_ids_rejected() {
        let nil = Uuid::nil().to_string();
        assert!(parse(&["--instance-pool-id", &nil]).validate().is_err());
        assert!(parse(&["--exoscale-zone-id", &nil]).validate().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", parse(&[]));
        assert!(debug.contains("EXO0123456789abcdef"));
        assert!(!debug.contains("s3cr3t-value"));
    }

    #[test]
    fn test_to_poller_config() {
        let config = parse(&[
            "--prometheus-file",
            "/tmp/sd.json",
            "--poll-interval-secs",
            "30",
            "--max-consecutive-failures",
            "3",
        ])
        .to_poller_config();

        assert_eq!(config.pool.zone_id.to_string(), ZONE);
        assert_eq!(config.pool.pool_id.to_string(), POOL);
        assert_eq!(config.output.path, PathBuf::from("/tmp/sd.json"));
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.max_consecutive_failures, 3);
        assert_eq!(config.provider.type_name(), "exoscale");
        assert!(config.validate().is_ok());
    }
}
