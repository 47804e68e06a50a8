// # Exoscale Instance Pool Source
//
// This crate looks up the members of an Exoscale instance pool through the
// compute API v1 (`getInstancePool`).
//
// ## Behavior
//
// - One signed HTTP GET per lookup, no retry, no caching, no background task
// - HTTP timeout configured (30 seconds)
// - Zero pools returned: `Error::PoolNotFound`
// - More than one pool returned: `Error::AmbiguousPool`
// - Members without a NIC or an address are skipped with a warning
//
// ## Security
//
// - The API secret NEVER appears in logs or `Debug` output
// - Requests are signed, the secret itself is never sent
//
// ## API Reference
//
// - `GET <endpoint>?command=getInstancePool&id=<pool>&zoneid=<zone>&apikey=...&signature=...`

mod response;
pub mod signature;

use async_trait::async_trait;
use chrono::Utc;
use poolsd_core::config::ProviderConfig;
use poolsd_core::traits::InstancePoolSource;
use poolsd_core::{Error, Result};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use response::{GetInstancePoolEnvelope, api_error_text};

/// Provider name used in logs and errors
const PROVIDER_NAME: &str = "exoscale";

/// API command used for the lookup
const GET_INSTANCE_POOL: &str = "getInstancePool";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Validity window of a signed request
const SIGNATURE_EXPIRATION: Duration = Duration::from_secs(600);

/// Signature scheme with an `expires` parameter
const SIGNATURE_VERSION: &str = "3";

/// Exoscale instance pool source
///
/// Stateless and single-shot. Scheduling and the failure policy are owned
/// by the `Poller`.
pub struct ExoscaleClient {
    /// API endpoint, e.g. `https://api.exoscale.ch/v1/`
    endpoint: String,

    /// API key
    api_key: String,

    /// API secret
    /// ⚠️ NEVER log this value
    api_secret: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API secret
impl std::fmt::Debug for ExoscaleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExoscaleClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<REDACTED>")
            .finish()
    }
}

impl ExoscaleClient {
    /// Create a new Exoscale client
    ///
    /// # Errors
    ///
    /// Fails if the key or secret is empty or the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.is_empty() {
            return Err(Error::config("Exoscale API key is required"));
        }
        if api_secret.is_empty() {
            return Err(Error::config("Exoscale API secret is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            api_key,
            api_secret,
            client,
        })
    }

    /// Create a client from the provider configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config {
            ProviderConfig::Exoscale {
                endpoint,
                api_key,
                api_secret,
            } => Self::new(endpoint.clone(), api_key.clone(), api_secret.clone()),
        }
    }

    /// API endpoint in use
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Parameters of a `getInstancePool` request, without the signature
    fn request_params(&self, zone_id: &Uuid, pool_id: &Uuid) -> BTreeMap<String, String> {
        let expires = Utc::now()
            + chrono::Duration::from_std(SIGNATURE_EXPIRATION)
                .unwrap_or_else(|_| chrono::Duration::minutes(10));

        BTreeMap::from([
            ("command".to_string(), GET_INSTANCE_POOL.to_string()),
            ("id".to_string(), pool_id.to_string()),
            ("zoneid".to_string(), zone_id.to_string()),
            ("response".to_string(), "json".to_string()),
            ("apikey".to_string(), self.api_key.clone()),
            ("signatureversion".to_string(), SIGNATURE_VERSION.to_string()),
            (
                "expires".to_string(),
                expires.format("%Y-%m-%dT%H:%M:%S%z").to_string(),
            ),
        ])
    }

    /// Map a non-success HTTP status to an error
    fn status_error(status: reqwest::StatusCode, body: &str, pool_id: &Uuid) -> Error {
        let detail = api_error_text(body).unwrap_or_else(|| body.trim().to_string());

        match status.as_u16() {
            401 | 403 => Error::auth(format!(
                "Invalid API key/secret or insufficient permissions. Status: {} - {}",
                status, detail
            )),
            404 => Error::pool_not_found(format!("{} ({})", pool_id, detail)),
            429 => Error::rate_limited(format!(
                "Rate limit exceeded. Please retry later. Status: {}",
                status
            )),
            500..=599 => Error::provider_transient(
                PROVIDER_NAME,
                format!("Exoscale server error (transient): {} - {}", status, detail),
            ),
            _ => Error::provider(
                PROVIDER_NAME,
                format!("Instance pool lookup failed: {} - {}", status, detail),
            ),
        }
    }

    /// Query the API for the pool
    async fn get_instance_pool(
        &self,
        zone_id: &Uuid,
        pool_id: &Uuid,
    ) -> Result<GetInstancePoolEnvelope> {
        let query = signature::signed_query(&self.api_secret, &self.request_params(zone_id, pool_id))?;
        let url = format!("{}?{}", self.endpoint, query);

        tracing::debug!(
            "Requesting {} for pool {} in zone {}",
            GET_INSTANCE_POOL,
            pool_id,
            zone_id
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("Exoscale request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Self::status_error(status, &body, pool_id));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e.without_url())))?;

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                format!("Failed to parse {} response: {}", GET_INSTANCE_POOL, e),
            )
        })
    }
}

#[async_trait]
impl InstancePoolSource for ExoscaleClient {
    async fn instance_ips(&self, zone_id: &Uuid, pool_id: &Uuid) -> Result<Vec<String>> {
        let envelope = self.get_instance_pool(zone_id, pool_id).await?;
        let mut pools = envelope.response.instance_pools;

        let pool = match pools.len() {
            0 => return Err(Error::pool_not_found(pool_id.to_string())),
            1 => pools.remove(0),
            count => return Err(Error::ambiguous_pool(pool_id.to_string(), count)),
        };

        tracing::debug!(
            "Instance pool {} ({}) state={} members={}",
            pool.id,
            pool.name.as_deref().unwrap_or("unnamed"),
            pool.state.as_deref().unwrap_or("unknown"),
            pool.virtual_machines.len()
        );

        let ips = pool
            .virtual_machines
            .iter()
            .filter_map(|vm| match vm.default_ip() {
                Some(ip) => Some(ip.to_string()),
                None => {
                    tracing::warn!(
                        "Instance {} in pool {} has no IP address yet, skipping",
                        vm.label(),
                        pool.id
                    );
                    None
                }
            })
            .collect();

        Ok(ips)
    }

    fn source_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: Uuid = Uuid::from_u128(0x4da1b188_dcd6_4ff5_b7fd_bde984055548);
    const POOL: Uuid = Uuid::from_u128(0xe3c5d2a4_9b1c_4f3e_8a7d_2b6f0c1d9e8f);

    fn client() -> ExoscaleClient {
        ExoscaleClient::new("https://api.exoscale.ch/v1/", "EXOtestkey", "test-secret").unwrap()
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert!(ExoscaleClient::new("https://api.exoscale.ch/v1/", "", "secret").is_err());
        assert!(ExoscaleClient::new("https://api.exoscale.ch/v1/", "key", "").is_err());
    }

    #[test]
    fn test_from_config() {
        let config = ProviderConfig::exoscale("EXOtestkey", "test-secret");
        let client = ExoscaleClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), "https://api.exoscale.ch/v1/");
        assert_eq!(client.source_name(), "exoscale");
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("EXOtestkey"));
        assert!(!debug.contains("test-secret"));
    }

    #[test]
    fn test_request_params() {
        let params = client().request_params(&ZONE, &POOL);

        assert_eq!(params["command"], "getInstancePool");
        assert_eq!(params["id"], POOL.to_string());
        assert_eq!(params["zoneid"], ZONE.to_string());
        assert_eq!(params["response"], "json");
        assert_eq!(params["apikey"], "EXOtestkey");
        assert_eq!(params["signatureversion"], "3");

        let expires =
            chrono::DateTime::parse_from_str(&params["expires"], "%Y-%m-%dT%H:%M:%S%z").unwrap();
        let remaining = expires.with_timezone(&Utc) - Utc::now();
        assert!(remaining > chrono::Duration::minutes(9));
        assert!(remaining <= chrono::Duration::minutes(10));
    }

    #[test]
    fn test_status_mapping() {
        use reqwest::StatusCode;

        let auth = ExoscaleClient::status_error(StatusCode::UNAUTHORIZED, "", &POOL);
        assert!(matches!(auth, Error::Authentication(_)));

        let missing = ExoscaleClient::status_error(StatusCode::NOT_FOUND, "", &POOL);
        assert!(matches!(missing, Error::PoolNotFound(_)));

        let limited = ExoscaleClient::status_error(StatusCode::TOO_MANY_REQUESTS, "", &POOL);
        assert!(limited.is_transient());

        let unavailable = ExoscaleClient::status_error(StatusCode::SERVICE_UNAVAILABLE, "", &POOL);
        assert!(unavailable.is_transient());

        let body = r#"{"getinstancepoolresponse":{"errorcode":431,"errortext":"invalid zoneid"}}"#;
        let invalid = ExoscaleClient::status_error(StatusCode::from_u16(431).unwrap(), body, &POOL);
        assert!(!invalid.is_transient());
        assert!(invalid.to_string().contains("invalid zoneid"));
    }
}
