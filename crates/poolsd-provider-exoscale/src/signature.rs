//! Request signing for the Exoscale compute API v1
//!
//! Every request carries a `signature` parameter: the HMAC-SHA1 of the
//! lower-cased canonical query string, keyed with the API secret and
//! base64-encoded.
//!
//! The canonical query string lists the parameters sorted by key, each
//! key/value form-url-encoded, with spaces as `%20` rather than `+`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use poolsd_core::{Error, Result};
use sha1::Sha1;
use std::collections::BTreeMap;

type HmacSha1 = Hmac<Sha1>;

/// Encode one query component
fn encode(component: &str) -> String {
    url::form_urlencoded::byte_serialize(component.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Build the canonical query string
///
/// The `BTreeMap` provides the key ordering.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign a canonical query string with the API secret
pub fn sign(api_secret: &str, canonical_query: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(api_secret.as_bytes())
        .map_err(|e| Error::config(format!("Invalid Exoscale API secret: {}", e)))?;
    mac.update(canonical_query.to_lowercase().as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the full signed query string, ready to be appended to the endpoint
pub fn signed_query(api_secret: &str, params: &BTreeMap<String, String>) -> Result<String> {
    let query = canonical_query(params);
    let signature = sign(api_secret, &query)?;
    Ok(format!("{}&signature={}", query, encode(&signature)))
}
