//! Cached Ed25519 verification keys published by the identity hub.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::ApiError;

/// Keys older than this are re-fetched on the next lookup.
const CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct JwksClient {
    jwks_url: String,
    http: reqwest::Client,
    cache: Arc<RwLock<KeyCache>>,
}

struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
    /// Statically provisioned keys never expire and are never re-fetched.
    pinned: bool,
}

impl KeyCache {
    fn fresh_key(&self, kid: &str) -> Option<DecodingKey> {
        let fresh = self.pinned || self.fetched_at.is_some_and(|t| t.elapsed() < CACHE_TTL);
        if fresh {
            self.keys.get(kid).cloned()
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    crv: Option<String>,
    x: Option<String>,
}

impl JwksClient {
    pub fn new(hub_url: &str) -> Self {
        Self {
            jwks_url: format!("{}/.well-known/jwks.json", hub_url.trim_end_matches('/')),
            http: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(KeyCache {
                keys: HashMap::new(),
                fetched_at: None,
                pinned: false,
            })),
        }
    }

    /// A client that never hits the network and only knows `kid`.
    pub fn with_static_key(kid: &str, key: DecodingKey) -> Self {
        Self {
            jwks_url: String::new(),
            http: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(KeyCache {
                keys: HashMap::from([(kid.to_string(), key)]),
                fetched_at: None,
                pinned: true,
            })),
        }
    }

    /// Decoding key for `kid`, refreshing the key set once on a miss.
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey, ApiError> {
        if let Some(key) = self.cache.read().await.fresh_key(kid) {
            return Ok(key);
        }

        if self.cache.read().await.pinned {
            return Err(ApiError::unauthorized("Unknown signing key"));
        }

        self.refresh().await?;

        self.cache
            .read()
            .await
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unknown signing key"))
    }

    async fn refresh(&self) -> Result<(), ApiError> {
        tracing::info!(url = %self.jwks_url, "fetching identity hub JWKS");

        let set: JwkSet = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                tracing::error!(?e, "JWKS fetch failed");
                ApiError::internal("Failed to fetch identity hub keys")
            })?
            .json()
            .await
            .map_err(|e| {
                tracing::error!(?e, "JWKS parse failed");
                ApiError::internal("Failed to parse identity hub keys")
            })?;

        let keys = parse_ed25519_keys(set)?;

        let mut cache = self.cache.write().await;
        cache.keys = keys;
        cache.fetched_at = Some(Instant::now());
        Ok(())
    }
}

fn parse_ed25519_keys(set: JwkSet) -> Result<HashMap<String, DecodingKey>, ApiError> {
    let mut keys = HashMap::new();
    for jwk in set.keys {
        if jwk.kty != "OKP" || jwk.crv.as_deref() != Some("Ed25519") {
            continue;
        }
        let (Some(kid), Some(x)) = (jwk.kid, jwk.x) else {
            continue;
        };
        let public = URL_SAFE_NO_PAD.decode(&x).map_err(|e| {
            tracing::error!(?e, %kid, "bad JWKS x value");
            ApiError::internal("Invalid JWKS key encoding")
        })?;
        keys.insert(kid, DecodingKey::from_ed_der(&public));
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ed25519_okp_keys_are_kept() {
        let set: JwkSet = serde_json::from_value(serde_json::json!({
            "keys": [
                { "kid": "a", "kty": "OKP", "crv": "Ed25519", "x": URL_SAFE_NO_PAD.encode([7u8; 32]) },
                { "kid": "b", "kty": "RSA", "n": "abc", "e": "AQAB" },
                { "kty": "OKP", "crv": "Ed25519", "x": URL_SAFE_NO_PAD.encode([1u8; 32]) }
            ]
        }))
        .unwrap();
        let keys = parse_ed25519_keys(set).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains_key("a"));
    }

    #[tokio::test]
    async fn static_client_rejects_unknown_kid_without_fetching() {
        let client = JwksClient::with_static_key("k1", DecodingKey::from_ed_der(&[0u8; 32]));
        assert!(client.get_key("k1").await.is_ok());
        let err = client.get_key("k2").await.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }
}
