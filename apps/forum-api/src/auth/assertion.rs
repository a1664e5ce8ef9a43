//! Identity assertions: short-lived EdDSA JWTs minted by the identity hub
//! and exchanged for forum tokens at login.

use jsonwebtoken::{Algorithm, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::jwks::JwksClient;
use crate::db::kv::KeyValueStore;
use crate::error::ApiError;

/// Claims carried by an identity assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl AssertionClaims {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// How long a seen `jti` is remembered; matches the assertion lifetime.
const JTI_TTL_SECS: u64 = 300;

/// Who is expected to have issued an assertion, and for whom.
pub struct Expected<'a> {
    pub issuer: &'a str,
    pub audience: &'a str,
}

/// Verify signature, expiry, audience, issuer and single use of an
/// assertion, returning its claims.
pub async fn verify(
    token: &str,
    jwks: &JwksClient,
    kv: &dyn KeyValueStore,
    expected: Expected<'_>,
) -> Result<AssertionClaims, ApiError> {
    let header = jsonwebtoken::decode_header(token).map_err(|e| {
        tracing::debug!(?e, "assertion header decode failed");
        ApiError::unauthorized("Invalid identity assertion")
    })?;

    let kid = header
        .kid
        .ok_or_else(|| ApiError::unauthorized("Identity assertion missing kid"))?;

    let key = jwks.get_key(&kid).await?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_audience(&[expected.audience]);
    validation.set_issuer(&[expected.issuer]);

    let claims = jsonwebtoken::decode::<AssertionClaims>(token, &key, &validation)
        .map_err(|e| {
            tracing::debug!(?e, "assertion validation failed");
            ApiError::unauthorized("Invalid or expired identity assertion")
        })?
        .claims;

    let jti_key = format!("forum:assertion_jti:{}", claims.jti);
    if kv.get(&jti_key).await?.is_some() {
        return Err(ApiError::unauthorized("Identity assertion already used"));
    }
    kv.set_ex(&jti_key, "1", JTI_TTL_SECS).await?;

    Ok(claims)
}
