//! Opaque access and refresh tokens kept in the key-value store.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use forum_common::id::prefix;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::db::kv::KeyValueStore;
use crate::error::ApiError;

/// Access token TTL in seconds (1 hour).
pub const ACCESS_TTL_SECS: u64 = 3600;

/// Refresh token TTL in seconds (30 days).
pub const REFRESH_TTL_SECS: u64 = 30 * 24 * 3600;

/// Random bytes behind every opaque token.
const TOKEN_BYTES: usize = 32;

/// Who a token was issued to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    pub user_id: String,
}

/// The two token kinds, each with its own key namespace and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn prefix(self) -> &'static str {
        match self {
            TokenKind::Access => prefix::ACCESS_TOKEN,
            TokenKind::Refresh => prefix::REFRESH_TOKEN,
        }
    }

    pub fn ttl_secs(self) -> u64 {
        match self {
            TokenKind::Access => ACCESS_TTL_SECS,
            TokenKind::Refresh => REFRESH_TTL_SECS,
        }
    }

    fn key(self, token: &str) -> String {
        format!("forum:{}:{}", self.prefix(), token)
    }
}

/// Generate an opaque random token for `kind`.
pub fn generate(kind: TokenKind) -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut buf);
    format!("{}_{}", kind.prefix(), URL_SAFE_NO_PAD.encode(buf))
}

/// Generate and persist a fresh token for `user_id`.
pub async fn issue(
    kv: &dyn KeyValueStore,
    kind: TokenKind,
    user_id: &str,
) -> Result<String, ApiError> {
    let token = generate(kind);
    let data = TokenData {
        user_id: user_id.to_string(),
    };
    let value = serde_json::to_string(&data).map_err(|_| ApiError::internal("serialization"))?;
    kv.set_ex(&kind.key(&token), &value, kind.ttl_secs()).await?;
    Ok(token)
}

/// Resolve a token without consuming it.
pub async fn lookup(
    kv: &dyn KeyValueStore,
    kind: TokenKind,
    token: &str,
) -> Result<Option<TokenData>, ApiError> {
    kv.get(&kind.key(token))
        .await?
        .map(|v| serde_json::from_str(&v).map_err(|_| ApiError::internal("corrupt token data")))
        .transpose()
}

/// Resolve and delete a token (single-use rotation).
pub async fn consume(
    kv: &dyn KeyValueStore,
    kind: TokenKind,
    token: &str,
) -> Result<Option<TokenData>, ApiError> {
    let data = lookup(kv, kind, token).await?;
    if data.is_some() {
        kv.del(&kind.key(token)).await?;
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::kv::MemoryStore;

    #[test]
    fn tokens_carry_their_kind_prefix() {
        assert!(generate(TokenKind::Access).starts_with("fat_"));
        assert!(generate(TokenKind::Refresh).starts_with("frt_"));
        assert_ne!(generate(TokenKind::Access), generate(TokenKind::Access));
    }

    #[tokio::test]
    async fn refresh_tokens_are_single_use() {
        let kv = MemoryStore::new();
        let token = issue(&kv, TokenKind::Refresh, "usr_1").await.unwrap();

        let first = consume(&kv, TokenKind::Refresh, &token).await.unwrap();
        assert_eq!(first.unwrap().user_id, "usr_1");
        assert!(consume(&kv, TokenKind::Refresh, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn kinds_do_not_cross_namespaces() {
        let kv = MemoryStore::new();
        let token = issue(&kv, TokenKind::Refresh, "usr_1").await.unwrap();
        assert!(lookup(&kv, TokenKind::Access, &token).await.unwrap().is_none());
    }
}
