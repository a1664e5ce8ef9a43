#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;
use ed25519_dalek::{SigningKey, VerifyingKey};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use sha2::{Digest, Sha256};

use forum_api::auth::jwks::JwksClient;
use forum_api::config::Config;
use forum_api::db::kv::{KeyValueStore, MemoryStore};
use forum_api::AppState;
use forum_common::id::{prefix, prefixed_ulid};
use forum_common::SnowflakeGenerator;

/// Ed25519 keys standing in for the identity hub.
pub struct TestSigningKeys {
    pub kid: String,
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl TestSigningKeys {
    pub fn from_seed(seed: &str) -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&Sha256::digest(seed.as_bytes()));
        let signing_key = SigningKey::from_bytes(&secret);
        let verifying_key: VerifyingKey = (&signing_key).into();
        let public = verifying_key.to_bytes();

        let kid_hash = Sha256::digest(public);
        let kid = format!(
            "hub-{}",
            kid_hash[..4].iter().map(|b| format!("{b:02x}")).collect::<String>()
        );

        Self {
            kid,
            encoding: EncodingKey::from_ed_der(&pkcs8_wrap(&secret)),
            decoding: DecodingKey::from_ed_der(&public),
        }
    }
}

/// PKCS#8 v1 envelope around a raw Ed25519 secret.
fn pkcs8_wrap(secret: &[u8; 32]) -> Vec<u8> {
    let mut der = Vec::with_capacity(48);
    der.extend_from_slice(&[0x30, 0x2e, 0x02, 0x01, 0x00]);
    der.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
    der.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    der.extend_from_slice(secret);
    der
}

#[derive(Serialize)]
struct TestClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    jti: String,
    username: &'a str,
}

/// Mint an identity assertion valid for five minutes (or already expired).
pub fn mint_assertion(
    keys: &TestSigningKeys,
    config: &Config,
    user_id: &str,
    username: &str,
    expired: bool,
) -> String {
    let now = chrono::Utc::now().timestamp();
    let (iat, exp) = if expired {
        (now - 600, now - 300)
    } else {
        (now, now + 300)
    };
    let claims = TestClaims {
        iss: &config.hub_url,
        sub: user_id,
        aud: &config.forum_id,
        iat,
        exp,
        jti: prefixed_ulid(prefix::ASSERTION),
        username,
    };

    let mut header = Header::new(Algorithm::EdDSA);
    header.kid = Some(keys.kid.clone());

    jsonwebtoken::encode(&header, &claims, &keys.encoding).expect("mint test assertion")
}

/// AppState against the `_test` database with in-memory KV and a static key.
pub async fn test_state() -> (AppState, TestSigningKeys) {
    let env_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(env_path);

    let mut config = Config::from_env();
    config.database_url = forum_api::db::test_database_url(&config.database_url);
    config.reading_position_min_interval = std::time::Duration::ZERO;

    let db = forum_api::db::pool::connect(&config.database_url).await;
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let keys = TestSigningKeys::from_seed("forum-test-seed");
    let jwks = JwksClient::with_static_key(&keys.kid, keys.decoding.clone());

    let state = AppState {
        db,
        kv,
        jwks,
        config: Arc::new(config),
        snowflake: Arc::new(SnowflakeGenerator::new(1)),
    };

    (state, keys)
}

pub async fn test_app() -> (Router, AppState, TestSigningKeys) {
    let (state, keys) = test_state().await;
    let app = forum_api::routes::router().with_state(state.clone());
    (app, state, keys)
}

pub async fn test_server() -> (TestServer, AppState, TestSigningKeys) {
    let (app, state, keys) = test_app().await;
    (TestServer::new(app).unwrap(), state, keys)
}

/// Like [`test_server`], with a custom reading-position write throttle.
pub async fn test_server_with_throttle(
    interval: std::time::Duration,
) -> (TestServer, AppState, TestSigningKeys) {
    let (mut state, keys) = test_state().await;
    let mut config = (*state.config).clone();
    config.reading_position_min_interval = interval;
    state.config = Arc::new(config);
    let app = forum_api::routes::router().with_state(state.clone());
    (TestServer::new(app).unwrap(), state, keys)
}

/// Log a fresh user in; returns `(user_id, access_token)`.
pub async fn login(
    server: &TestServer,
    keys: &TestSigningKeys,
    config: &Config,
    username: &str,
) -> (String, String) {
    let user_id = prefixed_ulid(prefix::USER);
    let assertion = mint_assertion(keys, config, &user_id, username, false);
    let resp = server
        .post("/api/v1/auth/login")
        .json(&serde_json::json!({ "assertion": assertion }))
        .await;
    resp.assert_status_ok();
    let token = resp.json::<serde_json::Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    (user_id, token)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Create a discussion and return its id.
pub async fn create_discussion(server: &TestServer, token: &str, title: &str, is_private: bool) -> i64 {
    let resp = server
        .post("/api/v1/discussions")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&serde_json::json!({
            "title": title,
            "content": "first post",
            "is_private": is_private,
        }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    resp.json::<serde_json::Value>()["id"].as_i64().unwrap()
}

/// Reply to a discussion and return the new post number.
pub async fn reply(server: &TestServer, token: &str, discussion_id: i64) -> i64 {
    let resp = server
        .post(&format!("/api/v1/discussions/{discussion_id}/posts"))
        .add_header(AUTHORIZATION, bearer(token))
        .json(&serde_json::json!({ "content": "a reply" }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    resp.json::<serde_json::Value>()["number"].as_i64().unwrap()
}

/// Create a discussion with `posts` posts in total.
pub async fn discussion_with_posts(server: &TestServer, token: &str, posts: usize) -> i64 {
    let id = create_discussion(server, token, "Reading test", false).await;
    for _ in 1..posts {
        reply(server, token, id).await;
    }
    id
}

/// Delete a test user; discussions, posts and states cascade.
pub async fn cleanup_user(db: &forum_api::db::pool::DbPool, user_id: &str) {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    let mut conn = db.get().await.expect("pool");
    diesel::delete(forum_api::db::schema::users::table.filter(forum_api::db::schema::users::id.eq(user_id)))
        .execute(&mut conn)
        .await
        .ok();
}
