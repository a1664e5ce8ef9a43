//! Auth routes: identity-assertion login and token refresh.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::assertion::{self, Expected};
use crate::auth::tokens::{self, TokenKind};
use crate::error::{ApiError, ApiErrorBody};
use crate::models::user;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/login
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Identity assertion JWT issued by the identity hub.
    pub assertion: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub display_name: String,
}

async fn issue_pair(state: &AppState, user_id: &str) -> Result<TokenPair, ApiError> {
    let kv = state.kv.as_ref();
    Ok(TokenPair {
        access_token: tokens::issue(kv, TokenKind::Access, user_id).await?,
        token_type: "Bearer".to_string(),
        expires_in: TokenKind::Access.ttl_secs(),
        refresh_token: tokens::issue(kv, TokenKind::Refresh, user_id).await?,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid identity assertion", body = ApiErrorBody),
    ),
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let claims = assertion::verify(
        &body.assertion,
        &state.jwks,
        state.kv.as_ref(),
        Expected {
            issuer: &state.config.hub_url,
            audience: &state.config.forum_id,
        },
    )
    .await?;

    let user = user::upsert(&state.db, &claims.sub, &claims.username, claims.display_name()).await?;

    let tokens = issue_pair(&state, &user.id).await?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse {
        tokens,
        user: UserInfo {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenPair),
        (status = 401, description = "Invalid refresh token", body = ApiErrorBody),
    ),
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let data = tokens::consume(state.kv.as_ref(), TokenKind::Refresh, &body.refresh_token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired refresh token"))?;

    Ok(Json(issue_pair(&state, &data.user_id).await?))
}
