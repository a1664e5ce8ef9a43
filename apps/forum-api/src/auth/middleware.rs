//! Bearer token extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::tokens::{self, TokenKind};
use crate::AppState;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Caller of a read endpoint: anonymous when no `Authorization` header is
/// sent. A header carrying a bad token is still rejected.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user_id: Option<String>,
}

impl Viewer {
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// Rejection returned when the bearer token is missing or invalid.
pub struct AuthError {
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": "UNAUTHORIZED",
                "message": self.message
            }
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

async fn resolve(header: &str, state: &AppState) -> Result<String, AuthError> {
    let token = header.strip_prefix("Bearer ").ok_or(AuthError {
        message: "Invalid Authorization header format",
    })?;

    let data = tokens::lookup(state.kv.as_ref(), TokenKind::Access, token)
        .await
        .map_err(|_| AuthError {
            message: "Token lookup failed",
        })?
        .ok_or(AuthError {
            message: "Invalid or expired token",
        })?;

    Ok(data.user_id)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError {
                message: "Missing Authorization header",
            })?;

        Ok(AuthUser {
            user_id: resolve(header, state).await?,
        })
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Viewer { user_id: None });
        };
        let header = header.to_str().map_err(|_| AuthError {
            message: "Invalid Authorization header format",
        })?;

        Ok(Viewer {
            user_id: Some(resolve(header, state).await?),
        })
    }
}
