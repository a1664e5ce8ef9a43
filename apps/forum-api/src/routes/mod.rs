pub mod auth;
pub mod discussions;
pub mod health;
pub mod posts;
pub mod reading_position;

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().merge(health::router()).nest(
        "/api/v1",
        health::api_router()
            .merge(auth::router())
            .merge(discussions::router())
            .merge(posts::router())
            .merge(reading_position::router()),
    )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::ping,
        auth::login,
        auth::refresh,
        discussions::create_discussion,
        discussions::list_discussions,
        discussions::get_discussion,
        posts::create_post,
        posts::list_posts,
        reading_position::save_reading_position,
    ),
    components(
        schemas(
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            forum_common::DiscussionResource,
            forum_common::PostResource,
            forum_common::SaveReadingPosition,
            health::HealthResponse,
            health::PingResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::TokenPair,
            auth::UserInfo,
            auth::RefreshRequest,
            discussions::CreateDiscussionRequest,
            posts::CreatePostRequest,
            posts::ListPostsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and reachability"),
        (name = "Auth", description = "Authentication"),
        (name = "Discussions", description = "Discussions"),
        (name = "Posts", description = "Replies inside a discussion"),
        (name = "Reading Position", description = "Per-user reading position"),
    )
)]
pub struct ApiDoc;
