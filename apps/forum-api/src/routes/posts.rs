//! Post endpoints: replying to a discussion and reading around a post number.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::AsyncConnection;
use forum_common::PostResource;
use scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::middleware::{AuthUser, Viewer};
use crate::db::schema::{discussions, posts};
use crate::error::{ApiError, ApiErrorBody};
use crate::models::discussion;
use crate::models::discussion_user;
use crate::models::post::{NewPost, Post};
use crate::routes::discussions::validate_content;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/discussions/{discussion_id}/posts",
        post(create_post).get(list_posts),
    )
}

// ---------------------------------------------------------------------------
// POST /api/v1/discussions/:discussion_id/posts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub content: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/discussions/{discussion_id}/posts",
    tag = "Posts",
    security(("bearer" = [])),
    params(("discussion_id" = i64, Path, description = "Discussion ID")),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Reply created", body = PostResource),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 404, description = "Discussion not found", body = ApiErrorBody),
        (status = 422, description = "Validation error", body = ApiErrorBody),
    ),
)]
pub async fn create_post(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(discussion_id): Path<i64>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResource>), ApiError> {
    let mut errors = Vec::new();
    let content = validate_content(body.content.as_deref(), &mut errors);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let mut conn = state.db.get().await?;
    discussion::find_visible(&mut conn, discussion_id, Some(&user_id)).await?;

    let now = Utc::now();
    let post_id = state.snowflake.generate();

    let created: Post = conn
        .transaction::<_, ApiError, _>(|conn| {
            async move {
                // The row lock taken by this UPDATE serializes concurrent replies.
                let number: i32 = diesel_async::RunQueryDsl::get_result(
                    diesel::update(discussions::table.find(discussion_id))
                        .set((
                            discussions::last_post_number.eq(discussions::last_post_number + 1),
                            discussions::comment_count.eq(discussions::comment_count + 1),
                            discussions::last_posted_at.eq(now),
                        ))
                        .returning(discussions::last_post_number),
                    conn,
                )
                .await?;

                let created: Post = diesel_async::RunQueryDsl::get_result(
                    diesel::insert_into(posts::table)
                        .values(NewPost {
                            id: post_id,
                            discussion_id,
                            number,
                            author_id: &user_id,
                            content: &content,
                            created_at: now,
                        })
                        .returning(Post::as_returning()),
                    conn,
                )
                .await?;

                discussion_user::mark_read(conn, &user_id, discussion_id, number, now).await?;

                Ok(created)
            }
            .scope_boxed()
        })
        .await?;

    tracing::debug!(discussion_id, number = created.number, "reply created");

    Ok((StatusCode::CREATED, Json(created.into())))
}

// ---------------------------------------------------------------------------
// GET /api/v1/discussions/:discussion_id/posts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPostsParams {
    /// Center the page on this post number.
    pub near: Option<i32>,
    /// Page size, 1..=50 (default 20).
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListPostsResponse {
    pub data: Vec<PostResource>,
    pub last_post_number: i32,
}

#[utoipa::path(
    get,
    path = "/api/v1/discussions/{discussion_id}/posts",
    tag = "Posts",
    params(("discussion_id" = i64, Path, description = "Discussion ID"), ListPostsParams),
    responses(
        (status = 200, description = "Posts in number order", body = ListPostsResponse),
        (status = 404, description = "Discussion not found", body = ApiErrorBody),
    ),
)]
pub async fn list_posts(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(discussion_id): Path<i64>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<ListPostsResponse>, ApiError> {
    let mut conn = state.db.get().await?;
    let found = discussion::find_visible(&mut conn, discussion_id, viewer.user_id()).await?;

    let limit = params.limit.unwrap_or(20).clamp(1, 50);
    let near = params.near.unwrap_or(1).clamp(1, found.last_post_number.max(1));
    let half = limit / 2;

    let before: Vec<Post> = diesel_async::RunQueryDsl::load(
        posts::table
            .filter(posts::discussion_id.eq(discussion_id))
            .filter(posts::number.lt(near))
            .order(posts::number.desc())
            .limit(half)
            .select(Post::as_select()),
        &mut conn,
    )
    .await?;

    let after: Vec<Post> = diesel_async::RunQueryDsl::load(
        posts::table
            .filter(posts::discussion_id.eq(discussion_id))
            .filter(posts::number.ge(near))
            .order(posts::number.asc())
            .limit(limit - before.len() as i64)
            .select(Post::as_select()),
        &mut conn,
    )
    .await?;

    let data = before
        .into_iter()
        .rev()
        .chain(after)
        .map(PostResource::from)
        .collect();

    Ok(Json(ListPostsResponse {
        data,
        last_post_number: found.last_post_number,
    }))
}
