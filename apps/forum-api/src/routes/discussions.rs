//! Discussion endpoints.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::AsyncConnection;
use forum_common::route::slugify;
use forum_common::DiscussionResource;
use scoped_futures::ScopedFutureExt;
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::auth::middleware::{AuthUser, Viewer};
use crate::db::schema::{discussions, posts};
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::discussion::{self, Discussion, NewDiscussion};
use crate::models::discussion_user::{self, UserState};
use crate::models::post::NewPost;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/discussions", get(list_discussions).post(create_discussion))
        .route("/discussions/{discussion_id}", get(get_discussion))
}

pub(crate) const MAX_TITLE_LEN: usize = 200;
pub(crate) const MAX_CONTENT_LEN: usize = 65_535;

/// Validate post content, returning it trimmed.
pub(crate) fn validate_content(content: Option<&str>, errors: &mut Vec<FieldError>) -> String {
    match content.map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("content", "Content is required"));
            String::new()
        }
        Some(c) if c.len() > MAX_CONTENT_LEN => {
            errors.push(FieldError::new(
                "content",
                "Content must be 65535 bytes or fewer",
            ));
            String::new()
        }
        Some(c) => c.to_string(),
    }
}

// ---------------------------------------------------------------------------
// POST /api/v1/discussions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiscussionRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub is_private: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/discussions",
    tag = "Discussions",
    security(("bearer" = [])),
    request_body = CreateDiscussionRequest,
    responses(
        (status = 201, description = "Discussion created with its first post", body = DiscussionResource),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 422, description = "Validation error", body = ApiErrorBody),
    ),
)]
pub async fn create_discussion(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateDiscussionRequest>,
) -> Result<(StatusCode, Json<DiscussionResource>), ApiError> {
    let mut errors = Vec::new();
    let title = match body.title.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("title", "Title is required"));
            ""
        }
        Some(t) if t.chars().count() > MAX_TITLE_LEN => {
            errors.push(FieldError::new("title", "Title must be 200 characters or fewer"));
            ""
        }
        Some(t) => t,
    };
    let content = validate_content(body.content.as_deref(), &mut errors);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let slug = slugify(title);
    let now = Utc::now();
    let post_id = state.snowflake.generate();
    let mut conn = state.db.get().await?;

    let created: Discussion = conn
        .transaction::<_, ApiError, _>(|conn| {
            async move {
                let created: Discussion = diesel_async::RunQueryDsl::get_result(
                    diesel::insert_into(discussions::table)
                        .values(NewDiscussion {
                            title,
                            slug: &slug,
                            author_id: &user_id,
                            is_private: body.is_private,
                            comment_count: 1,
                            last_post_number: 1,
                            last_posted_at: Some(now),
                            created_at: now,
                        })
                        .returning(Discussion::as_returning()),
                    conn,
                )
                .await?;

                diesel_async::RunQueryDsl::execute(
                    diesel::insert_into(posts::table).values(NewPost {
                        id: post_id,
                        discussion_id: created.id,
                        number: 1,
                        author_id: &user_id,
                        content: &content,
                        created_at: now,
                    }),
                    conn,
                )
                .await?;

                discussion_user::mark_read(conn, &user_id, created.id, 1, now).await?;

                Ok(created)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(discussion_id = created.id, author_id = %created.author_id, "discussion created");

    let user_state = discussion_user::state_for(&mut conn, &created.author_id, created.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(created.into_resource(user_state.as_ref())),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/v1/discussions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDiscussionsParams {
    /// Page size, 1..=50 (default 20).
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/discussions",
    tag = "Discussions",
    params(ListDiscussionsParams),
    responses(
        (status = 200, description = "Visible discussions, most recent activity first", body = Vec<DiscussionResource>),
        (status = 401, description = "Invalid token", body = ApiErrorBody),
    ),
)]
pub async fn list_discussions(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(params): Query<ListDiscussionsParams>,
) -> Result<Json<Vec<DiscussionResource>>, ApiError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 50);
    let mut conn = state.db.get().await?;

    let mut query = discussions::table
        .select(Discussion::as_select())
        .order((discussions::last_posted_at.desc(), discussions::id.desc()))
        .limit(limit)
        .into_boxed();
    query = match viewer.user_id() {
        Some(actor) => query.filter(
            discussions::is_private
                .eq(false)
                .or(discussions::author_id.eq(actor.to_string())),
        ),
        None => query.filter(discussions::is_private.eq(false)),
    };

    let found: Vec<Discussion> = diesel_async::RunQueryDsl::load(query, &mut conn).await?;

    let mut states: HashMap<i64, UserState> = match viewer.user_id() {
        Some(actor) => {
            let ids: Vec<i64> = found.iter().map(|d| d.id).collect();
            discussion_user::states_for(&mut conn, actor, &ids)
                .await?
                .into_iter()
                .map(|s| (s.discussion_id, s))
                .collect()
        }
        None => HashMap::new(),
    };

    Ok(Json(
        found
            .into_iter()
            .map(|d| {
                let s = states.remove(&d.id);
                d.into_resource(s.as_ref())
            })
            .collect(),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/v1/discussions/:discussion_id
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetDiscussionParams {
    /// Comma-separated sparse field-set, e.g. `reading_position,last_read_post_number`.
    /// `id` is always included.
    pub fields: Option<String>,
}

/// Keep only the requested attributes of a serialized resource.
pub fn sparse_fields(resource: &DiscussionResource, fields: Option<&str>) -> Value {
    let value = serde_json::to_value(resource).unwrap_or(Value::Null);
    let Some(fields) = fields.map(str::trim).filter(|f| !f.is_empty()) else {
        return value;
    };
    let wanted: Vec<&str> = fields.split(',').map(str::trim).collect();
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| k == "id" || wanted.contains(&k.as_str()))
                .collect(),
        ),
        other => other,
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/discussions/{discussion_id}",
    tag = "Discussions",
    params(
        ("discussion_id" = i64, Path, description = "Discussion ID"),
        GetDiscussionParams,
    ),
    responses(
        (status = 200, description = "Discussion with the caller's reading position", body = DiscussionResource),
        (status = 401, description = "Invalid token", body = ApiErrorBody),
        (status = 404, description = "Discussion not found", body = ApiErrorBody),
    ),
)]
pub async fn get_discussion(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(discussion_id): Path<i64>,
    Query(params): Query<GetDiscussionParams>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = state.db.get().await?;
    let found = discussion::find_visible(&mut conn, discussion_id, viewer.user_id()).await?;

    let user_state = match viewer.user_id() {
        Some(actor) => discussion_user::state_for(&mut conn, actor, discussion_id).await?,
        None => None,
    };

    let resource = found.into_resource(user_state.as_ref());
    Ok(Json(sparse_fields(&resource, params.fields.as_deref())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> DiscussionResource {
        DiscussionResource {
            id: 9,
            title: "Hello".into(),
            last_post_number: 4,
            reading_position: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn sparse_fields_keep_id_and_requested() {
        let v = sparse_fields(&resource(), Some("reading_position, last_read_post_number"));
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["id"], 9);
        assert_eq!(obj["reading_position"], 3);
        assert!(obj["last_read_post_number"].is_null());
    }

    #[test]
    fn empty_field_set_returns_everything() {
        let v = sparse_fields(&resource(), Some("  "));
        assert_eq!(v["title"], "Hello");
        assert_eq!(v["last_post_number"], 4);
    }

    #[test]
    fn content_validation() {
        let mut errors = Vec::new();
        assert_eq!(validate_content(Some("  hi "), &mut errors), "hi");
        assert!(errors.is_empty());
        validate_content(Some("   "), &mut errors);
        validate_content(None, &mut errors);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.field == "content"));
    }
}
