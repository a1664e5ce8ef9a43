//! Reading-position store: where each user last settled inside a discussion.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use forum_common::{DiscussionResource, SaveReadingPosition};
use serde_json::Value;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::{discussion, discussion_user};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/reading-position", post(save_reading_position))
}

/// Read a positive integer field, accepting numbers and numeric strings.
///
/// `Err(())` means the field is present but unusable; `Ok(None)` that it is
/// absent.
fn positive_int(value: Option<&Value>) -> Result<Option<i64>, ()> {
    let n = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_i64().ok_or(())?,
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| ())?,
        Some(_) => return Err(()),
    };
    if n > 0 {
        Ok(Some(n))
    } else {
        Err(())
    }
}

/// Look a field up at the top level first, then under `data.attributes`.
fn field<'a>(body: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let attributes = body.pointer("/data/attributes");
    names
        .iter()
        .find_map(|name| body.get(*name).filter(|v| !v.is_null()))
        .or_else(|| {
            names
                .iter()
                .find_map(|name| attributes.and_then(|a| a.get(*name)).filter(|v| !v.is_null()))
        })
}

/// Validate a save request body into `(discussion_id, post_number)`.
pub fn parse_save_request(body: &Value) -> Result<(i64, i64), ApiError> {
    let mut errors = Vec::new();

    let discussion_id = positive_int(field(body, &["discussionId", "discussion_id"]));
    let post_number = positive_int(field(body, &["postNumber", "post_number"]));

    if !matches!(discussion_id, Ok(Some(_))) {
        errors.push(FieldError::new("discussionId", "Invalid discussion ID."));
    }
    if !matches!(post_number, Ok(Some(_))) {
        errors.push(FieldError::new("postNumber", "Invalid post number."));
    }

    match (discussion_id, post_number) {
        (Ok(Some(d)), Ok(Some(p))) => Ok((d, p)),
        _ => Err(ApiError::validation(errors)),
    }
}

/// Pull an out-of-range post number back to the last post of the discussion.
pub fn clamp_post_number(submitted: i64, last_post_number: i32) -> i32 {
    let capped = if last_post_number > 0 {
        submitted.min(i64::from(last_post_number))
    } else {
        submitted
    };
    i32::try_from(capped).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// POST /api/v1/reading-position
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/reading-position",
    tag = "Reading Position",
    security(("bearer" = [])),
    request_body = SaveReadingPosition,
    responses(
        (status = 200, description = "Position stored; the discussion with the confirmed position", body = DiscussionResource),
        (status = 400, description = "Body is not a JSON document", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 404, description = "Discussion not found", body = ApiErrorBody),
        (status = 422, description = "Invalid discussionId or postNumber", body = ApiErrorBody),
    ),
)]
pub async fn save_reading_position(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DiscussionResource>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let (discussion_id, submitted) = parse_save_request(&body)?;

    let mut conn = state.db.get().await?;
    let found = discussion::find_visible(&mut conn, discussion_id, Some(&user_id)).await?;

    let post_number = clamp_post_number(submitted, found.last_post_number);
    let now = Utc::now();

    let current = discussion_user::state_for(&mut conn, &user_id, discussion_id).await?;
    let min_interval = state.config.reading_position_min_interval;
    let throttled = !min_interval.is_zero()
        && current
            .as_ref()
            .and_then(|s| s.reading_at)
            .and_then(|at| (now - at).to_std().ok())
            .is_some_and(|elapsed| elapsed < min_interval);

    let saved = if throttled {
        tracing::debug!(discussion_id, post_number, "reading position write throttled");
        current
    } else {
        discussion_user::save_reading_position(&mut conn, &user_id, discussion_id, post_number, now)
            .await?;
        tracing::debug!(
            discussion_id,
            post_number,
            clamped = i64::from(post_number) != submitted,
            "reading position saved"
        );
        discussion_user::state_for(&mut conn, &user_id, discussion_id).await?
    };

    Ok(Json(found.into_resource(saved.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn accepts_camel_snake_and_nested_bodies() {
        assert_eq!(
            parse_save_request(&json!({ "discussionId": 4, "postNumber": 9 })).unwrap(),
            (4, 9)
        );
        assert_eq!(
            parse_save_request(&json!({ "discussion_id": "4", "post_number": " 9 " })).unwrap(),
            (4, 9)
        );
        assert_eq!(
            parse_save_request(&json!({
                "data": { "attributes": { "discussionId": 4, "postNumber": 9 } }
            }))
            .unwrap(),
            (4, 9)
        );
    }

    #[test]
    fn rejects_non_positive_and_non_numeric_values() {
        for body in [
            json!({ "discussionId": 1, "postNumber": 0 }),
            json!({ "discussionId": 1, "postNumber": -5 }),
            json!({ "discussionId": "abc", "postNumber": 3 }),
            json!({ "discussionId": 1.5, "postNumber": 3 }),
            json!({ "discussionId": 1, "postNumber": [3] }),
            json!({ "postNumber": 3 }),
            json!({}),
        ] {
            let err = parse_save_request(&body).unwrap_err();
            assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
        }
    }

    #[test]
    fn reports_every_bad_field() {
        let err = parse_save_request(&json!({ "discussionId": 0, "postNumber": "x" })).unwrap_err();
        let fields: Vec<String> = err.details.unwrap().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["discussionId", "postNumber"]);
    }

    #[test]
    fn clamps_to_last_post_number() {
        assert_eq!(clamp_post_number(7, 10), 7);
        assert_eq!(clamp_post_number(10, 10), 10);
        assert_eq!(clamp_post_number(99, 10), 10);
        assert_eq!(clamp_post_number(clamp_post_number(99, 10).into(), 10), 10);
        assert_eq!(clamp_post_number(5, 0), 5);
        assert_eq!(clamp_post_number(i64::MAX, 0), i32::MAX);
    }
}
