use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::AsyncPgConnection;
use forum_common::DiscussionResource;

use crate::db::schema::discussions;
use crate::error::ApiError;
use crate::models::discussion_user::UserState;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = discussions)]
pub struct Discussion {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub author_id: String,
    pub is_private: bool,
    pub comment_count: i32,
    pub last_post_number: i32,
    pub last_posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = discussions)]
pub struct NewDiscussion<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub author_id: &'a str,
    pub is_private: bool,
    pub comment_count: i32,
    pub last_post_number: i32,
    pub last_posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Discussion {
    /// Private discussions are only visible to their author.
    pub fn is_visible_to(&self, actor: Option<&str>) -> bool {
        !self.is_private || actor == Some(self.author_id.as_str())
    }

    /// Serialize for `actor`, embedding their per-discussion markers.
    pub fn into_resource(self, state: Option<&UserState>) -> DiscussionResource {
        DiscussionResource {
            id: self.id,
            title: self.title,
            slug: self.slug,
            author_id: self.author_id,
            is_private: self.is_private,
            comment_count: self.comment_count,
            last_post_number: self.last_post_number,
            last_posted_at: self.last_posted_at,
            created_at: self.created_at,
            last_read_post_number: state.and_then(|s| s.last_read_post_number),
            reading_position: state.and_then(|s| s.reading_post_number),
        }
    }
}

/// Load a discussion the actor may see.
///
/// Missing and invisible discussions both report `NOT_FOUND` so private
/// discussion ids do not leak.
pub async fn find_visible(
    conn: &mut AsyncPgConnection,
    discussion_id: i64,
    actor: Option<&str>,
) -> Result<Discussion, ApiError> {
    let discussion: Option<Discussion> = diesel_async::RunQueryDsl::get_result(
        discussions::table
            .find(discussion_id)
            .select(Discussion::as_select()),
        conn,
    )
    .await
    .optional()?;

    discussion
        .filter(|d| d.is_visible_to(actor))
        .ok_or_else(|| ApiError::not_found("Discussion not found"))
}
