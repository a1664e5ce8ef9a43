//! Wire representations shared by the API server and its clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A discussion as returned by the API, carrying the caller's own markers.
///
/// Every field except `id` may be omitted when the caller requests a sparse
/// field-set, so deserialization falls back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct DiscussionResource {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub author_id: String,
    pub is_private: bool,
    pub comment_count: i32,
    pub last_post_number: i32,
    pub last_posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// The host's native last-read marker for the caller.
    pub last_read_post_number: Option<i32>,
    /// The caller's recorded reading position, `None` when nothing was recorded.
    pub reading_position: Option<i32>,
}

/// A single post inside a discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PostResource {
    #[serde(serialize_with = "i64_as_string", deserialize_with = "i64_from_string")]
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub id: i64,
    pub discussion_id: i64,
    pub number: i32,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Request body of `POST /api/v1/reading-position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SaveReadingPosition {
    pub discussion_id: i64,
    pub post_number: i32,
}

fn i64_as_string<S: Serializer>(val: &i64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&val.to_string())
}

fn i64_from_string<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
