use chrono::{DateTime, Utc};
use diesel::prelude::*;
use forum_common::PostResource;

use crate::db::schema::posts;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: i64,
    pub discussion_id: i64,
    pub number: i32,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost<'a> {
    pub id: i64,
    pub discussion_id: i64,
    pub number: i32,
    pub author_id: &'a str,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostResource {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            discussion_id: post.discussion_id,
            number: post.number,
            author_id: post.author_id,
            content: post.content,
            created_at: post.created_at,
        }
    }
}
