use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::pool::DbPool;
use crate::db::schema::users;
use crate::error::ApiError;

/// A forum member, created on first login from an identity assertion.
#[derive(Debug, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = users)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub display_name: &'a str,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Create the user on first sight, refresh profile fields afterwards.
pub async fn upsert(
    pool: &DbPool,
    user_id: &str,
    username: &str,
    display_name: &str,
) -> Result<User, ApiError> {
    let now = Utc::now();
    let mut conn = pool.get().await?;

    let query = diesel::insert_into(users::table)
        .values(NewUser {
            id: user_id,
            username,
            display_name,
            first_seen_at: now,
            last_seen_at: now,
        })
        .on_conflict(users::id)
        .do_update()
        .set((
            users::username.eq(username),
            users::display_name.eq(display_name),
            users::last_seen_at.eq(now),
        ))
        .returning(User::as_returning());

    let user: User = diesel_async::RunQueryDsl::get_result(query, &mut conn).await?;

    Ok(user)
}
