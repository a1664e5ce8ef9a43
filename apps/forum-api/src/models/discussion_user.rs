//! Per-user, per-discussion state: the native last-read marker and the
//! recorded reading position.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::AsyncPgConnection;

use crate::db::schema::discussion_user;
use crate::error::ApiError;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = discussion_user)]
pub struct UserState {
    pub user_id: String,
    pub discussion_id: i64,
    pub last_read_post_number: Option<i32>,
    pub last_read_at: Option<DateTime<Utc>>,
    pub reading_post_number: Option<i32>,
    pub reading_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = discussion_user)]
pub struct NewReadingPosition<'a> {
    pub user_id: &'a str,
    pub discussion_id: i64,
    pub reading_post_number: Option<i32>,
    pub reading_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = discussion_user)]
pub struct NewLastRead<'a> {
    pub user_id: &'a str,
    pub discussion_id: i64,
    pub last_read_post_number: Option<i32>,
    pub last_read_at: Option<DateTime<Utc>>,
}

/// State row of `user_id` in one discussion, if any.
pub async fn state_for(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    discussion_id: i64,
) -> Result<Option<UserState>, ApiError> {
    let state = diesel_async::RunQueryDsl::get_result(
        discussion_user::table
            .find((user_id, discussion_id))
            .select(UserState::as_select()),
        conn,
    )
    .await
    .optional()?;
    Ok(state)
}

/// State rows of `user_id` across several discussions.
pub async fn states_for(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    discussion_ids: &[i64],
) -> Result<Vec<UserState>, ApiError> {
    let states = diesel_async::RunQueryDsl::load(
        discussion_user::table
            .filter(discussion_user::user_id.eq(user_id))
            .filter(discussion_user::discussion_id.eq_any(discussion_ids))
            .select(UserState::as_select()),
        conn,
    )
    .await?;
    Ok(states)
}

/// Upsert the recorded reading position.
pub async fn save_reading_position(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    discussion_id: i64,
    post_number: i32,
    at: DateTime<Utc>,
) -> Result<(), ApiError> {
    diesel_async::RunQueryDsl::execute(
        diesel::insert_into(discussion_user::table)
            .values(NewReadingPosition {
                user_id,
                discussion_id,
                reading_post_number: Some(post_number),
                reading_at: Some(at),
            })
            .on_conflict((discussion_user::user_id, discussion_user::discussion_id))
            .do_update()
            .set((
                discussion_user::reading_post_number.eq(post_number),
                discussion_user::reading_at.eq(at),
            )),
        conn,
    )
    .await?;
    Ok(())
}

/// Advance the native last-read marker; it never moves backwards.
pub async fn mark_read(
    conn: &mut AsyncPgConnection,
    user_id: &str,
    discussion_id: i64,
    post_number: i32,
    at: DateTime<Utc>,
) -> Result<(), ApiError> {
    diesel_async::RunQueryDsl::execute(
        diesel::insert_into(discussion_user::table)
            .values(NewLastRead {
                user_id,
                discussion_id,
                last_read_post_number: Some(post_number),
                last_read_at: Some(at),
            })
            .on_conflict((discussion_user::user_id, discussion_user::discussion_id))
            .do_update()
            .set((
                discussion_user::last_read_post_number.eq(diesel::dsl::sql::<
                    diesel::sql_types::Nullable<diesel::sql_types::Integer>,
                >(
                    "GREATEST(COALESCE(discussion_user.last_read_post_number, 0), EXCLUDED.last_read_post_number)",
                )),
                discussion_user::last_read_at.eq(at),
            )),
        conn,
    )
    .await?;
    Ok(())
}
