//! HTTP access to the two endpoints the reading client needs.

use std::sync::Arc;

use async_trait::async_trait;
use forum_common::{DiscussionResource, SaveReadingPosition};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::session::Session;

/// Sparse field-set requested when warming the local cache.
pub const POSITION_FIELDS: &str = "reading_position,last_read_post_number";

#[async_trait]
pub trait ReadingPositionApi: Send + Sync {
    /// Persist `post_number` as the caller's reading position and return the
    /// discussion as the server now sees it (the stored value may be clamped).
    async fn save_position(&self, discussion_id: i64, post_number: u32) -> Result<DiscussionResource>;

    /// Fetch only the caller's markers for a discussion.
    async fn fetch_position(&self, discussion_id: i64) -> Result<DiscussionResource>;
}

/// [`ReadingPositionApi`] over the forum's REST API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
    session: Arc<Session>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, session: Arc<Session>) -> Self {
        Self::with_client(base_url, session, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, session: Arc<Session>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            session,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ReadingPositionApi for HttpApi {
    async fn save_position(&self, discussion_id: i64, post_number: u32) -> Result<DiscussionResource> {
        if !self.session.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }
        let post_number = i32::try_from(post_number)
            .map_err(|_| ClientError::Decode(format!("post number {post_number} out of range")))?;

        let request = self
            .http
            .post(format!("{}/api/v1/reading-position", self.base_url))
            .json(&SaveReadingPosition {
                discussion_id,
                post_number,
            });
        decode(self.authorize(request).send().await?).await
    }

    async fn fetch_position(&self, discussion_id: i64) -> Result<DiscussionResource> {
        let request = self
            .http
            .get(format!("{}/api/v1/discussions/{discussion_id}", self.base_url))
            .query(&[("fields", POSITION_FIELDS)]);
        decode(self.authorize(request).send().await?).await
    }
}

async fn decode(resp: Response) -> Result<DiscussionResource> {
    let status = resp.status();
    if !status.is_success() {
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error"))
            .to_string();
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let body: Value = resp.json().await?;
    serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))
}
