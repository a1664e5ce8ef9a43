//! Keeps the view where it is after the reader posts a reply.
//!
//! A successful "create post" arms a short-lived token for that discussion.
//! While the token lives, jumps to the tail of the discussion are swallowed,
//! one use each. Any other jump passes untouched.

use std::sync::Arc;
use std::time::Duration;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use moka::Expiry;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::events::{HostEvent, HostHandler, JumpDecision, JumpRequest, JumpTarget};
use crate::position::positive_int;

pub const DEFAULT_USES: u32 = 3;
pub const DEFAULT_TTL: Duration = Duration::from_millis(1800);
pub const MIN_TTL: Duration = Duration::from_millis(300);
pub const MAX_TRACKED: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyJumpToken {
    /// Number of the reply that armed the token, when the response had one.
    pub target_post_number: Option<u32>,
    pub remaining_uses: u32,
    pub expires_at: Instant,
}

impl ReplyJumpToken {
    fn is_live(&self, now: Instant) -> bool {
        self.remaining_uses > 0 && now < self.expires_at
    }

    fn is_tail(&self, request: &JumpRequest) -> bool {
        match request.target {
            JumpTarget::Latest => true,
            JumpTarget::Number(0) => false,
            JumpTarget::Number(n) => {
                request.last_post_number.is_some_and(|last| last > 0 && n >= last)
                    || self.target_post_number.is_some_and(|target| n >= target)
            }
        }
    }
}

type TokenCell = Arc<Mutex<ReplyJumpToken>>;

/// Lets the cache drop a token once its deadline passes, read or not.
struct TokenExpiry;

impl TokenExpiry {
    fn remaining(cell: &TokenCell) -> Option<Duration> {
        Some(cell.lock().expires_at.saturating_duration_since(Instant::now()))
    }
}

impl Expiry<i64, TokenCell> for TokenExpiry {
    fn expire_after_create(&self, _id: &i64, cell: &TokenCell, _at: std::time::Instant) -> Option<Duration> {
        Self::remaining(cell)
    }

    fn expire_after_update(
        &self,
        _id: &i64,
        cell: &TokenCell,
        _at: std::time::Instant,
        _left: Option<Duration>,
    ) -> Option<Duration> {
        Self::remaining(cell)
    }
}

pub struct ReplyJumpSuppressor {
    tokens: Cache<i64, TokenCell>,
}

impl Default for ReplyJumpSuppressor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyJumpSuppressor {
    pub fn new() -> Self {
        Self {
            tokens: Cache::builder()
                .max_capacity(MAX_TRACKED)
                .eviction_policy(EvictionPolicy::lru())
                .expire_after(TokenExpiry)
                .build(),
        }
    }

    /// Arm with the default budget of 3 uses over 1.8 s.
    pub fn arm(&self, discussion_id: i64, target: Option<i64>) {
        self.arm_with(discussion_id, target, DEFAULT_USES, DEFAULT_TTL);
    }

    /// Arm, replacing any live token. At least one use and 300 ms are granted.
    pub fn arm_with(&self, discussion_id: i64, target: Option<i64>, uses: u32, ttl: Duration) {
        let token = ReplyJumpToken {
            target_post_number: target
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0),
            remaining_uses: uses.max(1),
            expires_at: Instant::now() + ttl.max(MIN_TTL),
        };
        debug!(
            discussion_id,
            target = ?token.target_post_number,
            uses = token.remaining_uses,
            "reply jump suppression armed"
        );
        self.tokens.insert(discussion_id, Arc::new(Mutex::new(token)));
    }

    /// The live token for a discussion; expired or spent tokens are dropped.
    pub fn token(&self, discussion_id: i64) -> Option<ReplyJumpToken> {
        let token = *self.tokens.get(&discussion_id)?.lock();
        if token.is_live(Instant::now()) {
            Some(token)
        } else {
            self.tokens.invalidate(&discussion_id);
            None
        }
    }

    pub fn before_jump(&self, request: &JumpRequest) -> JumpDecision {
        let Some(cell) = self.tokens.get(&request.discussion_id) else {
            return JumpDecision::Pass;
        };

        let mut token = cell.lock();
        if !token.is_live(Instant::now()) {
            drop(token);
            self.tokens.invalidate(&request.discussion_id);
            return JumpDecision::Pass;
        }
        if !token.is_tail(request) {
            return JumpDecision::Pass;
        }

        token.remaining_uses -= 1;
        let spent = token.remaining_uses == 0;
        drop(token);
        if spent {
            self.tokens.invalidate(&request.discussion_id);
        }

        debug!(discussion_id = request.discussion_id, target = ?request.target, "reply jump swallowed");
        JumpDecision::Swallow
    }

    /// Arm from a finished host request if it created a post.
    pub fn observe_request(&self, method: &str, url: &str, status: u16, body: &Value) {
        if !method.eq_ignore_ascii_case("POST")
            || !(200..300).contains(&status)
            || !is_create_post_url(url)
        {
            return;
        }

        match created_post_discussion(body) {
            Some(discussion_id) => self.arm(discussion_id, created_post_number(body)),
            None => debug!(url, "post created but response names no discussion"),
        }
    }
}

impl HostHandler for ReplyJumpSuppressor {
    fn on_event(&self, event: &HostEvent) {
        if let HostEvent::RequestCompleted {
            method,
            url,
            status,
            body,
        } = event
        {
            self.observe_request(method, url, *status, body);
        }
    }

    fn before_jump(&self, request: &JumpRequest) -> JumpDecision {
        ReplyJumpSuppressor::before_jump(self, request)
    }
}

/// Whether the URL path ends in `/posts`, ignoring a trailing slash, query or
/// fragment.
pub fn is_create_post_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/').ends_with("/posts")
}

const DISCUSSION_ID_POINTERS: [&str; 3] = [
    "/discussion_id",
    "/data/relationships/discussion/data/id",
    "/data/attributes/discussionId",
];

const NUMBER_POINTERS: [&str; 2] = ["/number", "/data/attributes/number"];

fn first_positive(body: &Value, pointers: &[&str]) -> Option<i64> {
    pointers
        .iter()
        .find_map(|p| body.pointer(p).and_then(positive_int))
        .and_then(|n| i64::try_from(n).ok())
}

fn created_post_discussion(body: &Value) -> Option<i64> {
    first_positive(body, &DISCUSSION_ID_POINTERS)
}

fn created_post_number(body: &Value) -> Option<i64> {
    first_positive(body, &NUMBER_POINTERS)
}
