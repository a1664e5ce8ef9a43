#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forum_common::DiscussionResource;
use parking_lot::Mutex;
use reading_client::{ClientError, ReadingPositionApi, Result};

/// Records every call and answers from a small in-memory table.
#[derive(Default)]
pub struct MockApi {
    pub saves: Mutex<Vec<(i64, u32)>>,
    pub fetches: AtomicUsize,
    pub fail_saves: AtomicBool,
    /// Server-side `last_post_number`; saved positions are clamped to it.
    pub last_post_number: Option<u32>,
    /// `(reading_position, last_read_post_number)` served by fetches.
    pub markers: Mutex<HashMap<i64, (Option<i32>, Option<i32>)>>,
    pub fetch_delay: Duration,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_markers(entries: &[(i64, Option<i32>, Option<i32>)]) -> Arc<Self> {
        let api = Self {
            fetch_delay: Duration::from_millis(50),
            ..Default::default()
        };
        api.markers.lock().extend(
            entries
                .iter()
                .map(|(id, reading, last_read)| (*id, (*reading, *last_read))),
        );
        Arc::new(api)
    }

    pub fn saves(&self) -> Vec<(i64, u32)> {
        self.saves.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadingPositionApi for MockApi {
    async fn save_position(&self, discussion_id: i64, post_number: u32) -> Result<DiscussionResource> {
        self.saves.lock().push((discussion_id, post_number));
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                message: "boom".into(),
            });
        }

        let last = self.last_post_number.unwrap_or(u32::MAX);
        let stored = post_number.min(last);
        Ok(DiscussionResource {
            id: discussion_id,
            last_post_number: self.last_post_number.unwrap_or(0) as i32,
            reading_position: Some(stored as i32),
            ..Default::default()
        })
    }

    async fn fetch_position(&self, discussion_id: i64) -> Result<DiscussionResource> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.fetch_delay).await;

        let markers = self.markers.lock().get(&discussion_id).copied();
        match markers {
            Some((reading_position, last_read_post_number)) => Ok(DiscussionResource {
                id: discussion_id,
                reading_position,
                last_read_post_number,
                ..Default::default()
            }),
            None => Err(ClientError::Status {
                status: 404,
                message: "Discussion not found".into(),
            }),
        }
    }
}
