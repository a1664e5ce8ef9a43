use std::sync::Arc;

use crate::api::{HttpApi, ReadingPositionApi};
use crate::error::Result;
use crate::events::HostBus;
use crate::prefetch::PositionPrefetcher;
use crate::recorder::PositionRecorder;
use crate::session::Session;
use crate::store::DiscussionStore;
use crate::suppressor::ReplyJumpSuppressor;

/// Every reading feature wired to one host bus.
///
/// The host emits events and routes jumps through [`ReadingClient::bus`];
/// clicks on discussion links go through [`ReadingClient::prefetcher`].
pub struct ReadingClient {
    pub session: Arc<Session>,
    pub store: Arc<DiscussionStore>,
    pub recorder: PositionRecorder,
    pub suppressor: Arc<ReplyJumpSuppressor>,
    pub prefetcher: PositionPrefetcher,
    pub bus: HostBus,
}

impl ReadingClient {
    /// Client for the forum served at `base_url`.
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self> {
        let api = Arc::new(HttpApi::new(base_url, Arc::clone(&session)));
        Self::with_api(base_url, session, api)
    }

    pub fn with_api(base_url: &str, session: Arc<Session>, api: Arc<dyn ReadingPositionApi>) -> Result<Self> {
        let store = Arc::new(DiscussionStore::new());
        let recorder = PositionRecorder::new(Arc::clone(&api), Arc::clone(&session), Arc::clone(&store));
        let suppressor = Arc::new(ReplyJumpSuppressor::new());
        let prefetcher = PositionPrefetcher::new(api, Arc::clone(&store), base_url)?;

        let bus = HostBus::new();
        bus.subscribe(Arc::new(recorder.clone()));
        bus.subscribe(suppressor.clone());

        tracing::debug!(base_url, "reading client ready");

        Ok(Self {
            session,
            store,
            recorder,
            suppressor,
            prefetcher,
            bus,
        })
    }
}
