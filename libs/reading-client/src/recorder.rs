//! Debounced, deduplicated persistence of the reader's position.

use std::sync::Arc;
use std::time::Duration;

use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::ReadingPositionApi;
use crate::events::{HostEvent, HostHandler};
use crate::position::derive_candidate;
use crate::session::Session;
use crate::store::DiscussionStore;

pub const DEBOUNCE: Duration = Duration::from_millis(200);

/// Discussions tracked at once; the least recently used is dropped first.
pub const MAX_TRACKED: u64 = 50;

#[derive(Debug, Default)]
struct Slot {
    pending: Option<u32>,
    timer: Option<JoinHandle<()>>,
    last_confirmed: Option<u32>,
}

impl Slot {
    fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Inner {
    api: Arc<dyn ReadingPositionApi>,
    session: Arc<Session>,
    store: Arc<DiscussionStore>,
    slots: Cache<i64, Arc<Mutex<Slot>>>,
    debounce: Duration,
}

#[derive(Clone)]
pub struct PositionRecorder {
    inner: Arc<Inner>,
}

impl PositionRecorder {
    pub fn new(
        api: Arc<dyn ReadingPositionApi>,
        session: Arc<Session>,
        store: Arc<DiscussionStore>,
    ) -> Self {
        Self::with_debounce(api, session, store, DEBOUNCE)
    }

    pub fn with_debounce(
        api: Arc<dyn ReadingPositionApi>,
        session: Arc<Session>,
        store: Arc<DiscussionStore>,
        debounce: Duration,
    ) -> Self {
        let slots = Cache::builder()
            .max_capacity(MAX_TRACKED)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(|id: Arc<i64>, slot: Arc<Mutex<Slot>>, cause: RemovalCause| {
                if cause != RemovalCause::Replaced {
                    debug!(discussion_id = *id, ?cause, "dropping reading position tracker");
                    slot.lock().cancel();
                }
            })
            .build();

        Self {
            inner: Arc::new(Inner {
                api,
                session,
                store,
                slots,
                debounce,
            }),
        }
    }

    /// Schedule `candidate` to be saved once the reader settles.
    ///
    /// A different candidate arriving before the timer fires replaces it and
    /// restarts the timer; the same candidate is ignored.
    pub fn record(&self, discussion_id: i64, candidate: u32) {
        if candidate == 0 || !self.inner.session.is_authenticated() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            debug!(discussion_id, "no runtime, reading position not scheduled");
            return;
        };

        let slot = self.inner.slots.get_with(discussion_id, Default::default);
        let mut guard = slot.lock();
        if guard.pending == Some(candidate) {
            return;
        }
        guard.pending = Some(candidate);
        guard.cancel();

        let inner = Arc::clone(&self.inner);
        let timer_slot = Arc::clone(&slot);
        guard.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.flush(discussion_id, &timer_slot).await;
        }));
    }

    /// Stop tracking a discussion, cancelling any pending save.
    pub fn forget(&self, discussion_id: i64) {
        if let Some(slot) = self.inner.slots.remove(&discussion_id) {
            slot.lock().cancel();
        }
    }

    /// Value the server last confirmed for this discussion in this session.
    pub fn last_confirmed(&self, discussion_id: i64) -> Option<u32> {
        self.inner
            .slots
            .get(&discussion_id)
            .and_then(|slot| slot.lock().last_confirmed)
    }

    pub fn has_pending(&self, discussion_id: i64) -> bool {
        self.inner
            .slots
            .get(&discussion_id)
            .is_some_and(|slot| slot.lock().pending.is_some())
    }
}

impl Inner {
    async fn flush(&self, discussion_id: i64, slot: &Mutex<Slot>) {
        // Release the timer handle first so a newer candidate cannot abort an
        // in-flight save.
        let (candidate, last_confirmed) = {
            let mut s = slot.lock();
            s.timer = None;
            (s.pending.take(), s.last_confirmed)
        };
        let Some(candidate) = candidate else {
            return;
        };

        let cached = self.store.reading_position(discussion_id);
        if Some(candidate) == cached || Some(candidate) == last_confirmed {
            debug!(discussion_id, candidate, "reading position unchanged");
            return;
        }

        match self.api.save_position(discussion_id, candidate).await {
            Ok(resource) => {
                let confirmed = resource
                    .reading_position
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(candidate);
                slot.lock().last_confirmed = Some(confirmed);
                self.store.push(&resource);
                self.store.set_reading_position(discussion_id, confirmed);
                debug!(discussion_id, candidate, confirmed, "reading position saved");
            }
            Err(err) => {
                debug!(discussion_id, candidate, error = %err, "reading position not saved");
            }
        }
    }
}

impl HostHandler for PositionRecorder {
    fn on_event(&self, event: &HostEvent) {
        if let HostEvent::PositionChanged {
            discussion_id,
            signal,
            location,
            visible,
            viewport_top,
        } = event
        {
            if let Some(candidate) =
                derive_candidate(signal, location.as_deref(), visible, *viewport_top)
            {
                self.record(*discussion_id, candidate);
            }
        }
    }
}
