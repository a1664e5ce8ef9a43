//! Warming reading positions before the reader clicks, and resolving the
//! click once they do.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::Url;
use tracing::debug;

use crate::api::ReadingPositionApi;
use crate::error::{ClientError, Result};
use crate::link::{self, LinkContext};
use crate::store::DiscussionStore;

/// Discussions with a fetch in flight at once.
const MAX_IN_FLIGHT: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not ours to handle; let the host follow the link.
    PassThrough,
    Navigate(String),
}

#[derive(Clone)]
pub struct PositionPrefetcher {
    api: Arc<dyn ReadingPositionApi>,
    store: Arc<DiscussionStore>,
    origin: Url,
    // Concurrent initialisations of one key are coalesced, so an entry here
    // stands for a fetch that callers share. Entries are dropped once done.
    in_flight: Cache<i64, ()>,
}

impl PositionPrefetcher {
    pub fn new(api: Arc<dyn ReadingPositionApi>, store: Arc<DiscussionStore>, origin: &str) -> Result<Self> {
        let origin = Url::parse(origin).map_err(|e| ClientError::Url(e.to_string()))?;
        Ok(Self {
            api,
            store,
            origin,
            in_flight: Cache::new(MAX_IN_FLIGHT),
        })
    }

    /// Make sure the store knows this discussion's reading position.
    ///
    /// Concurrent callers for the same discussion share one request.
    pub async fn ensure_position(&self, discussion_id: i64) -> std::result::Result<(), Arc<ClientError>> {
        if self
            .store
            .get(discussion_id)
            .is_some_and(|d| d.position_loaded)
        {
            return Ok(());
        }

        let result = self
            .in_flight
            .try_get_with(discussion_id, async {
                let resource = self.api.fetch_position(discussion_id).await?;
                self.store.push(&resource);
                Ok::<_, ClientError>(())
            })
            .await;
        self.in_flight.invalidate(&discussion_id).await;

        if let Err(err) = &result {
            debug!(discussion_id, error = %err, "reading position prefetch failed");
        }
        result
    }

    /// Decide where a click on `href` should go.
    pub async fn resolve_click(&self, href: &str, context: LinkContext) -> ClickOutcome {
        let Some(discussion_id) = link::discussion_id_from_href(href, &self.origin) else {
            return ClickOutcome::PassThrough;
        };
        if link::has_explicit_near(href, &self.origin) {
            return ClickOutcome::PassThrough;
        }

        if self.ensure_position(discussion_id).await.is_err() {
            return ClickOutcome::Navigate(href.to_string());
        }

        let Some(mut discussion) = self.store.get(discussion_id) else {
            return ClickOutcome::Navigate(href.to_string());
        };
        if context.searching || link::effective_near(&discussion).is_none() {
            return ClickOutcome::Navigate(href.to_string());
        }
        if discussion.slug.is_empty() {
            discussion.slug = link::slug_from_href(href, &self.origin).unwrap_or_default();
        }
        ClickOutcome::Navigate(link::compute_link_target(&discussion, context))
    }
}
