//! Local cache of the discussions the host has shown, keyed by id.

use dashmap::DashMap;
use forum_common::DiscussionResource;

/// What the client knows about one discussion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedDiscussion {
    pub id: i64,
    pub slug: String,
    pub last_post_number: u32,
    pub last_read_post_number: Option<u32>,
    pub reading_position: Option<u32>,
    /// Set once `reading_position` came from the server, so a `None` means
    /// "nothing recorded" rather than "not fetched yet".
    pub position_loaded: bool,
}

#[derive(Debug, Default)]
pub struct DiscussionStore {
    discussions: DashMap<i64, CachedDiscussion>,
}

impl DiscussionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<CachedDiscussion> {
        self.discussions.get(&id).map(|d| d.clone())
    }

    pub fn insert(&self, discussion: CachedDiscussion) {
        self.discussions.insert(discussion.id, discussion);
    }

    /// Merge a server representation, full or sparse. Fields a sparse
    /// payload leaves at their default keep the cached value.
    pub fn push(&self, resource: &DiscussionResource) {
        let mut entry = self
            .discussions
            .entry(resource.id)
            .or_insert_with(|| CachedDiscussion {
                id: resource.id,
                ..Default::default()
            });
        if !resource.slug.is_empty() {
            entry.slug = resource.slug.clone();
        }
        if let Some(last) = positive(Some(resource.last_post_number)) {
            entry.last_post_number = last;
        }
        entry.last_read_post_number = positive(resource.last_read_post_number);
        entry.reading_position = positive(resource.reading_position);
        entry.position_loaded = true;
    }

    pub fn reading_position(&self, id: i64) -> Option<u32> {
        self.discussions.get(&id).and_then(|d| d.reading_position)
    }

    pub fn set_reading_position(&self, id: i64, post_number: u32) {
        if let Some(mut d) = self.discussions.get_mut(&id) {
            d.reading_position = Some(post_number);
            d.position_loaded = true;
        }
    }

    pub fn last_post_number(&self, id: i64) -> Option<u32> {
        self.discussions
            .get(&id)
            .map(|d| d.last_post_number)
            .filter(|n| *n > 0)
    }
}

fn positive(n: Option<i32>) -> Option<u32> {
    n.and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0)
}
