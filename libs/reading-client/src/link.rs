//! Where a link to a discussion should land.

use forum_common::route::{discussion_path, parse_id_segment};
use reqwest::Url;

use crate::store::CachedDiscussion;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkContext {
    /// The link is part of search results, which keep their own ordering
    /// and are never redirected to a saved position.
    pub searching: bool,
}

/// The post a plain link to this discussion should open at, if any.
///
/// A recorded reading position always decides, and a recorded `1` means
/// "start from the top". Without one, the native last-read marker applies.
pub fn effective_near(discussion: &CachedDiscussion) -> Option<u32> {
    match discussion.reading_position {
        Some(position) => (position > 1).then_some(position),
        None => discussion.last_read_post_number.filter(|n| *n > 1),
    }
}

pub fn compute_link_target(discussion: &CachedDiscussion, context: LinkContext) -> String {
    let near = if context.searching {
        None
    } else {
        effective_near(discussion)
    };
    discussion_path(discussion.id, &discussion.slug, near)
}

fn resolve(href: &str, origin: &Url) -> Option<Url> {
    let url = origin.join(href).ok()?;
    (url.origin() == origin.origin()).then_some(url)
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default()
}

/// The discussion a same-origin `/d/{id}[-slug]` link points at.
pub fn discussion_id_from_href(href: &str, origin: &Url) -> Option<i64> {
    let url = resolve(href, origin)?;
    match path_segments(&url).as_slice() {
        ["d", id, ..] => parse_id_segment(id),
        _ => None,
    }
}

/// The slug carried by a `/d/{id}-{slug}` link.
pub fn slug_from_href(href: &str, origin: &Url) -> Option<String> {
    let url = resolve(href, origin)?;
    match path_segments(&url).as_slice() {
        ["d", segment, ..] => segment
            .split_once('-')
            .map(|(_, slug)| slug.to_string())
            .filter(|slug| !slug.is_empty()),
        _ => None,
    }
}

/// Whether the link already asks for a specific spot: an extra path segment,
/// a `near` parameter or a fragment.
pub fn has_explicit_near(href: &str, origin: &Url) -> bool {
    let Some(url) = resolve(href, origin) else {
        return false;
    };
    path_segments(&url).len() > 2
        || url.query_pairs().any(|(k, _)| k == "near")
        || url.fragment().is_some_and(|f| !f.is_empty())
}
