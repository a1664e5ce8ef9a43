mod common;

use std::sync::Arc;

use reading_client::link::LinkContext;
use reading_client::{CachedDiscussion, ClickOutcome, DiscussionStore, PositionPrefetcher};

use common::MockApi;

const ORIGIN: &str = "https://forum.example";

fn prefetcher(api: &Arc<MockApi>) -> (PositionPrefetcher, Arc<DiscussionStore>) {
    let store = Arc::new(DiscussionStore::new());
    let prefetcher = PositionPrefetcher::new(api.clone(), store.clone(), ORIGIN).unwrap();
    (prefetcher, store)
}

fn navigate(to: &str) -> ClickOutcome {
    ClickOutcome::Navigate(to.to_string())
}

#[tokio::test(start_paused = true)]
async fn click_opens_at_reading_position() {
    let api = MockApi::with_markers(&[(5, Some(12), Some(30))]);
    let (prefetcher, store) = prefetcher(&api);

    let outcome = prefetcher.resolve_click("/d/5-intro", LinkContext::default()).await;
    assert_eq!(outcome, navigate("/d/5-intro/12"));
    assert_eq!(store.reading_position(5), Some(12));
}

#[tokio::test(start_paused = true)]
async fn last_read_marker_when_nothing_recorded() {
    let api = MockApi::with_markers(&[(5, None, Some(30))]);
    let (prefetcher, _store) = prefetcher(&api);

    let outcome = prefetcher.resolve_click("/d/5-intro", LinkContext::default()).await;
    assert_eq!(outcome, navigate("/d/5-intro/30"));
}

#[tokio::test(start_paused = true)]
async fn recorded_top_overrides_last_read() {
    let api = MockApi::with_markers(&[(5, Some(1), Some(30))]);
    let (prefetcher, _store) = prefetcher(&api);

    let outcome = prefetcher.resolve_click("/d/5-intro", LinkContext::default()).await;
    assert_eq!(outcome, navigate("/d/5-intro"));
}

#[tokio::test(start_paused = true)]
async fn explicit_targets_and_foreign_links_pass_through() {
    let api = MockApi::with_markers(&[(5, Some(12), None)]);
    let (prefetcher, _store) = prefetcher(&api);

    for href in [
        "/d/5-intro/3",
        "/d/5-intro?near=3",
        "/d/5-intro#p9",
        "/u/someone",
        "https://elsewhere.example/d/5-intro",
    ] {
        assert_eq!(
            prefetcher.resolve_click(href, LinkContext::default()).await,
            ClickOutcome::PassThrough,
            "{href}"
        );
    }
    assert_eq!(api.fetch_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_falls_back_to_the_link() {
    let api = MockApi::with_markers(&[]);
    let (prefetcher, _store) = prefetcher(&api);

    let outcome = prefetcher.resolve_click("/d/5-intro", LinkContext::default()).await;
    assert_eq!(outcome, navigate("/d/5-intro"));
}

#[tokio::test(start_paused = true)]
async fn search_results_are_not_redirected() {
    let api = MockApi::with_markers(&[(5, Some(12), None)]);
    let (prefetcher, _store) = prefetcher(&api);

    let outcome = prefetcher
        .resolve_click("/d/5-intro", LinkContext { searching: true })
        .await;
    assert_eq!(outcome, navigate("/d/5-intro"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_prefetches_share_one_request() {
    let api = MockApi::with_markers(&[(5, Some(12), None)]);
    let (prefetcher, _store) = prefetcher(&api);

    let (a, b, c) = tokio::join!(
        prefetcher.ensure_position(5),
        prefetcher.ensure_position(5),
        prefetcher.ensure_position(5),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(api.fetch_count(), 1);

    prefetcher.ensure_position(5).await.unwrap();
    assert_eq!(api.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn loaded_positions_skip_the_fetch() {
    let api = MockApi::with_markers(&[(5, Some(12), None)]);
    let (prefetcher, store) = prefetcher(&api);
    store.insert(CachedDiscussion {
        id: 5,
        slug: "intro".into(),
        last_post_number: 20,
        reading_position: Some(8),
        position_loaded: true,
        ..Default::default()
    });

    let outcome = prefetcher.resolve_click("/d/5", LinkContext::default()).await;
    assert_eq!(outcome, navigate("/d/5-intro/8"));
    assert_eq!(api.fetch_count(), 0);
}
