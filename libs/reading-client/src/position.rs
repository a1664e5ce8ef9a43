//! Working out which post the reader is looking at.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys a position signal object may carry its post number under, in
/// priority order.
const SIGNAL_KEYS: [&str; 6] = [
    "startNumber",
    "start_number",
    "number",
    "postNumber",
    "post_number",
    "near",
];

/// Base used to resolve relative locations; never contacted.
const LOCATION_BASE: &str = "http://forum.invalid/";

/// A rendered post and its box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleItem {
    pub number: u32,
    pub top: f64,
    pub bottom: f64,
}

/// A strictly positive integer from a JSON number or numeric string.
pub(crate) fn positive_int(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => match n.as_u64() {
            Some(n) => n,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || f < 1.0 || f > u64::MAX as f64 {
                    return None;
                }
                f as u64
            }
        },
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (n > 0).then_some(n)
}

fn post_number(value: &Value) -> Option<u32> {
    positive_int(value).and_then(|n| u32::try_from(n).ok())
}

/// Post number carried by the host's position signal.
pub fn from_signal(signal: &Value) -> Option<u32> {
    match signal {
        Value::Object(map) => SIGNAL_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(post_number)),
        other => post_number(other),
    }
}

/// The `near` of a location: `/d/{id-slug}/{near}` or `?near=`.
pub fn near_from_location(location: &str) -> Option<u32> {
    let base = Url::parse(LOCATION_BASE).ok()?;
    let url = base.join(location).ok()?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    if let ["d", _, near, ..] = segments.as_slice() {
        if let Some(n) = post_number(&Value::String((*near).to_string())) {
            return Some(n);
        }
    }

    url.query_pairs()
        .find(|(k, _)| k == "near")
        .and_then(|(_, v)| post_number(&Value::String(v.into_owned())))
}

/// The post straddling the top edge of the viewport, or failing that the
/// first one below it.
pub fn topmost_visible(items: &[VisibleItem], viewport_top: f64) -> Option<u32> {
    let live = items.iter().filter(|item| item.number > 0);

    if let Some(item) = live
        .clone()
        .find(|item| item.top <= viewport_top && item.bottom > viewport_top)
    {
        return Some(item.number);
    }

    live.filter(|item| item.top >= viewport_top)
        .min_by(|a, b| a.top.total_cmp(&b.top))
        .map(|item| item.number)
}

/// Candidate reading position for a position change; the signal wins over
/// the location, which wins over the rendered posts.
pub fn derive_candidate(
    signal: &Value,
    location: Option<&str>,
    visible: &[VisibleItem],
    viewport_top: f64,
) -> Option<u32> {
    from_signal(signal)
        .or_else(|| location.and_then(near_from_location))
        .or_else(|| topmost_visible(visible, viewport_top))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(number: u32, top: f64, bottom: f64) -> VisibleItem {
        VisibleItem { number, top, bottom }
    }

    #[test]
    fn signal_shapes() {
        assert_eq!(from_signal(&json!(7)), Some(7));
        assert_eq!(from_signal(&json!("8")), Some(8));
        assert_eq!(from_signal(&json!({ "startNumber": 4, "number": 9 })), Some(4));
        assert_eq!(from_signal(&json!({ "post_number": "11" })), Some(11));
        assert_eq!(from_signal(&json!({ "near": 3.0 })), Some(3));
        assert_eq!(from_signal(&json!({ "startNumber": 0, "number": 2 })), Some(2));
    }

    #[test]
    fn signal_rejects_non_positive() {
        assert_eq!(from_signal(&json!(0)), None);
        assert_eq!(from_signal(&json!(-3)), None);
        assert_eq!(from_signal(&json!(2.5)), None);
        assert_eq!(from_signal(&json!("abc")), None);
        assert_eq!(from_signal(&json!([5])), None);
        assert_eq!(from_signal(&json!({ "other": 5 })), None);
        assert_eq!(from_signal(&Value::Null), None);
    }

    #[test]
    fn near_from_path_or_query() {
        assert_eq!(near_from_location("/d/12-intro/34"), Some(34));
        assert_eq!(near_from_location("/d/12-intro?near=5"), Some(5));
        assert_eq!(near_from_location("https://forum.example/d/12/6"), Some(6));
        assert_eq!(near_from_location("/d/12-intro"), None);
        assert_eq!(near_from_location("/d/12-intro/reply"), None);
        assert_eq!(near_from_location("/u/someone?near=0"), None);
    }

    #[test]
    fn straddling_item_wins() {
        let items = [item(3, -120.0, 40.0), item(4, 40.0, 300.0), item(5, 300.0, 600.0)];
        assert_eq!(topmost_visible(&items, 0.0), Some(3));
    }

    #[test]
    fn first_item_below_top_when_nothing_straddles() {
        let items = [item(6, 320.0, 500.0), item(5, 10.0, 300.0), item(4, -400.0, -20.0)];
        assert_eq!(topmost_visible(&items, 0.0), Some(5));
        assert_eq!(topmost_visible(&[], 0.0), None);
    }

    #[test]
    fn derivation_order() {
        let items = [item(2, -10.0, 100.0)];
        assert_eq!(derive_candidate(&json!(9), Some("/d/1/4"), &items, 0.0), Some(9));
        assert_eq!(derive_candidate(&Value::Null, Some("/d/1/4"), &items, 0.0), Some(4));
        assert_eq!(derive_candidate(&Value::Null, Some("/d/1"), &items, 0.0), Some(2));
        assert_eq!(derive_candidate(&Value::Null, None, &[], 0.0), None);
    }
}
