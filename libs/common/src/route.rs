//! Client-facing discussion routes (`/d/{id}-{slug}[/{near}]`).

/// Path prefix of discussion routes.
pub const DISCUSSION_PREFIX: &str = "/d/";

/// Maximum slug length kept from a title.
const MAX_SLUG_LEN: usize = 80;

/// Lowercase ASCII slug of a discussion title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug
}

/// Route to a discussion, optionally scrolled to post `near`.
pub fn discussion_path(id: i64, slug: &str, near: Option<u32>) -> String {
    let mut path = format!("{DISCUSSION_PREFIX}{id}");
    if !slug.is_empty() {
        path.push('-');
        path.push_str(slug);
    }
    if let Some(near) = near {
        path.push('/');
        path.push_str(&near.to_string());
    }
    path
}

/// Parse the leading numeric id from a `{id}-{slug}` route segment.
pub fn parse_id_segment(segment: &str) -> Option<i64> {
    let digits = segment.split('-').next()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Hello, World!  Rust 2024"), "hello-world-rust-2024");
        assert_eq!(slugify("  --leading"), "leading");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn discussion_path_variants() {
        assert_eq!(discussion_path(5, "", None), "/d/5");
        assert_eq!(discussion_path(5, "intro", None), "/d/5-intro");
        assert_eq!(discussion_path(5, "intro", Some(12)), "/d/5-intro/12");
    }

    #[test]
    fn id_segment_parsing() {
        assert_eq!(parse_id_segment("42-some-title"), Some(42));
        assert_eq!(parse_id_segment("42"), Some(42));
        assert_eq!(parse_id_segment("abc"), None);
        assert_eq!(parse_id_segment("0-zero"), None);
    }
}
