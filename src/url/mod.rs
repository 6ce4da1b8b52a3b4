//! URL handling module
//!
//! This module provides URL normalization, link resolution, and the scope
//! checks used when deciding whether a link belongs to the documentation site.

mod normalize;

use url::Url;

pub use normalize::{normalize_url, resolve_link};

/// Returns true if both URLs share scheme, host and port
pub fn is_same_origin(candidate: &Url, seed: &Url) -> bool {
    candidate.origin() == seed.origin()
}

/// Returns true if `candidate` lives at or below the seed's path
///
/// A seed of `/docs` accepts `/docs` and `/docs/intro`, but not `/docsearch`.
/// A root seed accepts every path on the origin.
pub fn is_under_prefix(candidate: &Url, seed: &Url) -> bool {
    if !is_same_origin(candidate, seed) {
        return false;
    }

    let prefix = seed.path().trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }

    let path = candidate.path();
    path == prefix || path.starts_with(&format!("{}/", prefix))
}

/// Resolves a content link or image source to an absolute URL string
///
/// Unlike [`resolve_link`], fragments are kept and non-HTTP schemes such as
/// `mailto:` pass through untouched, since these are rendered, not crawled.
pub fn absolutize(href: &str, page_url: &Url) -> String {
    let href = href.trim();
    match page_url.join(href) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_origin() {
        let seed = url("https://docs.example.com/");
        assert!(is_same_origin(&url("https://docs.example.com/a"), &seed));
        assert!(!is_same_origin(&url("http://docs.example.com/a"), &seed));
        assert!(!is_same_origin(&url("https://example.com/a"), &seed));
        assert!(!is_same_origin(&url("https://docs.example.com:8443/a"), &seed));
    }

    #[test]
    fn test_under_root_prefix() {
        let seed = url("https://docs.example.com/");
        assert!(is_under_prefix(&url("https://docs.example.com/anything"), &seed));
    }

    #[test]
    fn test_under_path_prefix() {
        let seed = url("https://example.com/docs");
        assert!(is_under_prefix(&url("https://example.com/docs"), &seed));
        assert!(is_under_prefix(&url("https://example.com/docs/intro"), &seed));
        assert!(!is_under_prefix(&url("https://example.com/docsearch"), &seed));
        assert!(!is_under_prefix(&url("https://example.com/blog"), &seed));
    }

    #[test]
    fn test_absolutize_keeps_fragment() {
        let page = url("https://docs.example.com/guide/setup");
        assert_eq!(
            absolutize("../api#auth", &page),
            "https://docs.example.com/api#auth"
        );
        assert_eq!(
            absolutize("#local", &page),
            "https://docs.example.com/guide/setup#local"
        );
    }

    #[test]
    fn test_absolutize_passes_mailto() {
        let page = url("https://docs.example.com/guide");
        assert_eq!(
            absolutize("mailto:team@example.com", &page),
            "mailto:team@example.com"
        );
    }
}
