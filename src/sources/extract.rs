//! Shared link-extraction helpers for the source scrapers

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

/// Matches a course link carrying a coupon code, as republished by the
/// aggregator sites either in anchors or inline in scripts.
static COUPON_LINK: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r#"https://www\.udemy\.com/course/[A-Za-z0-9\-_%./]+\?[^"'\s<>\\]*couponCode=[A-Za-z0-9\-_.]+"#)
        .unwrap()
});

/// Extract every coupon-bearing course link from a blob of HTML
///
/// Order of appearance is preserved; duplicates within one page are kept
/// (deduplication is a downstream concern).
pub(crate) fn coupon_links(html: &str) -> Vec<String> {
    COUPON_LINK
        .find_iter(html)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse a CSS selector, mapping the unhelpful parse error into our own
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("bad selector `{css}`: {e}")))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_coupon_links_in_anchors_and_scripts() {
        let html = r#"
            <a href="https://www.udemy.com/course/rust-basics/?couponCode=FREE2024">Get</a>
            <script>var u = "https://www.udemy.com/course/sql-101/?src=x&couponCode=ABC-1";</script>
            <a href="https://www.udemy.com/course/paid-course/">No coupon here</a>
        "#;
        let links = coupon_links(html);
        assert_eq!(
            links,
            vec![
                "https://www.udemy.com/course/rust-basics/?couponCode=FREE2024",
                "https://www.udemy.com/course/sql-101/?src=x&couponCode=ABC-1",
            ]
        );
    }

    #[test]
    fn no_links_in_plain_page() {
        assert!(coupon_links("<html><body>nothing</body></html>").is_empty());
    }

    #[test]
    fn selector_parse_errors_are_mapped() {
        assert!(selector("a[href]").is_ok());
        assert!(selector(":::").is_err());
    }
}
