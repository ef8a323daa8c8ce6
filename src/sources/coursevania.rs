//! CourseVania scraper.
//!
//! The course grid is rendered client-side: the listing page embeds a nonce,
//! and an `admin-ajax.php` endpoint returns the grid HTML as JSON. Course
//! detail pages on the site carry the coupon link.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::http;
use crate::retry::fetch_with_retry;
use crate::sources::{LinkSource, extract};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;

const BASE_URL: &str = "https://coursevania.com";

static NONCE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r#""load_content":"([a-f0-9]+)""#).unwrap()
});

/// JSON envelope returned by the grid endpoint
#[derive(Debug, Deserialize)]
struct GridResponse {
    content: String,
}

/// Scraper for coursevania.com
pub struct CourseVania {
    client: Client,
    base: String,
    page_limit: Option<u32>,
    retry: RetryConfig,
}

impl CourseVania {
    /// Create the scraper with the shared HTTP client and configured limits
    pub fn new(client: Client, page_limit: Option<u32>, retry: RetryConfig) -> Self {
        Self {
            client,
            base: BASE_URL.to_string(),
            page_limit,
            retry,
        }
    }

    /// Point the scraper at an alternate origin, such as a mirror
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    async fn get_page(&self, url: &str) -> Result<String> {
        fetch_with_retry(&self.retry, || http::get_html(&self.client, url)).await
    }

    /// Pull the AJAX nonce out of the listing page's inline script
    fn nonce(html: &str) -> Result<String> {
        NONCE
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::Parse("nonce not found on courses page".into()))
    }

    fn grid_url(&self, nonce: &str) -> String {
        format!(
            "{}/wp-admin/admin-ajax.php?&template=courses/grid&args={{}}\
             &action=stm_lms_load_content&nonce={nonce}&sort=date_high",
            self.base
        )
    }

    /// Course detail URLs from the grid HTML
    fn course_urls(grid_html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(grid_html);
        let title = extract::selector("div.stm_lms_courses__single--title a[href]")?;

        Ok(document
            .select(&title)
            .filter_map(|e| e.value().attr("href"))
            .map(|href| href.to_string())
            .collect())
    }
}

#[async_trait]
impl LinkSource for CourseVania {
    fn name(&self) -> &'static str {
        "coursevania"
    }

    fn base_url(&self) -> &str {
        &self.base
    }

    fn page_limit(&self) -> Option<u32> {
        self.page_limit
    }

    /// The grid endpoint returns one unpaginated batch, so `max_pages` only
    /// distinguishes zero from nonzero here.
    async fn fetch_links(&self, max_pages: Option<u32>) -> Result<Vec<String>> {
        if max_pages == Some(0) {
            return Ok(Vec::new());
        }

        let listing = self.get_page(&format!("{}/courses/", self.base)).await?;
        let nonce = Self::nonce(&listing)?;

        let body = self.get_page(&self.grid_url(&nonce)).await?;
        let grid: GridResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("grid response was not JSON: {e}")))?;

        let course_urls = Self::course_urls(&grid.content)?;
        tracing::debug!(count = course_urls.len(), "Found courses in grid");

        let mut links = Vec::new();
        for course_url in course_urls {
            match self.get_page(&course_url).await {
                Ok(course_html) => {
                    let found = extract::coupon_links(&course_html);
                    tracing::debug!(url = %course_url, count = found.len(), "Scraped course page");
                    links.extend(found);
                }
                Err(e) => {
                    tracing::warn!(url = %course_url, error = %e, "Skipping unreachable course page");
                }
            }
        }

        tracing::info!(source = self.name(), count = links.len(), "Indexed coupon links");
        Ok(links)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_nonce_from_inline_script() {
        let html = r#"<script>var stm_lms_nonces = {"load_content":"9f8a7b6c5d"};</script>"#;
        assert_eq!(CourseVania::nonce(html).unwrap(), "9f8a7b6c5d");
    }

    #[test]
    fn missing_nonce_is_a_parse_error() {
        assert!(matches!(
            CourseVania::nonce("<html></html>"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn extracts_course_urls_from_grid() {
        let grid = r#"
            <div class="stm_lms_courses__single--title">
              <a href="https://coursevania.com/courses/rust-basics/">Rust Basics</a>
            </div>
        "#;
        assert_eq!(
            CourseVania::course_urls(grid).unwrap(),
            vec!["https://coursevania.com/courses/rust-basics/"]
        );
    }
}
