//! DiscUdemy scraper.
//!
//! Three-hop structure: the paginated `/all/{page}` listing links to detail
//! pages, each detail page has a "Take Course" button pointing at a `/go/`
//! redirect page, and the redirect page holds the final coupon link.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::http;
use crate::retry::fetch_with_retry;
use crate::sources::{LinkSource, extract};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use url::Url;

const BASE_URL: &str = "https://www.discudemy.com";

/// Scraper for discudemy.com
pub struct DiscUdemy {
    client: Client,
    base: String,
    page_limit: Option<u32>,
    retry: RetryConfig,
}

impl DiscUdemy {
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

    fn listing_url(&self, page: u32) -> String {
        format!("{}/all/{page}", self.base)
    }

    async fn get_page(&self, url: &str) -> Result<String> {
        fetch_with_retry(&self.retry, || http::get_html(&self.client, url)).await
    }

    /// Absolute detail-page URLs from one listing page
    fn detail_urls(&self, html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let card = extract::selector("section.center a.card-header[href]")?;
        let base = Url::parse(&self.base)?;

        let mut urls = Vec::new();
        for element in document.select(&card) {
            if let Some(href) = element.value().attr("href")
                && let Ok(resolved) = base.join(href)
            {
                urls.push(resolved.to_string());
            }
        }
        Ok(urls)
    }

    /// The `/go/` redirect URL on a detail page, if present
    fn go_url(&self, html: &str) -> Result<Option<String>> {
        let document = Html::parse_document(html);
        let button = extract::selector("a.discBtn[href*='/go/']")?;
        let base = Url::parse(&self.base)?;

        Ok(document
            .select(&button)
            .filter_map(|e| e.value().attr("href"))
            .filter_map(|href| base.join(href).ok())
            .map(|u| u.to_string())
            .next())
    }

    /// Follow one detail page through its redirect page to the coupon link
    async fn links_from_detail(&self, detail_url: &str) -> Result<Vec<String>> {
        let detail_html = self.get_page(detail_url).await?;
        let Some(go_url) = self.go_url(&detail_html)? else {
            tracing::debug!(url = %detail_url, "Detail page has no redirect button");
            return Ok(Vec::new());
        };
        let go_html = self.get_page(&go_url).await?;
        Ok(extract::coupon_links(&go_html))
    }
}

#[async_trait]
impl LinkSource for DiscUdemy {
    fn name(&self) -> &'static str {
        "discudemy"
    }

    fn base_url(&self) -> &str {
        &self.base
    }

    fn page_limit(&self) -> Option<u32> {
        self.page_limit
    }

    async fn fetch_links(&self, max_pages: Option<u32>) -> Result<Vec<String>> {
        let mut links = Vec::new();
        let mut page = 1u32;

        loop {
            if let Some(limit) = max_pages
                && page > limit
            {
                break;
            }

            let listing = match self.get_page(&self.listing_url(page)).await {
                Ok(html) => html,
                Err(Error::Http { status: 404, .. }) if page > 1 => break,
                Err(e) => return Err(e),
            };

            let detail_urls = self.detail_urls(&listing)?;
            if detail_urls.is_empty() {
                break;
            }

            for detail_url in detail_urls {
                match self.links_from_detail(&detail_url).await {
                    Ok(found) => {
                        tracing::debug!(url = %detail_url, count = found.len(), "Followed detail page");
                        links.extend(found);
                    }
                    Err(e) => {
                        tracing::warn!(url = %detail_url, error = %e, "Skipping unreachable detail page");
                    }
                }
            }
            page += 1;
        }

        tracing::info!(
            source = self.name(),
            count = links.len(),
            pages = page,
            "Indexed coupon links"
        );
        Ok(links)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> DiscUdemy {
        DiscUdemy::new(Client::new(), None, RetryConfig::default())
    }

    #[test]
    fn extracts_detail_urls_from_listing() {
        let html = r#"
            <section class="center">
              <a class="card-header" href="/rust-course">Rust Course</a>
              <a class="card-header" href="https://www.discudemy.com/sql-course">SQL</a>
            </section>
        "#;
        let urls = scraper().detail_urls(html).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.discudemy.com/rust-course",
                "https://www.discudemy.com/sql-course",
            ]
        );
    }

    #[test]
    fn finds_redirect_button() {
        let html = r#"<a class="discBtn" href="/go/abc123">Take Course</a>"#;
        assert_eq!(
            scraper().go_url(html).unwrap(),
            Some("https://www.discudemy.com/go/abc123".to_string())
        );
    }

    #[test]
    fn missing_redirect_button_is_none() {
        assert_eq!(scraper().go_url("<div></div>").unwrap(), None);
    }
}
