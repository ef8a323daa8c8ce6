//! FreebiesGlobal scraper.
//!
//! A deal-aggregator blog: paginated listing pages link to per-deal pages,
//! and each deal page carries one or more coupon-bearing course links. Deal
//! pages that fail to load are logged and skipped without failing the source.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::http;
use crate::retry::fetch_with_retry;
use crate::sources::{LinkSource, extract};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use url::Url;

const BASE_URL: &str = "https://freebiesglobal.com";

/// Scraper for freebiesglobal.com
pub struct FreebiesGlobal {
    client: Client,
    base: String,
    page_limit: Option<u32>,
    retry: RetryConfig,
}

impl FreebiesGlobal {
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
        if page == 1 {
            format!("{}/dealstore/udemy", self.base)
        } else {
            format!("{}/dealstore/udemy/page/{page}", self.base)
        }
    }

    async fn get_page(&self, url: &str) -> Result<String> {
        fetch_with_retry(&self.retry, || http::get_html(&self.client, url)).await
    }

    /// Absolute deal-page URLs from one listing page
    fn deal_urls(&self, html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let title = extract::selector("h3.post-title a[href]")?;
        let base = Url::parse(&self.base)?;

        let mut urls = Vec::new();
        for element in document.select(&title) {
            if let Some(href) = element.value().attr("href")
                && let Ok(resolved) = base.join(href)
            {
                urls.push(resolved.to_string());
            }
        }
        Ok(urls)
    }
}

#[async_trait]
impl LinkSource for FreebiesGlobal {
    fn name(&self) -> &'static str {
        "freebiesglobal"
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

            let deal_urls = self.deal_urls(&listing)?;
            if deal_urls.is_empty() {
                break;
            }

            for deal_url in deal_urls {
                match self.get_page(&deal_url).await {
                    Ok(deal_html) => {
                        let found = extract::coupon_links(&deal_html);
                        tracing::debug!(url = %deal_url, count = found.len(), "Scraped deal page");
                        links.extend(found);
                    }
                    Err(e) => {
                        tracing::warn!(url = %deal_url, error = %e, "Skipping unreachable deal page");
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
