//! IDownloadCoupon scraper.
//!
//! Listing pages are a WooCommerce product grid; each product's "Enroll Now"
//! button points at a linksynergy deeplink whose `murl` query parameter wraps
//! the actual course URL (percent-encoded a second time by the deeplink
//! builder).

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::http;
use crate::retry::fetch_with_retry;
use crate::sources::{LinkSource, extract};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use url::Url;

const BASE_URL: &str = "https://idownloadcoupon.com";

/// Scraper for idownloadcoupon.com
pub struct IDownloadCoupon {
    client: Client,
    base: String,
    page_limit: Option<u32>,
    retry: RetryConfig,
}

impl IDownloadCoupon {
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
            format!("{}/product-category/udemy/", self.base)
        } else {
            format!("{}/product-category/udemy/page/{page}/", self.base)
        }
    }

    async fn get_page(&self, url: &str) -> Result<String> {
        fetch_with_retry(&self.retry, || http::get_html(&self.client, url)).await
    }

    /// Unwrap deeplink-wrapped course URLs from one listing page
    fn links_on_page(html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let anchor = extract::selector("li.product a[href*='murl=']")?;

        let mut links = Vec::new();
        for element in document.select(&anchor) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Ok(deeplink) = Url::parse(href) else {
                tracing::debug!(href, "Skipping unparseable deeplink");
                continue;
            };
            if let Some((_, murl)) = deeplink.query_pairs().find(|(k, _)| k == "murl") {
                // query_pairs decodes one layer; the deeplink builder encodes two
                match urlencoding::decode(&murl) {
                    Ok(course_url) => links.push(course_url.into_owned()),
                    Err(e) => tracing::debug!(error = %e, "Skipping undecodable murl"),
                }
            }
        }
        Ok(links)
    }
}

#[async_trait]
impl LinkSource for IDownloadCoupon {
    fn name(&self) -> &'static str {
        "idownloadcoupon"
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

            let url = self.listing_url(page);
            let html = match self.get_page(&url).await {
                Ok(html) => html,
                // The grid 404s past the last page; that ends the listing
                Err(Error::Http { status: 404, .. }) if page > 1 => break,
                Err(e) => return Err(e),
            };

            let page_links = Self::links_on_page(&html)?;
            if page_links.is_empty() {
                break;
            }
            tracing::debug!(page, count = page_links.len(), "Scraped listing page");
            links.extend(page_links);
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

    #[test]
    fn unwraps_double_encoded_deeplinks() {
        let html = r#"
            <ul><li class="product">
              <a href="https://click.linksynergy.com/deeplink?id=abc&mid=39197&murl=https%3A%2F%2Fwww.udemy.com%2Fcourse%2Frust-basics%2F%3FcouponCode%3DFREE">Enroll Now</a>
            </li></ul>
        "#;
        let links = IDownloadCoupon::links_on_page(html).unwrap();
        assert_eq!(
            links,
            vec!["https://www.udemy.com/course/rust-basics/?couponCode=FREE"]
        );
    }

    #[test]
    fn ignores_products_without_deeplinks() {
        let html = r#"<ul><li class="product"><a href="/product/some-course/">View</a></li></ul>"#;
        assert!(IDownloadCoupon::links_on_page(html).unwrap().is_empty());
    }

    #[test]
    fn listing_urls_paginate_after_page_one() {
        let scraper = IDownloadCoupon::new(Client::new(), None, RetryConfig::default());
        assert_eq!(
            scraper.listing_url(1),
            "https://idownloadcoupon.com/product-category/udemy/"
        );
        assert_eq!(
            scraper.listing_url(3),
            "https://idownloadcoupon.com/product-category/udemy/page/3/"
        );
    }

    #[test]
    fn base_url_override_rewrites_listing_urls() {
        let scraper = IDownloadCoupon::new(Client::new(), None, RetryConfig::default())
            .with_base_url("http://127.0.0.1:8080");
        assert_eq!(
            scraper.listing_url(1),
            "http://127.0.0.1:8080/product-category/udemy/"
        );
    }
}
