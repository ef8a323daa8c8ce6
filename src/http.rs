//! HTTP helpers shared by the source scrapers

use crate::error::{Error, Result};
use std::time::Duration;

/// Transport-level timeout for a single HTTP request.
///
/// Separate from the orchestrator's per-source deadline, which bounds a whole
/// paginated fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("coupon-scout/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client used by all source scrapers
pub(crate) fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?)
}

/// GET a page and return its body as text
///
/// # Errors
///
/// Returns [`Error::Http`] for any non-success status, and [`Error::Network`]
/// for transport failures. Whether the failure is worth retrying is decided by
/// [`IsRetryable`](crate::retry::IsRetryable), not here.
pub(crate) async fn get_html(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%url, status = status.as_u16(), "GET returned non-success status");
        return Err(Error::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}
