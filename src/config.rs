//! Configuration types for coupon-scout

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard ceiling on concurrent source fetches, regardless of configuration.
///
/// Protects the scraped sites from excessive simultaneous connections; a
/// requested concurrency above this value is clamped with a warning, not
/// rejected.
pub const MAX_CONCURRENCY_CEILING: usize = 20;

/// Per-source enablement flags
///
/// One flag per known coupon source. If every flag is false the configuration
/// is treated as "no explicit selection" and all sources run; the all-off
/// configuration means all-on, not a no-op run.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceToggles {
    /// Run the idownloadcoupon scraper
    #[serde(default)]
    pub idownloadcoupon: bool,

    /// Run the freebiesglobal scraper
    #[serde(default)]
    pub freebiesglobal: bool,

    /// Run the tutorialbar scraper
    #[serde(default)]
    pub tutorialbar: bool,

    /// Run the discudemy scraper
    #[serde(default)]
    pub discudemy: bool,

    /// Run the coursevania scraper
    #[serde(default)]
    pub coursevania: bool,
}

impl SourceToggles {
    /// True if at least one source is explicitly selected
    pub fn any_enabled(&self) -> bool {
        self.idownloadcoupon
            || self.freebiesglobal
            || self.tutorialbar
            || self.discudemy
            || self.coursevania
    }
}

/// Fuzz mode configuration (randomized scheduling perturbation)
///
/// When enabled, the orchestrator injects a small random jitter before each
/// source acquires its admission slot, clamps per-source page limits, and
/// shuffles the final aggregate. With a fixed [`seed`](Self::seed) the
/// perturbation is fully reproducible; without one a fresh entropy-seeded
/// generator is used and runs are not reproducible.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct FuzzConfig {
    /// Enable fuzz mode (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// Seed for the perturbation generator (None = entropy-seeded)
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Retry configuration for transient HTTP failures
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Main configuration for a [`CouponScout`](crate::CouponScout) instance
///
/// All fields have sensible defaults; a zero-value deserialization runs every
/// source with a page limit of 100, ten concurrent fetches, and a 30-second
/// per-source timeout. The configuration is immutable for the lifetime of the
/// orchestrator that consumes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Per-source enablement flags
    #[serde(default)]
    pub sources: SourceToggles,

    /// Max pages to scrape per source, where pagination exists (default: 100)
    #[serde(default = "default_max_pages")]
    pub max_pages: Option<u32>,

    /// Requested number of concurrent source fetches (default: 10)
    ///
    /// Clamped to `1..=`[`MAX_CONCURRENCY_CEILING`] at run time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Deadline for a single source's fetch (default: 30 seconds)
    #[serde(default = "default_task_timeout", with = "duration_serde")]
    pub task_timeout: Duration,

    /// Fuzz mode settings
    #[serde(default)]
    pub fuzz: FuzzConfig,

    /// Retry behavior for transient HTTP failures inside source fetches
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourceToggles::default(),
            max_pages: default_max_pages(),
            max_concurrency: default_max_concurrency(),
            task_timeout: default_task_timeout(),
            fuzz: FuzzConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// This is the precondition check performed before any source is
    /// dispatched; it is the only failure that can abort a scrape run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the per-source timeout is zero, the page
    /// limit is zero, the requested concurrency is zero, or the retry backoff
    /// multiplier is below 1.0.
    pub fn validate(&self) -> Result<()> {
        if self.task_timeout.is_zero() {
            return Err(Error::config("task_timeout", "must be greater than zero"));
        }
        if self.max_pages == Some(0) {
            return Err(Error::config("max_pages", "must be at least 1 when set"));
        }
        if self.max_concurrency == 0 {
            return Err(Error::config("max_concurrency", "must be at least 1"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                "must be at least 1.0",
            ));
        }
        Ok(())
    }
}

fn default_max_pages() -> Option<u32> {
    Some(100)
}

fn default_max_concurrency() -> usize {
    10
}

fn default_task_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
