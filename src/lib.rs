//! # coupon-scout
//!
//! Library for discovering course coupon links by scraping several
//! independent aggregator sites concurrently and handing the combined link
//! list to a downstream redemption step.
//!
//! ## Design Philosophy
//!
//! coupon-scout is designed to be:
//! - **Fail-soft** - A broken or slow source degrades the result quietly;
//!   it never aborts the batch
//! - **Bounded** - A semaphore admission gate caps concurrent fetches, with a
//!   hard ceiling of 20 regardless of configuration
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Reproducible under fuzz** - The optional perturbation mode is driven by
//!   an explicitly seeded generator, so resilience runs can be replayed
//!
//! ## Quick Start
//!
//! ```no_run
//! use coupon_scout::{Config, CouponScout, SourceToggles};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         sources: SourceToggles {
//!             discudemy: true,
//!             tutorialbar: true,
//!             ..Default::default()
//!         },
//!         max_pages: Some(5),
//!         ..Default::default()
//!     };
//!
//!     let mut scout = CouponScout::new(config)?;
//!     let links = scout.run().await?;
//!
//!     for link in &links {
//!         println!("{link}");
//!     }
//!     if let Some(metrics) = scout.last_metrics() {
//!         println!("{} sources attempted, {} succeeded", metrics.attempted, metrics.succeeded);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! An empty result and a run where every source failed look the same at the
//! result level; use [`CouponScout::last_metrics`] to tell them apart.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// HTTP helpers shared by the source scrapers
mod http;
/// The scraping orchestrator
pub mod orchestrator;
/// Retry logic with exponential backoff
pub mod retry;
/// Coupon sources and their lifecycle
pub mod sources;
/// Core types shared across the crate
pub mod types;

// Re-export commonly used types
pub use config::{Config, FuzzConfig, MAX_CONCURRENCY_CEILING, RetryConfig, SourceToggles};
pub use error::{Error, Result};
pub use orchestrator::CouponScout;
pub use sources::{LinkSource, SourceRegistry, SourceUnit};
pub use types::{FailureKind, RunMetrics, SourceState, UnitOutcome};
