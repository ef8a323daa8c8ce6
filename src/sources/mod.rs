//! Coupon sources: the fetch capability trait, the lifecycle wrapper, and the
//! registry of known sources.
//!
//! Each source scrapes one third-party site that republishes course coupon
//! links. The orchestrator never looks inside a source; it only sees the
//! [`LinkSource`] capability and the [`SourceUnit`] lifecycle around it.
//!
//! # Supported sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | IDownloadCoupon | [`idownloadcoupon`] | paginated listing, deeplink-wrapped links |
//! | FreebiesGlobal | [`freebiesglobal`] | paginated listing + offer pages |
//! | Tutorial Bar | [`tutorialbar`] | paginated listing + article pages |
//! | DiscUdemy | [`discudemy`] | paginated listing + go-link pages |
//! | CourseVania | [`coursevania`] | single listing page |

use crate::config::Config;
use crate::error::Result;
use crate::http;
use crate::types::{FailureKind, SourceState, UnitOutcome};
use async_trait::async_trait;
use std::time::Duration;

mod extract;

pub mod coursevania;
pub mod discudemy;
pub mod freebiesglobal;
pub mod idownloadcoupon;
pub mod tutorialbar;

pub use coursevania::CourseVania;
pub use discudemy::DiscUdemy;
pub use freebiesglobal::FreebiesGlobal;
pub use idownloadcoupon::IDownloadCoupon;
pub use tutorialbar::TutorialBar;

/// Capability implemented by every coupon source
///
/// Implementations are site-specific and free to paginate, follow redirects,
/// or call APIs however they need to. The contract with the orchestrator is
/// only this trait: return an ordered list of coupon links, or fail. Failures
/// are absorbed by the surrounding [`SourceUnit`]; implementations should not
/// try to recover from permanent errors themselves.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Short identifier used in logs and metrics
    fn name(&self) -> &'static str;

    /// The site origin this source scrapes
    fn base_url(&self) -> &str;

    /// Configured upper bound on paginated fetch, if any
    fn page_limit(&self) -> Option<u32>;

    /// Fetch coupon links, visiting at most `max_pages` listing pages
    ///
    /// `max_pages` is the effective, already-derived limit for this run; it
    /// may differ from [`page_limit`](Self::page_limit) when fuzz mode clamps
    /// it. `None` means unbounded pagination (stop when a page yields no
    /// links).
    async fn fetch_links(&self, max_pages: Option<u32>) -> Result<Vec<String>>;
}

/// One source plus its lifecycle state
///
/// The unit is the orchestrator's view of a source. Its [`run`](Self::run)
/// method is the failure-absorbing wrapper around the fetch: the state moves
/// to `Running` before the fetch and to `Complete` after it, unconditionally,
/// and no error ever propagates out.
pub struct SourceUnit {
    source: Box<dyn LinkSource>,
    state: SourceState,
}

impl SourceUnit {
    /// Wrap a source, marking it enabled or disabled per configuration
    ///
    /// Enablement is a one-time decision made before a run starts; units are
    /// not toggled mid-run.
    pub fn new(source: Box<dyn LinkSource>, enabled: bool) -> Self {
        Self {
            source,
            state: if enabled {
                SourceState::Enabled
            } else {
                SourceState::Disabled
            },
        }
    }

    /// The wrapped source's identifier
    pub fn name(&self) -> &'static str {
        self.source.name()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// True unless the unit was disabled by configuration
    pub fn is_enabled(&self) -> bool {
        self.state != SourceState::Disabled
    }

    /// The wrapped source's configured page limit
    pub fn page_limit(&self) -> Option<u32> {
        self.source.page_limit()
    }

    /// Execute the wrapped fetch with fail-soft semantics
    ///
    /// The deadline bounds the whole fetch; exceeding it cancels the in-flight
    /// work for this unit only. Both the error and timeout paths log, yield an
    /// empty contribution, and still land the unit in `Complete`.
    pub(crate) async fn run(&mut self, max_pages: Option<u32>, deadline: Duration) -> UnitOutcome {
        self.state = SourceState::Running;
        tracing::debug!(source = self.name(), ?max_pages, "Dispatching source fetch");

        let result = tokio::time::timeout(deadline, self.source.fetch_links(max_pages)).await;

        // Complete exactly once, success or not. The timeout branch runs after
        // the fetch future has been dropped, so the write cannot race with it.
        self.state = SourceState::Complete;

        match result {
            Ok(Ok(links)) => {
                tracing::debug!(source = self.name(), count = links.len(), "Source fetch complete");
                UnitOutcome::Links(links)
            }
            Ok(Err(e)) => {
                tracing::error!(source = self.name(), error = %e, "Source fetch failed");
                UnitOutcome::Failed(FailureKind::Other)
            }
            Err(_) => {
                tracing::error!(
                    source = self.name(),
                    deadline_secs = deadline.as_secs_f64(),
                    "Source fetch exceeded deadline"
                );
                UnitOutcome::Failed(FailureKind::Timeout)
            }
        }
    }
}

impl std::fmt::Debug for SourceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceUnit")
            .field("name", &self.name())
            .field("state", &self.state)
            .finish()
    }
}

/// Registry of source units for one orchestrator instance
///
/// Holds the units in a fixed declaration order; that order seeds
/// reproducibility of fuzz-mode draws even though dispatch itself runs
/// concurrently.
pub struct SourceRegistry {
    units: Vec<SourceUnit>,
}

impl SourceRegistry {
    /// Build a registry from pre-constructed units
    ///
    /// Use this to run custom [`LinkSource`] implementations through the
    /// orchestrator.
    pub fn new(units: Vec<SourceUnit>) -> Self {
        Self { units }
    }

    /// Build the registry of known sources from configuration
    ///
    /// Constructs one unit per known source, enabled per its toggle. If no
    /// toggle is set, every source is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the shared HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http::build_client()?;
        let pages = config.max_pages;
        let retry = config.retry;

        let mut toggles = config.sources;
        if !toggles.any_enabled() {
            tracing::info!("No source explicitly selected; enabling all sources");
            toggles = crate::config::SourceToggles {
                idownloadcoupon: true,
                freebiesglobal: true,
                tutorialbar: true,
                discudemy: true,
                coursevania: true,
            };
        }

        // Declaration order is fixed; enabled_units() preserves it.
        let units = vec![
            SourceUnit::new(
                Box::new(IDownloadCoupon::new(client.clone(), pages, retry)),
                toggles.idownloadcoupon,
            ),
            SourceUnit::new(
                Box::new(FreebiesGlobal::new(client.clone(), pages, retry)),
                toggles.freebiesglobal,
            ),
            SourceUnit::new(
                Box::new(TutorialBar::new(client.clone(), pages, retry)),
                toggles.tutorialbar,
            ),
            SourceUnit::new(
                Box::new(DiscUdemy::new(client.clone(), pages, retry)),
                toggles.discudemy,
            ),
            SourceUnit::new(
                Box::new(CourseVania::new(client, pages, retry)),
                toggles.coursevania,
            ),
        ];

        Ok(Self { units })
    }

    /// Units not disabled by configuration, in declaration order
    pub fn enabled_units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.units.iter().filter(|u| u.is_enabled())
    }

    /// Mutable view of the enabled units, in declaration order
    pub(crate) fn enabled_units_mut(&mut self) -> impl Iterator<Item = &mut SourceUnit> {
        self.units.iter_mut().filter(|u| u.is_enabled())
    }

    /// All units, including disabled ones
    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    /// Number of enabled units
    pub fn enabled_count(&self) -> usize {
        self.enabled_units().count()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("units", &self.units)
            .finish()
    }
}
