//! The scraping orchestrator: bounded fan-out/fan-in over the enabled sources.
//!
//! One [`CouponScout`] owns a source registry, an admission gate, and (in fuzz
//! mode) a perturbation generator. A call to [`run`](CouponScout::run)
//! dispatches every enabled source concurrently, absorbs per-source failures,
//! aggregates the surviving link lists, and records a [`RunMetrics`] summary.

use crate::config::{Config, MAX_CONCURRENCY_CEILING};
use crate::error::Result;
use crate::sources::SourceRegistry;
use crate::types::{FailureKind, RunMetrics, UnitOutcome};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

mod fuzz;

use fuzz::Perturbation;


/// Concurrent multi-source coupon scraper
///
/// # Example
///
/// ```no_run
/// use coupon_scout::{Config, CouponScout};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut scout = CouponScout::new(Config::default())?;
///     let links = scout.run().await?;
///     println!("found {} coupon links", links.len());
///     Ok(())
/// }
/// ```
pub struct CouponScout {
    config: Config,
    registry: SourceRegistry,
    /// Admission gate bounding units inside the fetch critical section
    gate: Arc<Semaphore>,
    effective_concurrency: usize,
    perturbation: Perturbation,
    last_metrics: Option<RunMetrics>,
}

impl CouponScout {
    /// Create an orchestrator over the known sources
    ///
    /// # Errors
    ///
    /// Returns an error if the shared HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let registry = SourceRegistry::from_config(&config)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create an orchestrator over a caller-supplied registry
    ///
    /// Lets consumers run their own [`LinkSource`](crate::LinkSource)
    /// implementations through the same dispatch, timeout, and aggregation
    /// machinery.
    pub fn with_registry(config: Config, registry: SourceRegistry) -> Self {
        let effective_concurrency = clamp_concurrency(config.max_concurrency);
        let perturbation = Perturbation::new(config.fuzz.seed);
        Self {
            gate: Arc::new(Semaphore::new(effective_concurrency)),
            effective_concurrency,
            perturbation,
            config,
            registry,
            last_metrics: None,
        }
    }

    /// The admission limit after clamping to `1..=`[`MAX_CONCURRENCY_CEILING`]
    pub fn effective_concurrency(&self) -> usize {
        self.effective_concurrency
    }

    /// The registry of source units this orchestrator dispatches
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Metrics from the most recent completed run, if any
    pub fn last_metrics(&self) -> Option<RunMetrics> {
        self.last_metrics
    }

    /// Run every enabled source and aggregate their coupon links
    ///
    /// Per-source failures and timeouts are absorbed: a failing source
    /// contributes an empty list, and a run where every source fails still
    /// returns `Ok` with an empty aggregate. Callers should consult
    /// [`last_metrics`](Self::last_metrics) to tell an empty catalog from a
    /// total failure.
    ///
    /// Outcomes are aggregated in unit dispatch order, not completion order,
    /// so the result of a seeded fuzz run does not depend on fetch latency.
    /// The aggregate may contain duplicate links across sources; deduplication
    /// is the downstream consumer's decision.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// fails validation. This is checked before any source is dispatched and
    /// is the only way `run` can fail.
    pub async fn run(&mut self) -> Result<Vec<String>> {
        self.config.validate()?;
        let started = Instant::now();

        let fuzz_enabled = self.config.fuzz.enabled;
        let global_pages = self.config.max_pages;
        let deadline = self.config.task_timeout;

        // Derive each unit's dispatch plan up front, in declaration order, so
        // seeded jitter draws do not depend on task scheduling.
        let mut plans: Vec<(Duration, Option<u32>)> = Vec::new();
        for unit in self.registry.enabled_units() {
            let plan = if fuzz_enabled {
                (
                    self.perturbation.jitter(),
                    Perturbation::clamp_pages(global_pages, unit.page_limit()),
                )
            } else {
                (Duration::ZERO, unit.page_limit())
            };
            plans.push(plan);
        }

        let attempted = plans.len();
        tracing::debug!(
            units = attempted,
            concurrency = self.effective_concurrency,
            fuzz = fuzz_enabled,
            "Dispatching scrape run"
        );

        let gate = Arc::clone(&self.gate);
        let outcomes: Vec<UnitOutcome> = stream::iter(self.registry.enabled_units_mut().zip(plans))
            .map(|(unit, (jitter, pages))| {
                let gate = Arc::clone(&gate);
                async move {
                    if !jitter.is_zero() {
                        tokio::time::sleep(jitter).await;
                    }
                    // The gate is held around the fetch only; jitter and
                    // outcome handling happen outside the critical section.
                    match gate.acquire().await {
                        Ok(_permit) => unit.run(pages, deadline).await,
                        Err(_) => {
                            tracing::error!(source = unit.name(), "Admission gate closed");
                            UnitOutcome::Failed(FailureKind::Other)
                        }
                    }
                }
            })
            // buffered (not buffer_unordered) keeps outcomes in dispatch
            // order; the gate alone bounds fetch concurrency.
            .buffered(attempted.max(1))
            .collect()
            .await;

        let mut metrics = RunMetrics::default();
        let mut links = Vec::new();
        for outcome in outcomes {
            metrics.record(&outcome);
            links.extend(outcome.into_links());
        }

        if fuzz_enabled && !links.is_empty() {
            self.perturbation.shuffle(&mut links);
        }

        metrics.links = links.len();
        metrics.duration = started.elapsed();

        tracing::info!(
            total = metrics.attempted,
            success = metrics.succeeded,
            error = metrics.failed,
            timeout = metrics.timed_out,
            duration_ms = metrics.duration.as_millis() as u64,
            links = metrics.links,
            "Scrape run complete"
        );

        self.last_metrics = Some(metrics);
        Ok(links)
    }
}

/// Clamp the requested admission limit to `1..=`[`MAX_CONCURRENCY_CEILING`]
///
/// Over-the-ceiling requests are not an error; they are clamped with a
/// warning so a misconfigured deployment cannot hammer the scraped sites.
fn clamp_concurrency(requested: usize) -> usize {
    if requested > MAX_CONCURRENCY_CEILING {
        tracing::warn!(
            requested,
            ceiling = MAX_CONCURRENCY_CEILING,
            "max_concurrency exceeds hard ceiling; clamping"
        );
    }
    requested.clamp(1, MAX_CONCURRENCY_CEILING)
}
