//! Seeded perturbation layer for fuzz mode
//!
//! Owns the generator used for dispatch jitter and the final aggregate
//! shuffle. The generator is always an explicit instance owned by one
//! orchestrator, never a process-wide one, so concurrent orchestrators stay
//! isolated and seeded runs are reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Upper bound (exclusive) on the per-unit dispatch jitter.
///
/// Large enough to spread dispatch timing and surface ordering races in
/// consumers, small enough not to materially slow a run.
const MAX_JITTER: Duration = Duration::from_millis(250);

/// Perturbation state for one orchestrator instance
pub(crate) struct Perturbation {
    rng: StdRng,
}

impl Perturbation {
    /// Build the generator, seeded from configuration or from entropy
    ///
    /// An entropy-seeded generator makes fuzz runs non-reproducible; callers
    /// wanting reproducibility must configure a seed.
    pub(crate) fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Draw a dispatch jitter in `[0, 0.25)` seconds
    pub(crate) fn jitter(&mut self) -> Duration {
        Duration::from_secs_f64(self.rng.gen_range(0.0..MAX_JITTER.as_secs_f64()))
    }

    /// Effective page limit for one unit under perturbation
    ///
    /// Never exceeds the global limit and never drops below one page, so
    /// perturbation cannot make a unit fetch more than the configuration
    /// allows. Returns a derived value; the unit's own limit is not touched.
    pub(crate) fn clamp_pages(global: Option<u32>, unit: Option<u32>) -> Option<u32> {
        match global {
            Some(global) => Some(global.min(unit.unwrap_or(global)).max(1)),
            None => unit,
        }
    }

    /// Shuffle the aggregate in place with the owned generator
    pub(crate) fn shuffle(&mut self, links: &mut [String]) {
        links.shuffle(&mut self.rng);
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_draws_are_reproducible() {
        let mut a = Perturbation::new(Some(42));
        let mut b = Perturbation::new(Some(42));

        let draws_a: Vec<_> = (0..8).map(|_| a.jitter()).collect();
        let draws_b: Vec<_> = (0..8).map(|_| b.jitter()).collect();
        assert_eq!(draws_a, draws_b);

        let mut links_a: Vec<String> = (0..20).map(|i| format!("link-{i}")).collect();
        let mut links_b = links_a.clone();
        a.shuffle(&mut links_a);
        b.shuffle(&mut links_b);
        assert_eq!(links_a, links_b);
    }

    #[test]
    fn jitter_stays_under_the_cap() {
        let mut p = Perturbation::new(Some(7));
        for _ in 0..100 {
            assert!(p.jitter() < MAX_JITTER);
        }
    }

    #[test]
    fn clamp_never_exceeds_global_and_never_hits_zero() {
        assert_eq!(Perturbation::clamp_pages(Some(10), Some(50)), Some(10));
        assert_eq!(Perturbation::clamp_pages(Some(10), Some(3)), Some(3));
        assert_eq!(Perturbation::clamp_pages(Some(10), None), Some(10));
        assert_eq!(Perturbation::clamp_pages(Some(1), Some(0)), Some(1));
        assert_eq!(Perturbation::clamp_pages(None, Some(5)), Some(5));
        assert_eq!(Perturbation::clamp_pages(None, None), None);
    }
}
