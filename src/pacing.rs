//! Randomized inter-message pacing.
//!
//! A [`Pacer`] draws a fresh uniform delay from `[0, max]` seconds before
//! every cycle. The random source is injectable so tests can drive it with
//! a seeded generator.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::config::PacingConfig;

// ============================================================================
// Pacer
// ============================================================================

/// Produces the randomized delay applied between successive messages.
pub struct Pacer {
    /// Inclusive upper bound in whole seconds.
    max_delay_secs: u64,
    /// Random source; entropy-seeded unless injected.
    rng: Box<dyn RngCore + Send>,
}

impl Pacer {
    /// Creates a pacer with an entropy-seeded random source.
    #[must_use]
    pub fn new(config: PacingConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Creates a pacer with an injected random source.
    #[must_use]
    pub fn with_rng(config: PacingConfig, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            max_delay_secs: config.max_delay_secs(),
            rng: Box::new(rng),
        }
    }

    /// Creates a pacer with a deterministic, seed-derived random source.
    #[must_use]
    pub fn seeded(config: PacingConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Returns the inclusive upper bound in seconds.
    #[inline]
    #[must_use]
    pub const fn max_delay_secs(&self) -> u64 {
        self.max_delay_secs
    }

    /// Draws the next delay, uniform over `[0, max]` whole seconds.
    pub fn next_delay(&mut self) -> Duration {
        Duration::from_secs(self.rng.gen_range(0..=self.max_delay_secs))
    }
}

impl fmt::Debug for Pacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pacer")
            .field("max_delay_secs", &self.max_delay_secs)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
