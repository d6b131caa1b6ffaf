//! # Engine
//!
//! The single point of contact for the dispatch layer. One value of
//! [`Engine`] is shared across request handlers; every operation is
//! synchronous, validates against the live world, then commits one
//! transaction (or fails before any write).
//!
//! The engine owns the *fairness* generator - unseeded, used for draws,
//! damage rolls and travel rewards. The *daily* generator is not held here:
//! it is reconstructed from the stored shop seed wherever day-stable output
//! is required (see [`crate::shop`]).

use crate::config::GameConfig;
use cardkeep_store::Ledger;
use parking_lot::{Mutex, MutexGuard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// The game state engine.
///
/// Cheap to share via [`Arc`]; all interior state is lock-protected.
pub struct Engine {
    ledger: Arc<Ledger>,
    config: GameConfig,
    /// Unseeded fairness generator. Lock order: ledger write lock first,
    /// then this - every operation follows it, so no deadlocks.
    rng: Mutex<StdRng>,
}

impl Engine {
    /// Creates an engine over a ledger with entropy-seeded fairness RNG.
    #[must_use]
    pub fn new(ledger: Arc<Ledger>, config: GameConfig) -> Self {
        Self {
            ledger,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates an engine with a deterministic fairness generator.
    ///
    /// For tests and simulations only - live draws must not be predictable.
    #[must_use]
    pub fn with_rng_seed(ledger: Arc<Ledger>, config: GameConfig, seed: u64) -> Self {
        Self {
            ledger,
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// The balance sheet this engine runs on.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The underlying ledger.
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Locks the fairness generator.
    pub(crate) fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock()
    }
}
