//! # Daily Cycle Manager
//!
//! Per-UTC-day world rows, created lazily and exactly once. There is no
//! scheduler: whoever touches the world first after midnight rolls the new
//! day inside their own transaction. The double-check under the writer lock
//! is what makes concurrent first access safe - only one creator can win,
//! everyone else reads the row it wrote.

use crate::config::GameConfig;
use crate::engine::Engine;
use crate::error::GameResult;
use cardkeep_store::{DailyState, DayKey, Txn};
use rand::rngs::StdRng;
use rand::Rng;

/// Upper bound (inclusive) of the stored shop seed.
const SHOP_SEED_MAX: u64 = 1_000_000_000;

/// Returns today's row, creating it if this transaction is first.
///
/// Random fields are drawn from the fairness generator once, at creation;
/// every later call the same day sees identical values.
pub(crate) fn ensure_day_txn(
    txn: &mut Txn<'_>,
    config: &GameConfig,
    rng: &mut StdRng,
    now: u64,
) -> DailyState {
    let key = DayKey::from_epoch(now);
    if let Some(day) = txn.state().days.get(&key) {
        return day.clone();
    }

    let raid_active = rng.gen_range(0..10_000) < config.raid.active_chance_bp;
    let raid_hp_max = rng.gen_range(config.raid.hp_min..=config.raid.hp_max);
    let day = DailyState {
        day: key,
        raid_active,
        raid_hp: if raid_active { raid_hp_max } else { 0 },
        raid_hp_max,
        raid_killed: false,
        shop_seed: rng.gen_range(1..=SHOP_SEED_MAX),
    };
    tracing::info!(
        day = %day.day,
        raid_active,
        raid_hp_max,
        "daily: new world row"
    );
    txn.put_day(day.clone());
    day
}

impl Engine {
    /// Atomically gets or creates today's world row.
    ///
    /// # Errors
    ///
    /// Only storage failures; creation itself cannot fail.
    pub fn ensure_day(&self, now: u64) -> GameResult<DailyState> {
        let key = DayKey::from_epoch(now);
        if let Some(day) = self.ledger().view(|w| w.days.get(&key).cloned()) {
            return Ok(day);
        }

        let mut txn = self.ledger().begin();
        let day = {
            let mut rng = self.rng();
            ensure_day_txn(&mut txn, self.config(), &mut rng, now)
        };
        txn.commit()?;
        Ok(day)
    }

    /// Reads today's world row, creating it first if needed.
    ///
    /// # Errors
    ///
    /// Only storage failures.
    pub fn day_state(&self, now: u64) -> GameResult<DailyState> {
        self.ensure_day(now)
    }
}
