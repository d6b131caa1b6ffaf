//! # Travel Subsystem
//!
//! A per-user timed deferred-reward window. Starting is rejected while an
//! unclaimed, unexpired window exists; claiming is one-shot and pays coins
//! plus an occasional extra: a short raid boost or a unique trophy weapon.

use crate::engine::Engine;
use crate::error::{GameError, GameResult};
use cardkeep_store::{DayKey, InventoryItem, ItemKind, Travel, UserId};
use rand::Rng;

/// Extra reward band rolled after the coin payout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TravelBonus {
    /// Nothing beyond the coins.
    Nothing,
    /// A raid boost, overwriting any current one.
    RaidBoost {
        /// New boost expiry.
        until: u64,
    },
    /// A freshly minted trophy weapon.
    Trophy(InventoryItem),
}

/// Result of a successful claim.
#[derive(Clone, Debug)]
pub struct TravelReward {
    /// Coins credited.
    pub coins: u64,
    /// Extra reward, if the roll hit a band.
    pub bonus: TravelBonus,
}

impl Engine {
    /// Sends the user traveling for `hours`.
    ///
    /// Overwrites a previous window only once it is claimed or expired.
    ///
    /// # Errors
    ///
    /// [`GameError::HoursOutOfRange`], [`GameError::UnknownUser`],
    /// [`GameError::TravelRunning`].
    pub fn start_travel(&self, user: UserId, hours: u32, now: u64) -> GameResult<Travel> {
        let (min, max) = (self.config().travel.min_hours, self.config().travel.max_hours);
        if !(min..=max).contains(&hours) {
            return Err(GameError::HoursOutOfRange { hours, min, max });
        }

        let mut txn = self.ledger().begin();
        if !txn.state().users.contains_key(&user) {
            return Err(GameError::UnknownUser(user));
        }
        if let Some(current) = txn.state().travels.get(&user) {
            if !current.claimed && !current.finished(now) {
                return Err(GameError::TravelRunning {
                    remaining: current.remaining(now),
                });
            }
        }

        let travel = Travel {
            started_at: now,
            ends_at: now + u64::from(hours) * 3_600,
            claimed: false,
        };
        txn.put_travel(user, travel);
        txn.commit()?;

        tracing::debug!(user, hours, "travel: departed");
        Ok(travel)
    }

    /// Claims a finished travel window. One-shot until the next start.
    ///
    /// Coins are unconditional; the extra roll lands in the boost band, the
    /// trophy band, or nothing. Two concurrent claims serialize on the
    /// ledger lock and the second sees `claimed` already set.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownUser`], [`GameError::NoTravel`],
    /// [`GameError::TravelClaimed`], [`GameError::TravelNotFinished`].
    pub fn claim_travel(&self, user: UserId, now: u64) -> GameResult<TravelReward> {
        let mut txn = self.ledger().begin();

        let mut row = txn
            .state()
            .users
            .get(&user)
            .cloned()
            .ok_or(GameError::UnknownUser(user))?;
        let mut travel = *txn
            .state()
            .travels
            .get(&user)
            .ok_or(GameError::NoTravel)?;
        if travel.claimed {
            return Err(GameError::TravelClaimed);
        }
        if !travel.finished(now) {
            return Err(GameError::TravelNotFinished {
                remaining: travel.remaining(now),
            });
        }

        let travel_cfg = &self.config().travel;
        let mut rng = self.rng();
        let coins = rng.gen_range(travel_cfg.coins_min..=travel_cfg.coins_max);
        row.wallet += coins;

        let band = rng.gen_range(0..10_000_u32);
        let bonus = if band < travel_cfg.boost_chance_bp {
            let until = now + travel_cfg.boost_hours * 3_600;
            row.raid_boost_until = until;
            TravelBonus::RaidBoost { until }
        } else if band < travel_cfg.boost_chance_bp + travel_cfg.trophy_chance_bp
            && !travel_cfg.trophy_powers.is_empty()
        {
            let power = travel_cfg.trophy_powers[rng.gen_range(0..travel_cfg.trophy_powers.len())];
            let day = DayKey::from_epoch(now);
            let mut key = format!("trophy_{day}_{power}_{:04}", rng.gen_range(0..10_000));
            while txn.state().item(user, &key).is_some() {
                key = format!("trophy_{day}_{power}_{:04}", rng.gen_range(0..10_000));
            }
            let item = InventoryItem {
                key,
                kind: ItemKind::Weapon,
                name: format!("Trophy blade +{power}"),
                power,
                quantity: 1,
            };
            txn.put_item(user, item.clone());
            TravelBonus::Trophy(item)
        } else {
            TravelBonus::Nothing
        };
        drop(rng);

        travel.claimed = true;
        txn.put_travel(user, travel);
        txn.put_user(row);
        txn.commit()?;

        tracing::info!(user, coins, "travel: claimed");
        Ok(TravelReward { coins, bonus })
    }
}
