//! # Raid Subsystem
//!
//! One shared boss per UTC day. The day row moves Inactive -> Alive -> Dead;
//! every attack is a read-modify-write of the shared hit-point row inside
//! one ledger transaction, so concurrent attackers can never lose updates
//! and the kill flag flips exactly once.

use crate::cooldown::{self, CooldownKind};
use crate::daily;
use crate::engine::Engine;
use crate::error::{GameError, GameResult};
use cardkeep_store::{CardId, UserId};

/// Raid phase as reported to the chat layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaidStatus {
    /// No boss spawned today.
    Inactive,
    /// Boss up and taking damage.
    Alive {
        /// Remaining hit points.
        hp: u32,
        /// Hit points at spawn.
        hp_max: u32,
    },
    /// Boss killed earlier today.
    Defeated {
        /// Hit points it spawned with.
        hp_max: u32,
    },
}

/// Outcome of one attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackReport {
    /// Damage dealt after boost and weapon bonus.
    pub damage: u32,
    /// Boss hit points after the blow.
    pub hp_left: u32,
    /// True for the killing blow only.
    pub killed: bool,
}

impl Engine {
    /// Reports today's raid phase.
    ///
    /// # Errors
    ///
    /// Only storage failures.
    pub fn raid_status(&self, now: u64) -> GameResult<RaidStatus> {
        let day = self.ensure_day(now)?;
        Ok(if !day.raid_active {
            RaidStatus::Inactive
        } else if day.raid_killed {
            RaidStatus::Defeated {
                hp_max: day.raid_hp_max,
            }
        } else {
            RaidStatus::Alive {
                hp: day.raid_hp,
                hp_max: day.raid_hp_max,
            }
        })
    }

    /// Strikes the boss with one owned card.
    ///
    /// Damage is the card tier's base, times the boost multiplier when a
    /// raid boost is running (truncated), plus half the equipped weapon
    /// power. Preconditions fail before any write: a rejected attack burns
    /// neither cooldown nor boss hit points.
    ///
    /// # Errors
    ///
    /// [`GameError::RaidInactive`], [`GameError::RaidDefeated`],
    /// [`GameError::CooldownActive`], [`GameError::UnknownCard`],
    /// [`GameError::InsufficientCards`], [`GameError::UnknownUser`].
    pub fn attack(&self, user: UserId, card: CardId, now: u64) -> GameResult<AttackReport> {
        // Commit day creation on its own first: a rejected attack must not
        // roll back (and thereby re-randomize) a freshly created day row.
        self.ensure_day(now)?;

        let mut txn = self.ledger().begin();
        let day = {
            let mut rng = self.rng();
            daily::ensure_day_txn(&mut txn, self.config(), &mut rng, now)
        };
        if !day.raid_active {
            return Err(GameError::RaidInactive);
        }
        if day.raid_killed {
            return Err(GameError::RaidDefeated);
        }

        let boosted = txn
            .state()
            .users
            .get(&user)
            .ok_or(GameError::UnknownUser(user))?
            .boost_active(now);

        cooldown::consume(&mut txn, self.config(), CooldownKind::Attack, user, now)?;

        let rarity = txn
            .state()
            .cards
            .get(&card)
            .ok_or(GameError::UnknownCard(card))?
            .rarity;
        let owned = txn.state().owned_count(user, card);
        if owned < 1 {
            return Err(GameError::InsufficientCards {
                card,
                needed: 1,
                owned,
            });
        }

        let mut damage = self.config().raid.tier_damage.get(rarity);
        if boosted {
            damage = damage * (100 + self.config().raid.boost_percent) / 100;
        }
        damage += txn.state().weapon_power(user) / 2;

        let hp_left = day.raid_hp.saturating_sub(damage);
        let killed = hp_left == 0;
        let mut updated = day;
        updated.raid_hp = hp_left;
        updated.raid_killed = killed;
        txn.put_day(updated);
        txn.commit()?;

        if killed {
            tracing::info!(user, damage, "raid: boss down, shop discount unlocked");
        }
        Ok(AttackReport {
            damage,
            hp_left,
            killed,
        })
    }
}
