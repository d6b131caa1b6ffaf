//! # Duel Subsystem
//!
//! Two-party challenge/accept/decline. A duel record is Pending until the
//! addressee answers; both answers are terminal and there is no expiry.
//! Power is rolled fresh at resolution - challenging early buys nothing.

use crate::config::GameConfig;
use crate::engine::Engine;
use crate::error::{GameError, GameResult};
use crate::users;
use cardkeep_store::{Duel, DuelId, DuelStatus, Rarity, UserId, WorldState};
use rand::Rng;

/// Who took the pot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuelVerdict {
    /// Strictly higher power wins.
    Winner {
        /// The higher roll.
        winner: UserId,
        /// The lower roll.
        loser: UserId,
    },
    /// Equal power: no payout either way.
    Draw,
}

/// Resolution report returned to the chat layer.
#[derive(Clone, Debug)]
pub struct DuelReport {
    /// The resolved record (status `Accepted`).
    pub duel: Duel,
    /// Challenger's power at resolution.
    pub challenger_power: u32,
    /// Opponent's power at resolution.
    pub opponent_power: u32,
    /// Outcome.
    pub verdict: DuelVerdict,
}

/// Computes a user's duel power for one fresh roll.
///
/// `weapon_factor x` equipped weapon power, plus a capped bonus for owned
/// legendary copies, plus the roll.
pub(crate) fn duel_power(world: &WorldState, config: &GameConfig, user: UserId, roll: u32) -> u32 {
    let weapon = config.duel.weapon_factor * world.weapon_power(user);
    let legendary_bonus = config
        .duel
        .legendary_bonus_cap
        .min(config.duel.legendary_bonus_per_card * world.owned_count_of_rarity(user, Rarity::Legendary));
    weapon + legendary_bonus + roll
}

/// Pure resolution: strictly higher power wins, equal is a draw.
pub(crate) fn verdict(
    challenger: UserId,
    opponent: UserId,
    challenger_power: u32,
    opponent_power: u32,
) -> DuelVerdict {
    match challenger_power.cmp(&opponent_power) {
        std::cmp::Ordering::Greater => DuelVerdict::Winner {
            winner: challenger,
            loser: opponent,
        },
        std::cmp::Ordering::Less => DuelVerdict::Winner {
            winner: opponent,
            loser: challenger,
        },
        std::cmp::Ordering::Equal => DuelVerdict::Draw,
    }
}

impl Engine {
    /// Creates a pending duel against a resolvable target.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownUser`] for the challenger,
    /// [`GameError::MalformedTarget`] / [`GameError::UnknownTarget`] for the
    /// reference, [`GameError::SelfTarget`] for mirror matches.
    pub fn challenge_duel(
        &self,
        challenger: UserId,
        target_ref: &str,
        now: u64,
    ) -> GameResult<Duel> {
        let mut txn = self.ledger().begin();

        if !txn.state().users.contains_key(&challenger) {
            return Err(GameError::UnknownUser(challenger));
        }
        let opponent = users::resolve_in(txn.state(), target_ref)?;
        if opponent == challenger {
            return Err(GameError::SelfTarget);
        }

        let duel = Duel {
            id: txn.alloc_duel_id(),
            challenger,
            opponent,
            status: DuelStatus::Pending,
            created_at: now,
        };
        txn.put_duel(duel.clone());
        txn.commit()?;

        tracing::debug!(duel = duel.id, challenger, opponent, "duel: challenge");
        Ok(duel)
    }

    /// Accepts a pending duel and resolves it immediately.
    ///
    /// Powers are rolled fresh here, not cached from challenge time. The
    /// record turns `Accepted` even on a draw; payouts land only on a win.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownDuel`], [`GameError::NotYourDuel`],
    /// [`GameError::DuelClosed`].
    pub fn accept_duel(&self, duel_id: DuelId, responder: UserId) -> GameResult<DuelReport> {
        let mut txn = self.ledger().begin();

        let mut duel = txn
            .state()
            .duels
            .get(&duel_id)
            .cloned()
            .ok_or(GameError::UnknownDuel(duel_id))?;
        if duel.opponent != responder {
            return Err(GameError::NotYourDuel { duel: duel_id });
        }
        if duel.status != DuelStatus::Pending {
            return Err(GameError::DuelClosed {
                status: duel.status,
            });
        }

        let (challenger_roll, opponent_roll) = {
            let mut rng = self.rng();
            let max = self.config().duel.roll_max;
            (rng.gen_range(1..=max), rng.gen_range(1..=max))
        };
        let challenger_power =
            duel_power(txn.state(), self.config(), duel.challenger, challenger_roll);
        let opponent_power = duel_power(txn.state(), self.config(), duel.opponent, opponent_roll);

        duel.status = DuelStatus::Accepted;
        txn.put_duel(duel.clone());

        let verdict = verdict(
            duel.challenger,
            duel.opponent,
            challenger_power,
            opponent_power,
        );
        if let DuelVerdict::Winner { winner, loser } = verdict {
            let mut winner_row = txn.state().users[&winner].clone();
            winner_row.wallet += self.config().duel.winner_coins;
            txn.put_user(winner_row);
            let mut loser_row = txn.state().users[&loser].clone();
            loser_row.wallet += self.config().duel.loser_coins;
            txn.put_user(loser_row);
        }
        txn.commit()?;

        tracing::info!(
            duel = duel_id,
            challenger_power,
            opponent_power,
            "duel: resolved"
        );
        Ok(DuelReport {
            duel,
            challenger_power,
            opponent_power,
            verdict,
        })
    }

    /// Declines a pending duel. No side effects beyond the status flip.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownDuel`], [`GameError::NotYourDuel`],
    /// [`GameError::DuelClosed`].
    pub fn decline_duel(&self, duel_id: DuelId, responder: UserId) -> GameResult<Duel> {
        let mut txn = self.ledger().begin();

        let mut duel = txn
            .state()
            .duels
            .get(&duel_id)
            .cloned()
            .ok_or(GameError::UnknownDuel(duel_id))?;
        if duel.opponent != responder {
            return Err(GameError::NotYourDuel { duel: duel_id });
        }
        if duel.status != DuelStatus::Pending {
            return Err(GameError::DuelClosed {
                status: duel.status,
            });
        }

        duel.status = DuelStatus::Declined;
        txn.put_duel(duel.clone());
        txn.commit()?;
        Ok(duel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use cardkeep_store::{InventoryItem, ItemKind, Ledger};
    use std::sync::Arc;

    fn test_engine() -> Engine {
        Engine::with_rng_seed(Arc::new(Ledger::ephemeral()), GameConfig::default(), 11)
    }

    fn two_users(engine: &Engine) {
        engine
            .register_or_touch_user(1, "Ann", Some("ann"), 0)
            .unwrap();
        engine.register_or_touch_user(2, "Bob", None, 0).unwrap();
    }

    fn arm(engine: &Engine, user: UserId, power: u32) {
        let mut txn = engine.ledger().begin();
        let mut row = txn.state().users[&user].clone();
        row.equipped_weapon = Some("w".to_string());
        txn.put_user(row);
        txn.put_item(
            user,
            InventoryItem {
                key: "w".to_string(),
                kind: ItemKind::Weapon,
                name: "Blade".to_string(),
                power,
                quantity: 1,
            },
        );
        txn.commit().unwrap();
    }

    #[test]
    fn test_verdict_is_pure_and_symmetric() {
        assert_eq!(
            verdict(1, 2, 100, 50),
            DuelVerdict::Winner {
                winner: 1,
                loser: 2
            }
        );
        assert_eq!(
            verdict(1, 2, 50, 100),
            DuelVerdict::Winner {
                winner: 2,
                loser: 1
            }
        );
        assert_eq!(verdict(1, 2, 70, 70), DuelVerdict::Draw);
    }

    #[test]
    fn test_power_formula() {
        let engine = test_engine();
        two_users(&engine);
        arm(&engine, 1, 8);

        let legendary = engine.add_card("Wyrm", Rarity::Legendary, "", "").unwrap();
        {
            let mut txn = engine.ledger().begin();
            // 20 copies: the 2-per-copy bonus caps at 30.
            txn.set_owned(1, legendary.id, 20);
            txn.commit().unwrap();
        }

        let (p_armed, p_bare) = engine.ledger().view(|w| {
            (
                duel_power(w, engine.config(), 1, 10),
                duel_power(w, engine.config(), 2, 10),
            )
        });
        assert_eq!(p_armed, 3 * 8 + 30 + 10);
        assert_eq!(p_bare, 10);
    }

    #[test]
    fn test_challenge_validations() {
        let engine = test_engine();
        two_users(&engine);

        assert!(matches!(
            engine.challenge_duel(1, "@nobody", 5),
            Err(GameError::UnknownTarget(_))
        ));
        assert!(matches!(
            engine.challenge_duel(1, "1", 5),
            Err(GameError::SelfTarget)
        ));
        assert!(matches!(
            engine.challenge_duel(9, "2", 5),
            Err(GameError::UnknownUser(9))
        ));

        let duel = engine.challenge_duel(1, "@ann", 5).err();
        assert!(duel.is_some(), "self-challenge via handle must fail");

        let duel = engine.challenge_duel(1, "2", 5).unwrap();
        assert_eq!(duel.status, DuelStatus::Pending);
        assert_eq!(duel.opponent, 2);
    }

    #[test]
    fn test_accept_pays_winner_and_loser() {
        let engine = test_engine();
        two_users(&engine);
        // Weapon power 40 makes the challenger's floor (121) beat the bare
        // opponent's ceiling (30 cap + 50 roll), whatever the rolls.
        arm(&engine, 1, 40);

        let duel = engine.challenge_duel(1, "2", 5).unwrap();
        let report = engine.accept_duel(duel.id, 2).unwrap();

        assert_eq!(
            report.verdict,
            DuelVerdict::Winner {
                winner: 1,
                loser: 2
            }
        );
        assert!(report.challenger_power > report.opponent_power);
        assert_eq!(report.duel.status, DuelStatus::Accepted);
        assert_eq!(engine.ledger().view(|w| w.users[&1].wallet), 20);
        assert_eq!(engine.ledger().view(|w| w.users[&2].wallet), 5);
    }

    #[test]
    fn test_accept_guards_addressee_and_status() {
        let engine = test_engine();
        two_users(&engine);
        let duel = engine.challenge_duel(1, "2", 5).unwrap();

        // The challenger cannot answer their own challenge.
        assert!(matches!(
            engine.accept_duel(duel.id, 1),
            Err(GameError::NotYourDuel { .. })
        ));
        assert!(matches!(
            engine.accept_duel(duel.id + 7, 2),
            Err(GameError::UnknownDuel(_))
        ));

        engine.accept_duel(duel.id, 2).unwrap();
        // Terminal: a second answer bounces.
        assert!(matches!(
            engine.accept_duel(duel.id, 2),
            Err(GameError::DuelClosed {
                status: DuelStatus::Accepted
            })
        ));
    }

    #[test]
    fn test_decline_has_no_payout() {
        let engine = test_engine();
        two_users(&engine);
        let duel = engine.challenge_duel(1, "2", 5).unwrap();

        let declined = engine.decline_duel(duel.id, 2).unwrap();
        assert_eq!(declined.status, DuelStatus::Declined);
        assert_eq!(engine.ledger().view(|w| w.users[&1].wallet), 0);
        assert_eq!(engine.ledger().view(|w| w.users[&2].wallet), 0);

        assert!(matches!(
            engine.accept_duel(duel.id, 2),
            Err(GameError::DuelClosed {
                status: DuelStatus::Declined
            })
        ));
    }
}
