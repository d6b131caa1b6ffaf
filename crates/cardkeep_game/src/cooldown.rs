//! # Cooldown Gate
//!
//! Per-user minimum-interval enforcement. Two independent gates exist: card
//! draws and raid attacks. The gate mutates the stamp inside the caller's
//! transaction, so an operation that fails later rolls the stamp back too -
//! a rejected attack never burns the attack cooldown.

use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use cardkeep_store::{Txn, UserId};
use std::fmt;

/// A rate-limited action kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownKind {
    /// Card draw gate.
    Draw,
    /// Raid attack gate.
    Attack,
}

impl fmt::Display for CooldownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draw => "draw",
            Self::Attack => "attack",
        };
        f.write_str(label)
    }
}

/// Checks the gate and, if it passes, stamps `now`.
///
/// A zero stamp means the action was never used and always passes. On
/// failure nothing is written and the remaining wait is reported.
pub(crate) fn consume(
    txn: &mut Txn<'_>,
    config: &GameConfig,
    kind: CooldownKind,
    user: UserId,
    now: u64,
) -> GameResult<()> {
    let mut cooldown = txn.state().cooldowns.get(&user).copied().unwrap_or_default();

    let (last, interval) = match kind {
        CooldownKind::Draw => (cooldown.last_draw, config.draw_cooldown_secs),
        CooldownKind::Attack => (cooldown.last_attack, config.attack_cooldown_secs),
    };

    if last != 0 {
        let elapsed = now.saturating_sub(last);
        if elapsed < interval {
            return Err(GameError::CooldownActive {
                kind,
                remaining: interval - elapsed,
            });
        }
    }

    match kind {
        CooldownKind::Draw => cooldown.last_draw = now,
        CooldownKind::Attack => cooldown.last_attack = now,
    }
    txn.put_cooldown(user, cooldown);
    Ok(())
}
