//! # Balance Configuration
//!
//! All tunable numbers in one serde-loadable struct. Defaults mirror the
//! live balance sheet; a TOML file can override any subset of sections.
//!
//! Probabilities are expressed in basis points (10000 = 100%) so the whole
//! file stays in integers.

use crate::error::{GameError, GameResult};
use cardkeep_store::Rarity;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One value per rarity tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable<T> {
    /// Value for common cards.
    pub common: T,
    /// Value for rare cards.
    pub rare: T,
    /// Value for epic cards.
    pub epic: T,
    /// Value for legendary cards.
    pub legendary: T,
}

impl<T: Copy> TierTable<T> {
    /// Looks up the value for a tier.
    #[inline]
    #[must_use]
    pub const fn get(&self, tier: Rarity) -> T {
        match tier {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        }
    }
}

/// Raid tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaidConfig {
    /// Chance a boss spawns on a fresh day, in basis points.
    pub active_chance_bp: u32,
    /// Minimum boss hit points.
    pub hp_min: u32,
    /// Maximum boss hit points.
    pub hp_max: u32,
    /// Attack damage per card tier.
    pub tier_damage: TierTable<u32>,
    /// Damage bonus while boosted, in percent.
    pub boost_percent: u32,
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            active_chance_bp: 5_000,
            hp_min: 500,
            hp_max: 1_500,
            tier_damage: TierTable {
                common: 5,
                rare: 12,
                epic: 25,
                legendary: 50,
            },
            boost_percent: 20,
        }
    }
}

/// Duel tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Multiplier on equipped weapon power.
    pub weapon_factor: u32,
    /// Power granted per owned legendary copy.
    pub legendary_bonus_per_card: u32,
    /// Cap on the legendary bonus.
    pub legendary_bonus_cap: u32,
    /// Upper bound of the fresh per-resolution roll (inclusive, from 1).
    pub roll_max: u32,
    /// Payout for the winner.
    pub winner_coins: u64,
    /// Consolation payout for the loser.
    pub loser_coins: u64,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            weapon_factor: 3,
            legendary_bonus_per_card: 2,
            legendary_bonus_cap: 30,
            roll_max: 50,
            winner_coins: 20,
            loser_coins: 5,
        }
    }
}

/// Daily shop tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Base price of the card pack.
    pub pack_price: u64,
    /// Cards per pack.
    pub pack_draws: u32,
    /// Base price of the raid boost.
    pub boost_price: u64,
    /// Raid boost duration in hours.
    pub boost_hours: u64,
    /// Base price of the daily weapon.
    pub weapon_price: u64,
    /// Power pool the daily weapon is drawn from (seeded generator).
    pub weapon_powers: Vec<u32>,
    /// Price multiplier after a boss kill, in basis points.
    pub kill_discount_bp: u64,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            pack_price: 60,
            pack_draws: 3,
            boost_price: 40,
            boost_hours: 12,
            weapon_price: 120,
            weapon_powers: vec![3, 5, 8, 12],
            kill_discount_bp: 8_500,
        }
    }
}

/// Travel tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelConfig {
    /// Shortest allowed trip, hours.
    pub min_hours: u32,
    /// Longest allowed trip, hours.
    pub max_hours: u32,
    /// Minimum coin reward.
    pub coins_min: u64,
    /// Maximum coin reward.
    pub coins_max: u64,
    /// Chance of a raid boost bonus, in basis points.
    pub boost_chance_bp: u32,
    /// Chance of a trophy weapon bonus, in basis points (rolled after the
    /// boost band: the two bands are adjacent, not overlapping).
    pub trophy_chance_bp: u32,
    /// Raid boost duration from a travel bonus, hours.
    pub boost_hours: u64,
    /// Power pool for trophy weapons.
    pub trophy_powers: Vec<u32>,
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            min_hours: 1,
            max_hours: 12,
            coins_min: 20,
            coins_max: 120,
            boost_chance_bp: 1_500,
            trophy_chance_bp: 700,
            boost_hours: 6,
            trophy_powers: vec![3, 5, 8],
        }
    }
}

/// The full balance sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seconds between card draws.
    pub draw_cooldown_secs: u64,
    /// Seconds between raid attacks.
    pub attack_cooldown_secs: u64,
    /// Draw weights per tier. They need not sum to any particular total.
    pub tier_weights: TierTable<u32>,
    /// Merchant sale price per tier.
    pub sell_prices: TierTable<u64>,
    /// Raid tuning.
    pub raid: RaidConfig,
    /// Duel tuning.
    pub duel: DuelConfig,
    /// Shop tuning.
    pub shop: ShopConfig,
    /// Travel tuning.
    pub travel: TravelConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            draw_cooldown_secs: 900,
            attack_cooldown_secs: 20,
            tier_weights: TierTable {
                common: 75,
                rare: 20,
                epic: 4,
                legendary: 1,
            },
            sell_prices: TierTable {
                common: 5,
                rare: 15,
                epic: 40,
                legendary: 120,
            },
            raid: RaidConfig::default(),
            duel: DuelConfig::default(),
            shop: ShopConfig::default(),
            travel: TravelConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parses a TOML balance sheet. Missing sections keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] on syntax or type errors.
    pub fn from_toml_str(raw: &str) -> GameResult<Self> {
        toml::from_str(raw).map_err(|e| GameError::Config(e.to_string()))
    }

    /// Loads a TOML balance sheet from disk.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] when the file is unreadable or invalid.
    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GameError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&raw)
    }
}
