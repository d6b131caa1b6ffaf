//! # Entity Model
//!
//! Every durable row the game engine reads or writes. All values that touch
//! money or ownership are non-negative integers; timestamps are integer
//! seconds since the Unix epoch; the calendar day is a UTC date key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a player.
pub type UserId = u64;

/// Unique identifier for a catalog card.
pub type CardId = u32;

/// Unique identifier for a duel.
pub type DuelId = u64;

/// Identifier for an inventory item. Shop weapons encode day and power
/// (stable across calls); trophy weapons carry a fresh nonce.
pub type ItemKey = String;

/// A UTC calendar-date key in `YYYY-MM-DD` form.
///
/// All per-day world state (raid, shop seed) hangs off this key. Rollover is
/// lazy: whoever touches the world first on a new day creates the new row.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayKey(String);

impl DayKey {
    /// Derives the UTC day key for an epoch-seconds timestamp.
    #[must_use]
    pub fn from_epoch(ts: u64) -> Self {
        let ts = i64::try_from(ts).unwrap_or(i64::MAX);
        let dt = chrono::DateTime::from_timestamp(ts, 0)
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC);
        Self(dt.format("%Y-%m-%d").to_string())
    }

    /// Returns the key as a `YYYY-MM-DD` string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rarity tier of a catalog card.
///
/// Ordered: draw odds fall and combat value rises from `Common` to
/// `Legendary`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    /// Baseline tier, the bulk of every collection.
    Common,
    /// Uncommon pulls.
    Rare,
    /// Strong raid cards.
    Epic,
    /// Top tier; feeds duel power and the ten-for-one exchange.
    Legendary,
}

impl Rarity {
    /// All tiers in draw-weight order.
    pub const ALL: [Self; 4] = [Self::Common, Self::Rare, Self::Epic, Self::Legendary];

    /// Dense index for per-tier tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A player's chosen character path.
///
/// Purely cosmetic today, but choosing one is the entry gate for drawing
/// cards, so it lives on the durable user row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathChoice {
    /// Front-line bravado.
    Vanguard,
    /// Book-smart caution.
    Mystic,
    /// Neither, both, whatever.
    Drifter,
}

impl fmt::Display for PathChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Vanguard => "vanguard",
            Self::Mystic => "mystic",
            Self::Drifter => "drifter",
        };
        f.write_str(label)
    }
}

/// A registered player.
///
/// Created on first interaction, mutated by almost every subsystem, never
/// deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque caller-assigned identifier.
    pub id: UserId,
    /// Last-seen display name.
    pub display_name: String,
    /// Optional unique-ish handle, resolvable as an `@handle` target ref.
    pub handle: Option<String>,
    /// Coin balance. Never negative.
    pub wallet: u64,
    /// Chosen character path, if any.
    pub path: Option<PathChoice>,
    /// Key of the equipped weapon in this user's inventory.
    pub equipped_weapon: Option<ItemKey>,
    /// Raid damage boost expiry (epoch seconds, 0 = no boost).
    pub raid_boost_until: u64,
    /// Last interaction timestamp.
    pub last_seen: u64,
}

impl User {
    /// True while a raid damage boost is active.
    #[inline]
    #[must_use]
    pub fn boost_active(&self, now: u64) -> bool {
        self.raid_boost_until > now
    }
}

/// A catalog card definition. Authored by the admin collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Catalog identifier.
    pub id: CardId,
    /// Display name.
    pub name: String,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Stored intra-tier weight. Selection within a tier is uniform; the
    /// column is kept for catalog compatibility and never consulted.
    pub weight: u32,
    /// Opaque reference to the card artwork.
    pub image_ref: String,
    /// Flavor text.
    pub description: String,
}

/// Per-user cooldown stamps. Zero means the action has never been used and
/// always passes the gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cooldown {
    /// Last successful card draw.
    pub last_draw: u64,
    /// Last successful raid attack.
    pub last_attack: u64,
}

/// Shared per-day world row.
///
/// `raid_active`, `raid_hp_max` and `shop_seed` are write-once at creation;
/// only `raid_hp` and `raid_killed` mutate afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyState {
    /// UTC day this row belongs to.
    pub day: DayKey,
    /// Whether a raid boss spawned today.
    pub raid_active: bool,
    /// Remaining boss hit points.
    pub raid_hp: u32,
    /// Boss hit points at spawn.
    pub raid_hp_max: u32,
    /// Set exactly once, when the boss reaches zero.
    pub raid_killed: bool,
    /// Seed for the deterministic daily shop generator.
    pub shop_seed: u64,
}

/// Lifecycle of a duel record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelStatus {
    /// Waiting for the opponent's answer.
    Pending,
    /// Resolved. Terminal.
    Accepted,
    /// Refused. Terminal.
    Declined,
}

impl fmt::Display for DuelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        };
        f.write_str(label)
    }
}

/// A two-party challenge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duel {
    /// Record identifier.
    pub id: DuelId,
    /// Who issued the challenge.
    pub challenger: UserId,
    /// Who must answer it.
    pub opponent: UserId,
    /// Current lifecycle state.
    pub status: DuelStatus,
    /// Creation timestamp.
    pub created_at: u64,
}

/// Kind of an inventory item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Equippable weapon feeding raid damage and duel power.
    Weapon,
}

/// An owned inventory item stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Item key, unique within the owning user's inventory.
    pub key: ItemKey,
    /// Item kind.
    pub kind: ItemKind,
    /// Display name.
    pub name: String,
    /// Combat power.
    pub power: u32,
    /// Stack size. Rows with zero quantity are kept but confer nothing.
    pub quantity: u32,
}

/// A timed deferred-reward window. One per user; overwritten only once the
/// previous window is claimed or expired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Travel {
    /// Departure timestamp.
    pub started_at: u64,
    /// Earliest claim timestamp.
    pub ends_at: u64,
    /// Whether the reward was already collected.
    pub claimed: bool,
}

impl Travel {
    /// True once the window has run its course.
    #[inline]
    #[must_use]
    pub fn finished(&self, now: u64) -> bool {
        now >= self.ends_at
    }

    /// Seconds until the window can be claimed (0 when finished).
    #[inline]
    #[must_use]
    pub fn remaining(&self, now: u64) -> u64 {
        self.ends_at.saturating_sub(now)
    }
}
