//! # CARDKEEP Game Engine
//!
//! The game-state engine behind a chat card game: gacha draws, a shared
//! daily raid boss, duels, a deterministic daily shop, inventory and travel.
//!
//! ## Design Principles
//!
//! 1. **Validate-then-commit** - every operation checks all preconditions
//!    against the live world and commits one ledger transaction, or fails
//!    with nothing changed.
//! 2. **Two randomness sources** - an unseeded fairness generator for draws,
//!    rolls and rewards; a per-day generator rebuilt from the stored shop
//!    seed for anything that must be identical for every caller that day.
//! 3. **Lazy time** - no scheduler. Day rollover and cooldown expiry are
//!    evaluated on access against caller-provided timestamps.
//! 4. **Balance in TOML** - all tunable numbers live in [`GameConfig`].
//!
//! ## Entry Point
//!
//! ```rust,ignore
//! use cardkeep_game::{Engine, GameConfig};
//! use cardkeep_store::Ledger;
//! use std::sync::Arc;
//!
//! let ledger = Arc::new(Ledger::open("data/ledger")?);
//! let engine = Engine::new(ledger, GameConfig::default());
//! let card = engine.draw_card(user_id, now)?;
//! ```
//!
//! The chat transport, command dispatch and admin authoring dialog live
//! outside this crate; they call the [`Engine`] surface and render its
//! reports.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod cooldown;
pub mod daily;
pub mod duel;
pub mod engine;
pub mod error;
pub mod gacha;
pub mod inventory;
pub mod raid;
pub mod shop;
pub mod travel;
pub mod users;

pub use config::{DuelConfig, GameConfig, RaidConfig, ShopConfig, TierTable, TravelConfig};
pub use cooldown::CooldownKind;
pub use duel::{DuelReport, DuelVerdict};
pub use engine::Engine;
pub use error::{ErrorKind, GameError, GameResult};
pub use gacha::DrawTable;
pub use raid::{AttackReport, RaidStatus};
pub use shop::{Purchase, PurchaseEffect, SaleReceipt, ShopItem, ShopItemKind};
pub use travel::{TravelBonus, TravelReward};
pub use users::{CharacterSummary, CollectionEntry, TravelStatus};

// Entity types flow through the public API; re-export them so consumers
// need only this crate.
pub use cardkeep_store::{
    Card, CardId, DailyState, DayKey, Duel, DuelId, DuelStatus, InventoryItem, ItemKey, ItemKind,
    PathChoice, Rarity, Travel, User, UserId,
};
