//! # CARDKEEP Store
//!
//! Durable entity ledger for the cardkeep game engine.
//!
//! ## Design Principles
//!
//! 1. **One source of truth** - every table lives in a single [`WorldState`]
//!    behind one lock; no per-table drift.
//! 2. **Validate-then-commit** - a [`Txn`] either commits whole or restores
//!    its snapshot; partial application cannot happen.
//! 3. **Serializable shared rows** - the writer lock makes day creation and
//!    raid hit-point decrements lose no updates under concurrency.
//! 4. **Replayable durability** - committed transactions are journaled with
//!    CRC framing and replayed on open; checkpoints compact the journal.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cardkeep_store::Ledger;
//!
//! let ledger = Ledger::open("data/ledger")?;
//! let mut txn = ledger.begin();
//! txn.set_owned(user_id, card_id, 3);
//! txn.commit()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod entities;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod world;

pub use entities::{
    Card, CardId, Cooldown, DailyState, DayKey, Duel, DuelId, DuelStatus, InventoryItem, ItemKey,
    ItemKind, PathChoice, Rarity, Travel, User, UserId,
};
pub use error::{StoreError, StoreResult};
pub use journal::{Journal, JournalOp};
pub use ledger::{Ledger, Txn};
pub use world::WorldState;
