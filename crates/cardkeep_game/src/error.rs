//! # Game Error Types
//!
//! Every operation fails before any write, so each error here implies "no
//! state changed". [`GameError::kind`] classifies variants for the dispatch
//! layer: malformed input, failed precondition, missing reference, or an
//! internal storage fault.

use crate::cooldown::CooldownKind;
use cardkeep_store::{CardId, DuelId, DuelStatus, StoreError, UserId};
use thiserror::Error;

/// Coarse classification of a [`GameError`], for the chat dispatch layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// A game-rule gate rejected the action.
    Precondition,
    /// A referenced entity does not exist.
    NotFound,
    /// Storage-layer fault; nothing the player can do about it.
    Internal,
}

/// Errors produced by engine operations.
#[derive(Error, Debug)]
pub enum GameError {
    // ---- validation ----
    /// Target reference is neither a numeric id nor an `@handle`.
    #[error("malformed target reference {0:?}")]
    MalformedTarget(String),

    /// A quantity argument must be positive.
    #[error("quantity must be positive")]
    ZeroQuantity,

    /// Card names need at least two characters.
    #[error("card name too short")]
    NameTooShort,

    /// Travel length outside the allowed window.
    #[error("travel length {hours} h out of range {min}..={max}")]
    HoursOutOfRange {
        /// Requested hours.
        hours: u32,
        /// Minimum allowed.
        min: u32,
        /// Maximum allowed.
        max: u32,
    },

    /// Unreadable balance configuration.
    #[error("invalid config: {0}")]
    Config(String),

    // ---- preconditions ----
    /// The rate gate for this action has not elapsed yet.
    #[error("{kind} cooldown active, {remaining}s left")]
    CooldownActive {
        /// Which gate fired.
        kind: CooldownKind,
        /// Seconds until the action is allowed again.
        remaining: u64,
    },

    /// Drawing cards requires a chosen path.
    #[error("choose a path first")]
    PathNotChosen,

    /// Wallet balance below the price.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds {
        /// Price of the action.
        needed: u64,
        /// Current balance.
        available: u64,
    },

    /// Not enough copies of a card.
    #[error("not enough copies of card {card}: need {needed}, have {owned}")]
    InsufficientCards {
        /// Card in question.
        card: CardId,
        /// Copies required.
        needed: u32,
        /// Copies owned.
        owned: u32,
    },

    /// No raid spawned today.
    #[error("no raid today")]
    RaidInactive,

    /// Today's boss is already dead.
    #[error("the boss is already down")]
    RaidDefeated,

    /// The duel is addressed to someone else.
    #[error("duel {duel} is not addressed to you")]
    NotYourDuel {
        /// Duel in question.
        duel: DuelId,
    },

    /// The duel already left its pending state.
    #[error("duel already {status}")]
    DuelClosed {
        /// Terminal status it reached.
        status: DuelStatus,
    },

    /// Duels and gifts cannot target their originator.
    #[error("cannot target yourself")]
    SelfTarget,

    /// A travel window is still running; it must finish or be claimed first.
    #[error("travel still running, {remaining}s left")]
    TravelRunning {
        /// Seconds until the current window ends.
        remaining: u64,
    },

    /// The travel window has not finished yet.
    #[error("travel not finished, {remaining}s left")]
    TravelNotFinished {
        /// Seconds until the reward unlocks.
        remaining: u64,
    },

    /// The travel reward was already collected.
    #[error("travel reward already claimed")]
    TravelClaimed,

    /// The card catalog holds nothing to draw.
    #[error("card catalog is empty")]
    EmptyCatalog,

    // ---- not found ----
    /// No user with this id.
    #[error("unknown user {0}")]
    UnknownUser(UserId),

    /// A target reference resolved to nobody.
    #[error("no user matches {0:?}")]
    UnknownTarget(String),

    /// No card with this id.
    #[error("unknown card {0}")]
    UnknownCard(CardId),

    /// No duel with this id.
    #[error("unknown duel {0}")]
    UnknownDuel(DuelId),

    /// No such item in today's shop or the user's inventory.
    #[error("no such item {0:?}")]
    UnknownItem(String),

    /// The user never started a travel.
    #[error("no travel on record")]
    NoTravel,

    // ---- internal ----
    /// Storage failure surfaced from the ledger.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GameError {
    /// Classifies this error for the dispatch layer.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedTarget(_)
            | Self::ZeroQuantity
            | Self::NameTooShort
            | Self::HoursOutOfRange { .. }
            | Self::Config(_) => ErrorKind::Validation,

            Self::CooldownActive { .. }
            | Self::PathNotChosen
            | Self::InsufficientFunds { .. }
            | Self::InsufficientCards { .. }
            | Self::RaidInactive
            | Self::RaidDefeated
            | Self::NotYourDuel { .. }
            | Self::DuelClosed { .. }
            | Self::SelfTarget
            | Self::TravelRunning { .. }
            | Self::TravelNotFinished { .. }
            | Self::TravelClaimed
            | Self::EmptyCatalog => ErrorKind::Precondition,

            Self::UnknownUser(_)
            | Self::UnknownTarget(_)
            | Self::UnknownCard(_)
            | Self::UnknownDuel(_)
            | Self::UnknownItem(_)
            | Self::NoTravel => ErrorKind::NotFound,

            Self::Store(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for engine operations.
pub type GameResult<T> = Result<T, GameError>;
