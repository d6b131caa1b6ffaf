//! # Ledger
//!
//! The transactional front door of the store. All world state lives behind
//! one `RwLock`; reads take the shared side, every mutation runs inside a
//! [`Txn`] holding the exclusive side. That single writer lock is what makes
//! shared-row read-modify-write (raid hit points, day creation) serializable
//! without retry loops, and what makes multi-row operations (gifts, duel
//! payouts, pack purchases) one atomic unit.
//!
//! A transaction buffers its journal operations and clones a rollback
//! snapshot up front. `commit()` makes the group durable; dropping the
//! transaction without committing restores the snapshot, so a failed
//! validation deep inside an operation leaves nothing behind.

use crate::entities::{
    Card, CardId, Cooldown, DailyState, Duel, DuelId, InventoryItem, Travel, User, UserId,
};
use crate::error::StoreResult;
use crate::journal::{replay, Journal, JournalOp};
use crate::world::WorldState;
use parking_lot::{RwLock, RwLockWriteGuard};
use std::path::{Path, PathBuf};

/// File name of the journal inside a ledger directory.
const JOURNAL_FILE: &str = "journal.log";

/// File name of the checkpoint snapshot inside a ledger directory.
const SNAPSHOT_FILE: &str = "world.snap";

/// The durable entity ledger.
pub struct Ledger {
    world: RwLock<WorldState>,
    journal: Option<Journal>,
    snapshot_path: Option<PathBuf>,
}

impl Ledger {
    /// Opens a durable ledger rooted at `dir`.
    ///
    /// Recovery order: load the checkpoint snapshot if one exists, then
    /// replay every committed journal group on top of it.
    ///
    /// # Errors
    ///
    /// Fails on io errors or corrupt snapshot/journal contents.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let snapshot_path = dir.join(SNAPSHOT_FILE);
        let mut world = if snapshot_path.exists() {
            let bytes = std::fs::read(&snapshot_path)?;
            bincode::deserialize(&bytes)?
        } else {
            WorldState::new()
        };

        let (journal, recovered) = Journal::open(dir.join(JOURNAL_FILE))?;
        replay(&mut world, &recovered);

        tracing::info!(
            users = world.users.len(),
            cards = world.cards.len(),
            "ledger: opened"
        );

        Ok(Self {
            world: RwLock::new(world),
            journal: Some(journal),
            snapshot_path: Some(snapshot_path),
        })
    }

    /// Creates a memory-only ledger. Nothing survives drop; intended for
    /// tests and tooling.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            world: RwLock::new(WorldState::new()),
            journal: None,
            snapshot_path: None,
        }
    }

    /// Runs a read-only closure against the current world.
    pub fn view<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        f(&self.world.read())
    }

    /// Begins a write transaction, blocking until the writer lock is held.
    pub fn begin(&self) -> Txn<'_> {
        let guard = self.world.write();
        let snapshot = guard.clone();
        Txn {
            world: guard,
            journal: self.journal.as_ref(),
            snapshot: Some(snapshot),
            ops: Vec::new(),
        }
    }

    /// Writes a checkpoint snapshot and truncates the journal.
    ///
    /// The snapshot lands under a temporary name and is renamed into place,
    /// so a crash mid-checkpoint leaves the previous snapshot intact.
    ///
    /// # Errors
    ///
    /// Fails on io or encoding errors. A no-op for ephemeral ledgers.
    pub fn checkpoint(&self) -> StoreResult<()> {
        let (Some(journal), Some(snapshot_path)) = (&self.journal, &self.snapshot_path) else {
            return Ok(());
        };

        // Hold the read lock across snapshot + truncate so no commit can
        // slip between the two and get lost.
        let world = self.world.read();
        let bytes = bincode::serialize(&*world)?;
        let tmp = snapshot_path.with_extension("snap.tmp");
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, snapshot_path)?;
        journal.truncate()?;

        tracing::info!(bytes = bytes.len(), "ledger: checkpoint written");
        Ok(())
    }
}

/// An exclusive write transaction.
///
/// Mutations go through the `put_*`/`set_*` methods, which apply the change
/// to the live world and buffer the matching journal operation, keeping the
/// two in lockstep. Reads go through [`Txn::state`].
pub struct Txn<'a> {
    world: RwLockWriteGuard<'a, WorldState>,
    journal: Option<&'a Journal>,
    /// Rollback image; `None` once committed.
    snapshot: Option<WorldState>,
    ops: Vec<JournalOp>,
}

impl Txn<'_> {
    /// The world as this transaction currently sees it.
    #[must_use]
    pub fn state(&self) -> &WorldState {
        &self.world
    }

    /// Upserts a user row.
    pub fn put_user(&mut self, user: User) {
        self.record(JournalOp::PutUser(user));
    }

    /// Upserts a catalog card.
    pub fn put_card(&mut self, card: Card) {
        self.record(JournalOp::PutCard(card));
    }

    /// Removes a catalog card. Ownership rows are the caller's business.
    pub fn delete_card(&mut self, id: CardId) {
        self.record(JournalOp::DeleteCard(id));
    }

    /// Sets an ownership count; zero removes the row.
    pub fn set_owned(&mut self, user: UserId, card: CardId, count: u32) {
        self.record(JournalOp::SetOwned { user, card, count });
    }

    /// Upserts a cooldown row.
    pub fn put_cooldown(&mut self, user: UserId, cooldown: Cooldown) {
        self.record(JournalOp::PutCooldown { user, cooldown });
    }

    /// Upserts a daily world row.
    pub fn put_day(&mut self, day: DailyState) {
        self.record(JournalOp::PutDay(day));
    }

    /// Upserts a duel record.
    pub fn put_duel(&mut self, duel: Duel) {
        self.record(JournalOp::PutDuel(duel));
    }

    /// Upserts an inventory item stack.
    pub fn put_item(&mut self, user: UserId, item: InventoryItem) {
        self.record(JournalOp::PutItem { user, item });
    }

    /// Upserts a travel window.
    pub fn put_travel(&mut self, user: UserId, travel: Travel) {
        self.record(JournalOp::PutTravel { user, travel });
    }

    /// Hands out the next catalog card id.
    pub fn alloc_card_id(&mut self) -> CardId {
        let id = self.world.next_card_id;
        self.world.next_card_id += 1;
        id
    }

    /// Hands out the next duel id.
    pub fn alloc_duel_id(&mut self) -> DuelId {
        let id = self.world.next_duel_id;
        self.world.next_duel_id += 1;
        id
    }

    /// Makes the buffered operations durable and keeps the mutations.
    ///
    /// # Errors
    ///
    /// On journal failure the transaction rolls back on drop and the error
    /// is returned; the world is unchanged.
    pub fn commit(mut self) -> StoreResult<()> {
        if let Some(journal) = self.journal {
            if !self.ops.is_empty() {
                journal.append_committed(&self.ops)?;
            }
        }
        self.snapshot = None;
        Ok(())
    }

    fn record(&mut self, op: JournalOp) {
        self.world.apply(&op);
        self.ops.push(op);
    }
}

impl Drop for Txn<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.world = snapshot;
        }
    }
}
