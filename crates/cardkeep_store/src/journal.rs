//! # Append-Only Journal
//!
//! **Crash-safe persistence for the ledger.**
//!
//! Committed transactions are appended as a `BEGIN`, one record per
//! operation, then `COMMIT`. Once a commit append returns, the group is on
//! disk. On open, the journal is scanned and every committed group is
//! replayed into the world; a trailing group without its `COMMIT` (a crash
//! mid-append) is truncated away.
//!
//! Transactions that roll back never reach the journal at all - operations
//! are buffered in memory until commit - so no rollback record type exists.
//!
//! ## Format
//!
//! ```text
//! [4 bytes: magic "CKPJ"]
//! [4 bytes: version]
//!
//! Record format:
//! [8 bytes: LSN]
//! [1 byte: record type (BEGIN/OP/COMMIT)]
//! [4 bytes: payload length]
//! [N bytes: payload (bincode operation, empty for markers)]
//! [4 bytes: CRC32 of above]
//! ```

use crate::entities::{
    Card, CardId, Cooldown, DailyState, Duel, InventoryItem, Travel, User, UserId,
};
use crate::error::{StoreError, StoreResult};
use crate::world::WorldState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Magic bytes identifying a journal file.
const JOURNAL_MAGIC: &[u8; 4] = b"CKPJ";

/// Current journal format version.
const JOURNAL_VERSION: u32 = 1;

/// Byte length of the file header.
const HEADER_LEN: u64 = 8;

/// Journal record types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
enum RecordType {
    /// Start of a committed group.
    Begin = 1,
    /// An operation within a group.
    Op = 2,
    /// End of a committed group (durable once on disk).
    Commit = 3,
}

impl RecordType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Begin),
            2 => Some(Self::Op),
            3 => Some(Self::Commit),
            _ => None,
        }
    }
}

/// One durable mutation of the world.
///
/// Operations carry resulting row state (upserts), not deltas, so replay is
/// idempotent and order within a group does not matter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalOp {
    /// Upsert a user row.
    PutUser(User),
    /// Upsert a catalog card.
    PutCard(Card),
    /// Remove a catalog card.
    DeleteCard(CardId),
    /// Set an ownership count. Zero removes the row.
    SetOwned {
        /// Owning user.
        user: UserId,
        /// Card in question.
        card: CardId,
        /// Resulting count.
        count: u32,
    },
    /// Upsert a cooldown row.
    PutCooldown {
        /// Owning user.
        user: UserId,
        /// Resulting stamps.
        cooldown: Cooldown,
    },
    /// Upsert a daily world row.
    PutDay(DailyState),
    /// Upsert a duel record.
    PutDuel(Duel),
    /// Upsert an inventory item stack.
    PutItem {
        /// Owning user.
        user: UserId,
        /// Resulting stack.
        item: InventoryItem,
    },
    /// Upsert a travel window.
    PutTravel {
        /// Owning user.
        user: UserId,
        /// Resulting window.
        travel: Travel,
    },
}

/// A parsed on-disk record.
struct Record {
    lsn: u64,
    record_type: RecordType,
    payload: Vec<u8>,
}

/// Append-only journal backing a [`Ledger`](crate::ledger::Ledger).
pub struct Journal {
    /// Next LSN to stamp.
    next_lsn: AtomicU64,
    /// Writer, positioned at the end of the last committed group.
    file: Mutex<BufWriter<File>>,
}

impl Journal {
    /// Opens or creates a journal file.
    ///
    /// Returns the journal plus every committed operation found in it, in
    /// commit order, ready to be replayed into a world. A torn tail (records
    /// after the last `COMMIT`) is logged and truncated.
    ///
    /// # Errors
    ///
    /// Fails on io errors or a header that is not a cardkeep journal.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<(Self, Vec<JournalOp>)> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        if file.metadata()?.len() == 0 {
            file.write_all(JOURNAL_MAGIC)?;
            file.write_all(&JOURNAL_VERSION.to_le_bytes())?;
            file.flush()?;
        }

        let (committed, max_lsn, valid_end) = Self::scan(&mut file)?;

        let file_len = file.metadata()?.len();
        if valid_end < file_len {
            tracing::warn!(
                dropped_bytes = file_len - valid_end,
                "journal: truncating uncommitted tail"
            );
            file.set_len(valid_end)?;
        }
        file.seek(SeekFrom::Start(valid_end))?;

        let journal = Self {
            next_lsn: AtomicU64::new(max_lsn + 1),
            file: Mutex::new(BufWriter::new(file)),
        };
        Ok((journal, committed))
    }

    /// Appends a committed group and syncs it to disk.
    ///
    /// Once this returns `Ok`, the group survives a crash.
    ///
    /// # Errors
    ///
    /// Fails on io or encoding errors; the caller must then roll back its
    /// in-memory mutations.
    pub fn append_committed(&self, ops: &[JournalOp]) -> StoreResult<()> {
        let mut file = self.file.lock();
        Self::write_record(&mut file, &self.next_lsn, RecordType::Begin, &[])?;
        for op in ops {
            let payload = bincode::serialize(op)?;
            Self::write_record(&mut file, &self.next_lsn, RecordType::Op, &payload)?;
        }
        Self::write_record(&mut file, &self.next_lsn, RecordType::Commit, &[])?;
        file.flush()?;
        file.get_ref().sync_all()?;
        Ok(())
    }

    /// Truncates the journal back to its header.
    ///
    /// Call after the world has been checkpointed elsewhere.
    ///
    /// # Errors
    ///
    /// Fails on io errors.
    pub fn truncate(&self) -> StoreResult<()> {
        let mut file = self.file.lock();
        // Drop anything buffered for the old tail before cutting the file.
        file.flush()?;
        file.get_ref().set_len(HEADER_LEN)?;
        file.seek(SeekFrom::Start(HEADER_LEN))?;
        file.get_ref().sync_all()?;
        Ok(())
    }

    /// Writes one framed record.
    fn write_record(
        file: &mut BufWriter<File>,
        next_lsn: &AtomicU64,
        record_type: RecordType,
        payload: &[u8],
    ) -> StoreResult<u64> {
        let lsn = next_lsn.fetch_add(1, Ordering::SeqCst);

        let mut frame = Vec::with_capacity(8 + 1 + 4 + payload.len());
        frame.extend_from_slice(&lsn.to_le_bytes());
        frame.push(record_type as u8);
        frame.extend_from_slice(&u32::try_from(payload.len()).unwrap_or(u32::MAX).to_le_bytes());
        frame.extend_from_slice(payload);
        let crc = crc32fast::hash(&frame);

        file.write_all(&frame)?;
        file.write_all(&crc.to_le_bytes())?;
        Ok(lsn)
    }

    /// Scans the file, returning committed ops, the highest LSN seen, and
    /// the byte offset just past the last committed group.
    fn scan(file: &mut File) -> StoreResult<(Vec<JournalOp>, u64, u64)> {
        file.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(&mut *file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != JOURNAL_MAGIC {
            return Err(StoreError::Corrupt("bad journal magic".to_string()));
        }
        let mut version_bytes = [0u8; 4];
        reader.read_exact(&mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);
        if version != JOURNAL_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported journal version {version}"
            )));
        }

        let mut committed = Vec::new();
        let mut pending: Vec<JournalOp> = Vec::new();
        let mut max_lsn = 0u64;
        let mut valid_end = HEADER_LEN;
        let mut cursor = HEADER_LEN;

        while let Some(record) = Self::read_record(&mut reader)? {
            cursor += 8 + 1 + 4 + record.payload.len() as u64 + 4;
            max_lsn = max_lsn.max(record.lsn);
            match record.record_type {
                RecordType::Begin => pending.clear(),
                RecordType::Op => {
                    let op = bincode::deserialize(&record.payload)?;
                    pending.push(op);
                }
                RecordType::Commit => {
                    committed.append(&mut pending);
                    valid_end = cursor;
                }
            }
        }

        Ok((committed, max_lsn, valid_end))
    }

    /// Reads one record; `None` on end of readable data.
    ///
    /// A short read or CRC mismatch is treated as the end of the journal,
    /// not an error - that is what a crash mid-append looks like.
    fn read_record(reader: &mut impl Read) -> StoreResult<Option<Record>> {
        let mut lsn_bytes = [0u8; 8];
        match reader.read_exact(&mut lsn_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let mut type_byte = [0u8; 1];
        if reader.read_exact(&mut type_byte).is_err() {
            return Ok(None);
        }
        let Some(record_type) = RecordType::from_u8(type_byte[0]) else {
            return Ok(None);
        };

        let mut len_bytes = [0u8; 4];
        if reader.read_exact(&mut len_bytes).is_err() {
            return Ok(None);
        }
        let payload_len = u32::from_le_bytes(len_bytes) as usize;

        let mut payload = vec![0u8; payload_len];
        if reader.read_exact(&mut payload).is_err() {
            return Ok(None);
        }
        let mut crc_bytes = [0u8; 4];
        if reader.read_exact(&mut crc_bytes).is_err() {
            return Ok(None);
        }
        let stored_crc = u32::from_le_bytes(crc_bytes);

        let mut frame = Vec::with_capacity(8 + 1 + 4 + payload_len);
        frame.extend_from_slice(&lsn_bytes);
        frame.push(type_byte[0]);
        frame.extend_from_slice(&len_bytes);
        frame.extend_from_slice(&payload);
        if crc32fast::hash(&frame) != stored_crc {
            return Ok(None);
        }

        Ok(Some(Record {
            lsn: u64::from_le_bytes(lsn_bytes),
            record_type,
            payload,
        }))
    }
}

/// Replays committed operations into a world.
pub fn replay(world: &mut WorldState, ops: &[JournalOp]) {
    for op in ops {
        world.apply(op);
    }
    if !ops.is_empty() {
        tracing::info!(ops = ops.len(), "journal: replayed committed operations");
    }
}
