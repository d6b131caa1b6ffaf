//! # World State
//!
//! The full in-memory table set. One value of this struct is the single
//! source of truth behind the [`Ledger`](crate::ledger::Ledger) lock; the
//! journal exists only to rebuild it after a restart.
//!
//! Cross-table derived reads (equipped weapon power, per-rarity ownership
//! counts) live here because only this struct sees every table at once.

use crate::entities::{
    Card, CardId, Cooldown, DailyState, DayKey, Duel, DuelId, InventoryItem, ItemKey, ItemKind,
    Rarity, Travel, User, UserId,
};
use crate::journal::JournalOp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Every durable table, in one snapshot-able value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorldState {
    /// Registered players.
    pub users: HashMap<UserId, User>,
    /// Card catalog. BTreeMap keeps admin listings ordered.
    pub cards: BTreeMap<CardId, Card>,
    /// Next catalog id to hand out.
    pub next_card_id: CardId,
    /// (user, card) -> owned count. Rows exist only while count > 0.
    pub ownership: BTreeMap<(UserId, CardId), u32>,
    /// Per-user action stamps.
    pub cooldowns: HashMap<UserId, Cooldown>,
    /// Per-UTC-day shared world rows.
    pub days: HashMap<DayKey, DailyState>,
    /// Duel records.
    pub duels: HashMap<DuelId, Duel>,
    /// Next duel id to hand out.
    pub next_duel_id: DuelId,
    /// Per-user item inventories.
    pub inventories: HashMap<UserId, BTreeMap<ItemKey, InventoryItem>>,
    /// Per-user travel windows.
    pub travels: HashMap<UserId, Travel>,
}

impl WorldState {
    /// Creates an empty world with id counters at their starting values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_card_id: 1,
            next_duel_id: 1,
            ..Self::default()
        }
    }

    /// Owned count of a card, 0 when the row is absent.
    #[inline]
    #[must_use]
    pub fn owned_count(&self, user: UserId, card: CardId) -> u32 {
        self.ownership.get(&(user, card)).copied().unwrap_or(0)
    }

    /// Total owned copies across all cards of one rarity tier.
    #[must_use]
    pub fn owned_count_of_rarity(&self, user: UserId, rarity: Rarity) -> u32 {
        self.ownership
            .range((user, CardId::MIN)..=(user, CardId::MAX))
            .filter(|((_, card_id), _)| {
                self.cards.get(card_id).is_some_and(|c| c.rarity == rarity)
            })
            .map(|(_, count)| *count)
            .sum()
    }

    /// All ownership rows of one user, as (card id, count) pairs.
    pub fn owned_cards(&self, user: UserId) -> impl Iterator<Item = (CardId, u32)> + '_ {
        self.ownership
            .range((user, CardId::MIN)..=(user, CardId::MAX))
            .map(|((_, card_id), count)| (*card_id, *count))
    }

    /// Looks up an inventory item of a user.
    #[must_use]
    pub fn item(&self, user: UserId, key: &str) -> Option<&InventoryItem> {
        self.inventories.get(&user)?.get(key)
    }

    /// Effective power of the equipped weapon.
    ///
    /// Zero when nothing is equipped, when the equipped key dangles, or when
    /// the stack was traded away down to zero quantity.
    #[must_use]
    pub fn weapon_power(&self, user: UserId) -> u32 {
        let Some(key) = self
            .users
            .get(&user)
            .and_then(|u| u.equipped_weapon.as_deref())
        else {
            return 0;
        };
        match self.item(user, key) {
            Some(item) if item.kind == ItemKind::Weapon && item.quantity > 0 => item.power,
            _ => 0,
        }
    }

    /// Applies one journal operation.
    ///
    /// This is the single mutation point shared by live transactions and
    /// replay, so a rebuilt world cannot drift from the one that wrote the
    /// journal.
    pub fn apply(&mut self, op: &JournalOp) {
        match op {
            JournalOp::PutUser(user) => {
                self.users.insert(user.id, user.clone());
            }
            JournalOp::PutCard(card) => {
                self.next_card_id = self.next_card_id.max(card.id + 1);
                self.cards.insert(card.id, card.clone());
            }
            JournalOp::DeleteCard(id) => {
                self.cards.remove(id);
            }
            JournalOp::SetOwned { user, card, count } => {
                if *count == 0 {
                    self.ownership.remove(&(*user, *card));
                } else {
                    self.ownership.insert((*user, *card), *count);
                }
            }
            JournalOp::PutCooldown { user, cooldown } => {
                self.cooldowns.insert(*user, *cooldown);
            }
            JournalOp::PutDay(day) => {
                self.days.insert(day.day.clone(), day.clone());
            }
            JournalOp::PutDuel(duel) => {
                self.next_duel_id = self.next_duel_id.max(duel.id + 1);
                self.duels.insert(duel.id, duel.clone());
            }
            JournalOp::PutItem { user, item } => {
                self.inventories
                    .entry(*user)
                    .or_default()
                    .insert(item.key.clone(), item.clone());
            }
            JournalOp::PutTravel { user, travel } => {
                self.travels.insert(*user, *travel);
            }
        }
    }
}
