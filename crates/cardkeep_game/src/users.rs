//! # Users
//!
//! Registration, path choice, target resolution, and the read surfaces the
//! chat layer renders directly: collection listing and character summary.

use crate::engine::Engine;
use crate::error::{GameError, GameResult};
use cardkeep_store::{
    Card, Cooldown, InventoryItem, ItemKey, ItemKind, PathChoice, Travel, User, UserId, WorldState,
};

/// Longest collection listing returned to the chat layer.
const COLLECTION_LIMIT: usize = 80;

/// Longest weapon list in a character summary.
const WEAPON_LIST_LIMIT: usize = 10;

/// One collection row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionEntry {
    /// The catalog card.
    pub card: Card,
    /// Copies owned.
    pub count: u32,
}

/// Travel state as the summary reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TravelStatus {
    /// Never traveled, or the engine has no record.
    Idle,
    /// On the road.
    Running {
        /// Seconds until the reward unlocks.
        remaining: u64,
    },
    /// Finished and waiting to be claimed.
    Claimable,
    /// Finished and already claimed.
    Claimed,
}

/// Everything the character screen shows.
#[derive(Clone, Debug)]
pub struct CharacterSummary {
    /// Chosen path, if any.
    pub path: Option<PathChoice>,
    /// Coin balance.
    pub wallet: u64,
    /// Equipped weapon key, if any.
    pub equipped_weapon: Option<ItemKey>,
    /// Effective equipped weapon power.
    pub weapon_power: u32,
    /// Whether a raid boost is currently active.
    pub boost_active: bool,
    /// Owned weapons, strongest first, capped.
    pub weapons: Vec<InventoryItem>,
    /// Travel state.
    pub travel: TravelStatus,
}

/// Resolves a target reference against the live world.
///
/// Accepts a numeric id or an `@handle` (case-insensitive). Both must name a
/// known user - a well-formed reference to nobody is [`GameError::UnknownTarget`].
pub(crate) fn resolve_in(world: &WorldState, raw: &str) -> GameResult<UserId> {
    let raw = raw.trim();

    if let Some(handle) = raw.strip_prefix('@') {
        return world
            .users
            .values()
            .find(|u| {
                u.handle
                    .as_deref()
                    .is_some_and(|h| h.eq_ignore_ascii_case(handle))
            })
            .map(|u| u.id)
            .ok_or_else(|| GameError::UnknownTarget(raw.to_string()));
    }

    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        let id: UserId = raw
            .parse()
            .map_err(|_| GameError::MalformedTarget(raw.to_string()))?;
        return if world.users.contains_key(&id) {
            Ok(id)
        } else {
            Err(GameError::UnknownTarget(raw.to_string()))
        };
    }

    Err(GameError::MalformedTarget(raw.to_string()))
}

fn travel_status(travel: Option<&Travel>, now: u64) -> TravelStatus {
    match travel {
        None => TravelStatus::Idle,
        Some(t) if t.claimed => TravelStatus::Claimed,
        Some(t) if !t.finished(now) => TravelStatus::Running {
            remaining: t.remaining(now),
        },
        Some(_) => TravelStatus::Claimable,
    }
}

impl Engine {
    /// Upserts a user on interaction.
    ///
    /// First contact creates the row (empty wallet, no path, zeroed
    /// cooldowns); later contacts refresh name, handle and last-seen while
    /// leaving game state alone.
    ///
    /// # Errors
    ///
    /// Only storage failures.
    pub fn register_or_touch_user(
        &self,
        id: UserId,
        display_name: &str,
        handle: Option<&str>,
        now: u64,
    ) -> GameResult<User> {
        let mut txn = self.ledger().begin();

        let user = match txn.state().users.get(&id) {
            Some(existing) => {
                let mut user = existing.clone();
                user.display_name = display_name.to_string();
                user.handle = handle.map(str::to_string);
                user.last_seen = now;
                user
            }
            None => {
                tracing::info!(user = id, "users: first contact");
                User {
                    id,
                    display_name: display_name.to_string(),
                    handle: handle.map(str::to_string),
                    wallet: 0,
                    path: None,
                    equipped_weapon: None,
                    raid_boost_until: 0,
                    last_seen: now,
                }
            }
        };
        txn.put_user(user.clone());

        if !txn.state().cooldowns.contains_key(&id) {
            txn.put_cooldown(id, Cooldown::default());
        }

        txn.commit()?;
        Ok(user)
    }

    /// Sets the user's character path.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownUser`] for unregistered ids.
    pub fn choose_path(&self, user: UserId, path: PathChoice) -> GameResult<()> {
        let mut txn = self.ledger().begin();
        let mut row = txn
            .state()
            .users
            .get(&user)
            .cloned()
            .ok_or(GameError::UnknownUser(user))?;
        row.path = Some(path);
        txn.put_user(row);
        txn.commit()?;
        Ok(())
    }

    /// Resolves a numeric-id or `@handle` reference to a known user.
    ///
    /// # Errors
    ///
    /// [`GameError::MalformedTarget`] for garbage input,
    /// [`GameError::UnknownTarget`] when nobody matches.
    pub fn resolve_user_ref(&self, target: &str) -> GameResult<UserId> {
        self.ledger().view(|w| resolve_in(w, target))
    }

    /// Lists a user's collection: most-owned first, then by card id, capped.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownUser`] for unregistered ids.
    pub fn list_collection(&self, user: UserId) -> GameResult<Vec<CollectionEntry>> {
        self.ledger().view(|w| {
            if !w.users.contains_key(&user) {
                return Err(GameError::UnknownUser(user));
            }
            let mut entries: Vec<CollectionEntry> = w
                .owned_cards(user)
                .filter_map(|(card_id, count)| {
                    w.cards
                        .get(&card_id)
                        .map(|card| CollectionEntry {
                            card: card.clone(),
                            count,
                        })
                })
                .collect();
            entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.card.id.cmp(&b.card.id)));
            entries.truncate(COLLECTION_LIMIT);
            Ok(entries)
        })
    }

    /// Builds the character screen for a user.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownUser`] for unregistered ids.
    pub fn character_summary(&self, user: UserId, now: u64) -> GameResult<CharacterSummary> {
        self.ledger().view(|w| {
            let row = w.users.get(&user).ok_or(GameError::UnknownUser(user))?;

            let mut weapons: Vec<InventoryItem> = w
                .inventories
                .get(&user)
                .map(|items| {
                    items
                        .values()
                        .filter(|i| i.kind == ItemKind::Weapon && i.quantity > 0)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            weapons.sort_by(|a, b| b.power.cmp(&a.power).then(a.key.cmp(&b.key)));
            weapons.truncate(WEAPON_LIST_LIMIT);

            Ok(CharacterSummary {
                path: row.path,
                wallet: row.wallet,
                equipped_weapon: row.equipped_weapon.clone(),
                weapon_power: w.weapon_power(user),
                boost_active: row.boost_active(now),
                weapons,
                travel: travel_status(w.travels.get(&user), now),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use cardkeep_store::Ledger;
    use std::sync::Arc;

    fn test_engine() -> Engine {
        Engine::with_rng_seed(Arc::new(Ledger::ephemeral()), GameConfig::default(), 1)
    }

    #[test]
    fn test_register_creates_then_touches() {
        let engine = test_engine();

        let first = engine
            .register_or_touch_user(1, "Ann", Some("ann"), 100)
            .unwrap();
        assert_eq!(first.wallet, 0);
        assert_eq!(first.last_seen, 100);
        assert!(engine.ledger().view(|w| w.cooldowns.contains_key(&1)));

        // Give the user some state, then touch again.
        engine.choose_path(1, PathChoice::Mystic).unwrap();
        let touched = engine
            .register_or_touch_user(1, "Annie", Some("ann"), 200)
            .unwrap();
        assert_eq!(touched.display_name, "Annie");
        assert_eq!(touched.last_seen, 200);
        assert_eq!(touched.path, Some(PathChoice::Mystic));
    }

    #[test]
    fn test_resolve_by_id_and_handle() {
        let engine = test_engine();
        engine
            .register_or_touch_user(42, "Bob", Some("BobTheGreat"), 0)
            .unwrap();

        assert_eq!(engine.resolve_user_ref("42").unwrap(), 42);
        assert_eq!(engine.resolve_user_ref("@bobthegreat").unwrap(), 42);
        assert_eq!(engine.resolve_user_ref(" @BobTheGreat ").unwrap(), 42);

        assert!(matches!(
            engine.resolve_user_ref("43"),
            Err(GameError::UnknownTarget(_))
        ));
        assert!(matches!(
            engine.resolve_user_ref("@ghost"),
            Err(GameError::UnknownTarget(_))
        ));
        assert!(matches!(
            engine.resolve_user_ref("bob"),
            Err(GameError::MalformedTarget(_))
        ));
    }

    #[test]
    fn test_summary_for_fresh_user() {
        let engine = test_engine();
        engine.register_or_touch_user(1, "Ann", None, 50).unwrap();

        let summary = engine.character_summary(1, 60).unwrap();
        assert_eq!(summary.wallet, 0);
        assert_eq!(summary.weapon_power, 0);
        assert!(!summary.boost_active);
        assert!(summary.weapons.is_empty());
        assert_eq!(summary.travel, TravelStatus::Idle);

        assert!(matches!(
            engine.character_summary(9, 60),
            Err(GameError::UnknownUser(9))
        ));
    }
}
