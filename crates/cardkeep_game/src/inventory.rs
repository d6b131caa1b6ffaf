//! # Inventory / Equipment
//!
//! Weapon ownership and the equip state that feeds raid damage and duel
//! power. Equipping never consumes the item; effective power comes from the
//! cross-table read in [`cardkeep_store::WorldState::weapon_power`].

use crate::engine::Engine;
use crate::error::{GameError, GameResult};
use cardkeep_store::{ItemKind, UserId};

impl Engine {
    /// Effective equipped weapon power for a user.
    ///
    /// Zero when nothing is equipped or the equipped stack is empty.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownUser`] for unregistered ids.
    pub fn weapon_power(&self, user: UserId) -> GameResult<u32> {
        self.ledger().view(|w| {
            if !w.users.contains_key(&user) {
                return Err(GameError::UnknownUser(user));
            }
            Ok(w.weapon_power(user))
        })
    }

    /// Equips an owned weapon. Returns its power.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownUser`]; [`GameError::UnknownItem`] when the key
    /// does not name an owned weapon with copies left.
    pub fn equip(&self, user: UserId, item_key: &str) -> GameResult<u32> {
        let mut txn = self.ledger().begin();

        let mut row = txn
            .state()
            .users
            .get(&user)
            .cloned()
            .ok_or(GameError::UnknownUser(user))?;

        let power = match txn.state().item(user, item_key) {
            Some(item) if item.kind == ItemKind::Weapon && item.quantity > 0 => item.power,
            _ => return Err(GameError::UnknownItem(item_key.to_string())),
        };

        row.equipped_weapon = Some(item_key.to_string());
        txn.put_user(row);
        txn.commit()?;
        Ok(power)
    }
}
