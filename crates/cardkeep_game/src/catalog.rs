//! # Card Catalog
//!
//! Admin-facing CRUD over the card catalog. The multi-step authoring dialog
//! lives with the chat collaborator; by the time a card reaches the engine
//! it is complete data.

use crate::engine::Engine;
use crate::error::{GameError, GameResult};
use cardkeep_store::{Card, CardId, Rarity, UserId};

/// Stored intra-tier weight for new cards. Draws select uniformly within a
/// tier, so this is catalog metadata only.
const DEFAULT_CARD_WEIGHT: u32 = 1;

impl Engine {
    /// Adds a card to the catalog.
    ///
    /// # Errors
    ///
    /// [`GameError::NameTooShort`] for names under two characters.
    pub fn add_card(
        &self,
        name: &str,
        rarity: Rarity,
        image_ref: &str,
        description: &str,
    ) -> GameResult<Card> {
        let name = name.trim();
        if name.chars().count() < 2 {
            return Err(GameError::NameTooShort);
        }

        let mut txn = self.ledger().begin();
        let id = txn.alloc_card_id();
        let card = Card {
            id,
            name: name.to_string(),
            rarity,
            weight: DEFAULT_CARD_WEIGHT,
            image_ref: image_ref.to_string(),
            description: description.to_string(),
        };
        txn.put_card(card.clone());
        txn.commit()?;

        tracing::info!(card = id, %rarity, "catalog: card added");
        Ok(card)
    }

    /// Lists the catalog, newest first.
    #[must_use]
    pub fn list_cards(&self) -> Vec<Card> {
        self.ledger()
            .view(|w| w.cards.values().rev().cloned().collect())
    }

    /// Looks up one card.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownCard`] when absent.
    pub fn card(&self, id: CardId) -> GameResult<Card> {
        self.ledger()
            .view(|w| w.cards.get(&id).cloned())
            .ok_or(GameError::UnknownCard(id))
    }

    /// Deletes a card and every ownership row pointing at it.
    ///
    /// The cascade keeps the ownership table free of dangling references;
    /// players simply lose the copies of a retired card.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownCard`] when absent.
    pub fn delete_card(&self, id: CardId) -> GameResult<Card> {
        let mut txn = self.ledger().begin();
        let card = txn
            .state()
            .cards
            .get(&id)
            .cloned()
            .ok_or(GameError::UnknownCard(id))?;

        let owners: Vec<UserId> = txn
            .state()
            .ownership
            .keys()
            .filter(|(_, card_id)| *card_id == id)
            .map(|(user, _)| *user)
            .collect();
        for user in &owners {
            txn.set_owned(*user, id, 0);
        }
        txn.delete_card(id);
        txn.commit()?;

        tracing::info!(card = id, owners = owners.len(), "catalog: card deleted");
        Ok(card)
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
    fn test_add_assigns_sequential_ids() {
        let engine = test_engine();
        let a = engine.add_card("Moss Golem", Rarity::Common, "img:1", "").unwrap();
        let b = engine.add_card("Sun Wyrm", Rarity::Legendary, "img:2", "").unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.weight, 1);
    }

    #[test]
    fn test_short_name_rejected() {
        let engine = test_engine();
        assert!(matches!(
            engine.add_card(" x ", Rarity::Common, "", ""),
            Err(GameError::NameTooShort)
        ));
        assert!(engine.list_cards().is_empty());
    }

    #[test]
    fn test_list_is_newest_first() {
        let engine = test_engine();
        engine.add_card("First", Rarity::Common, "", "").unwrap();
        engine.add_card("Second", Rarity::Common, "", "").unwrap();
        let listed = engine.list_cards();
        assert_eq!(listed[0].name, "Second");
        assert_eq!(listed[1].name, "First");
    }

    #[test]
    fn test_delete_cascades_ownership() {
        let engine = test_engine();
        let card = engine.add_card("Moss Golem", Rarity::Common, "", "").unwrap();
        engine.register_or_touch_user(1, "Ann", None, 0).unwrap();
        {
            let mut txn = engine.ledger().begin();
            txn.set_owned(1, card.id, 4);
            txn.commit().unwrap();
        }

        engine.delete_card(card.id).unwrap();
        assert_eq!(engine.ledger().view(|w| w.owned_count(1, card.id)), 0);
        assert!(matches!(
            engine.card(card.id),
            Err(GameError::UnknownCard(_))
        ));
        // Deleting again: the card is gone.
        assert!(engine.delete_card(card.id).is_err());
    }
}
