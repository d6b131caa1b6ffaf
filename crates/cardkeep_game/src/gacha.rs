//! # Gacha Engine
//!
//! Weighted-by-tier, uniform-within-tier card draws.
//!
//! A tier is chosen by weight first, then a card uniformly inside it - so a
//! card's odds are `tier_weight / total_weight / cards_in_tier`, and filling
//! a tier with more cards dilutes each one. An empty winning tier falls back
//! to a uniform pick over the whole catalog; an empty catalog yields no
//! card.

use crate::config::{GameConfig, TierTable};
use crate::cooldown::{self, CooldownKind};
use crate::engine::Engine;
use crate::error::{GameError, GameResult};
use cardkeep_store::{Card, CardId, Rarity, UserId, WorldState};
use rand::Rng;

/// Copies consumed by a ten-for-one exchange.
const EXCHANGE_COST: u32 = 10;

/// A draw table built from the live catalog.
///
/// Cheap to rebuild per draw - the catalog is admin-curated and small - and
/// rebuilding means a draw always sees the catalog as of its own
/// transaction.
pub struct DrawTable {
    weights: [u32; 4],
    tiers: [Vec<CardId>; 4],
}

impl DrawTable {
    /// Indexes the catalog by tier under the given weights.
    #[must_use]
    pub fn from_world(world: &WorldState, weights: &TierTable<u32>) -> Self {
        let mut tiers: [Vec<CardId>; 4] = Default::default();
        for card in world.cards.values() {
            tiers[card.rarity.index()].push(card.id);
        }
        Self {
            weights: [
                weights.get(Rarity::Common),
                weights.get(Rarity::Rare),
                weights.get(Rarity::Epic),
                weights.get(Rarity::Legendary),
            ],
            tiers,
        }
    }

    /// Total number of cards across all tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    /// True when there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(Vec::is_empty)
    }

    /// Draws one card id, or `None` from an empty catalog.
    pub fn pick(&self, rng: &mut impl Rng) -> Option<CardId> {
        let total: u64 = self.weights.iter().map(|w| u64::from(*w)).sum();
        if total == 0 {
            return self.pick_any(rng);
        }

        let mut roll = rng.gen_range(0..total);
        let mut winner = self.tiers.len() - 1;
        for (index, weight) in self.weights.iter().enumerate() {
            let weight = u64::from(*weight);
            if roll < weight {
                winner = index;
                break;
            }
            roll -= weight;
        }

        let tier = &self.tiers[winner];
        if tier.is_empty() {
            // Empty winning tier: uniform over the whole catalog.
            return self.pick_any(rng);
        }
        Some(tier[rng.gen_range(0..tier.len())])
    }

    /// Draws uniformly from one tier, or `None` when it is empty.
    pub fn pick_from_tier(&self, tier: Rarity, rng: &mut impl Rng) -> Option<CardId> {
        let pool = &self.tiers[tier.index()];
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.gen_range(0..pool.len())])
    }

    fn pick_any(&self, rng: &mut impl Rng) -> Option<CardId> {
        let total = self.len();
        if total == 0 {
            return None;
        }
        let mut index = rng.gen_range(0..total);
        for tier in &self.tiers {
            if index < tier.len() {
                return Some(tier[index]);
            }
            index -= tier.len();
        }
        None
    }
}

impl Engine {
    /// Draws one card for a user and credits it to their collection.
    ///
    /// Requires a chosen path and a clear draw cooldown. Cooldown stamp,
    /// draw and credit are one transaction: when anything fails, the stamp
    /// is not burnt.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownUser`], [`GameError::PathNotChosen`],
    /// [`GameError::CooldownActive`], [`GameError::EmptyCatalog`].
    pub fn draw_card(&self, user: UserId, now: u64) -> GameResult<Card> {
        let mut txn = self.ledger().begin();

        let row = txn
            .state()
            .users
            .get(&user)
            .ok_or(GameError::UnknownUser(user))?;
        if row.path.is_none() {
            return Err(GameError::PathNotChosen);
        }

        cooldown::consume(&mut txn, self.config(), CooldownKind::Draw, user, now)?;

        let table = DrawTable::from_world(txn.state(), &self.config().tier_weights);
        let card_id = {
            let mut rng = self.rng();
            table.pick(&mut *rng)
        }
        .ok_or(GameError::EmptyCatalog)?;

        let owned = txn.state().owned_count(user, card_id);
        txn.set_owned(user, card_id, owned + 1);
        let card = txn.state().cards[&card_id].clone();
        txn.commit()?;

        tracing::debug!(user, card = card.id, rarity = %card.rarity, "gacha: draw");
        Ok(card)
    }

    /// Trades ten copies of one card for a legendary.
    ///
    /// Credits one uniform pick from the legendary tier, or a plain draw
    /// when no legendaries exist. Debit and credit are one transaction: if
    /// the catalog empties out from under us, the ten copies stay owned.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownCard`], [`GameError::InsufficientCards`],
    /// [`GameError::EmptyCatalog`].
    pub fn exchange_ten(&self, user: UserId, card: CardId) -> GameResult<Card> {
        let mut txn = self.ledger().begin();

        if !txn.state().cards.contains_key(&card) {
            return Err(GameError::UnknownCard(card));
        }
        let owned = txn.state().owned_count(user, card);
        if owned < EXCHANGE_COST {
            return Err(GameError::InsufficientCards {
                card,
                needed: EXCHANGE_COST,
                owned,
            });
        }

        txn.set_owned(user, card, owned - EXCHANGE_COST);

        let table = DrawTable::from_world(txn.state(), &self.config().tier_weights);
        let reward_id = {
            let mut rng = self.rng();
            table
                .pick_from_tier(Rarity::Legendary, &mut *rng)
                .or_else(|| table.pick(&mut *rng))
        }
        .ok_or(GameError::EmptyCatalog)?;

        let held = txn.state().owned_count(user, reward_id);
        txn.set_owned(user, reward_id, held + 1);
        let reward = txn.state().cards[&reward_id].clone();
        txn.commit()?;

        tracing::info!(user, spent = card, got = reward.id, "gacha: exchange");
        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardkeep_store::Ledger;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn seed_catalog(engine: &Engine, shape: &[(Rarity, usize)]) -> Vec<Card> {
        let mut cards = Vec::new();
        for (rarity, count) in shape {
            for i in 0..*count {
                cards.push(
                    engine
                        .add_card(&format!("{rarity}-{i}"), *rarity, "", "")
                        .unwrap(),
                );
            }
        }
        cards
    }

    fn test_engine() -> Engine {
        Engine::with_rng_seed(Arc::new(Ledger::ephemeral()), GameConfig::default(), 99)
    }

    #[test]
    fn test_tier_frequency_converges() {
        let engine = test_engine();
        seed_catalog(
            &engine,
            &[
                (Rarity::Common, 3),
                (Rarity::Rare, 2),
                (Rarity::Epic, 2),
                (Rarity::Legendary, 1),
            ],
        );

        let table = engine
            .ledger()
            .view(|w| DrawTable::from_world(w, &engine.config().tier_weights));
        let mut rng = StdRng::seed_from_u64(4242);
        let mut per_tier: HashMap<Rarity, u32> = HashMap::new();
        let mut per_card: HashMap<CardId, u32> = HashMap::new();
        let trials = 200_000u32;

        for _ in 0..trials {
            let id = table.pick(&mut rng).unwrap();
            let rarity = engine.card(id).unwrap().rarity;
            *per_tier.entry(rarity).or_insert(0) += 1;
            *per_card.entry(id).or_insert(0) += 1;
        }

        // Weights 75/20/4/1 over total 100.
        let common_share = f64::from(per_tier[&Rarity::Common]) / f64::from(trials);
        let rare_share = f64::from(per_tier[&Rarity::Rare]) / f64::from(trials);
        let epic_share = f64::from(per_tier[&Rarity::Epic]) / f64::from(trials);
        let legendary_share = f64::from(per_tier[&Rarity::Legendary]) / f64::from(trials);
        assert!((common_share - 0.75).abs() < 0.01, "common {common_share}");
        assert!((rare_share - 0.20).abs() < 0.01, "rare {rare_share}");
        assert!((epic_share - 0.04).abs() < 0.005, "epic {epic_share}");
        assert!(
            (legendary_share - 0.01).abs() < 0.003,
            "legendary {legendary_share}"
        );

        // Uniform split inside the common tier: ~25% of the 75% each.
        let common_cards: Vec<u32> = per_card
            .iter()
            .filter(|(id, _)| engine.card(**id).unwrap().rarity == Rarity::Common)
            .map(|(_, n)| *n)
            .collect();
        assert_eq!(common_cards.len(), 3);
        for n in common_cards {
            let share = f64::from(n) / f64::from(trials);
            assert!((share - 0.25).abs() < 0.01, "per-card share {share}");
        }
    }

    #[test]
    fn test_empty_tier_falls_back_to_whole_catalog() {
        let engine = test_engine();
        // Only legendaries exist; common/rare/epic rolls must still land.
        seed_catalog(&engine, &[(Rarity::Legendary, 2)]);

        let table = engine
            .ledger()
            .view(|w| DrawTable::from_world(w, &engine.config().tier_weights));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            assert!(table.pick(&mut rng).is_some());
        }
    }

    #[test]
    fn test_empty_catalog_yields_nothing() {
        let engine = test_engine();
        let table = engine
            .ledger()
            .view(|w| DrawTable::from_world(w, &engine.config().tier_weights));
        let mut rng = StdRng::seed_from_u64(7);
        assert!(table.pick(&mut rng).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_draw_requires_path_and_credits_card() {
        let engine = test_engine();
        seed_catalog(&engine, &[(Rarity::Common, 1)]);
        engine.register_or_touch_user(1, "Ann", None, 0).unwrap();

        assert!(matches!(
            engine.draw_card(1, 100),
            Err(GameError::PathNotChosen)
        ));

        engine
            .choose_path(1, cardkeep_store::PathChoice::Vanguard)
            .unwrap();
        let card = engine.draw_card(1, 100).unwrap();
        assert_eq!(engine.ledger().view(|w| w.owned_count(1, card.id)), 1);

        // Second draw inside the window is gated, and nothing changes.
        assert!(matches!(
            engine.draw_card(1, 101),
            Err(GameError::CooldownActive { .. })
        ));
        assert_eq!(engine.ledger().view(|w| w.owned_count(1, card.id)), 1);
    }

    #[test]
    fn test_draw_on_empty_catalog_burns_nothing() {
        let engine = test_engine();
        engine.register_or_touch_user(1, "Ann", None, 0).unwrap();
        engine
            .choose_path(1, cardkeep_store::PathChoice::Vanguard)
            .unwrap();

        assert!(matches!(
            engine.draw_card(1, 100),
            Err(GameError::EmptyCatalog)
        ));
        // The failed draw must not consume the cooldown.
        assert_eq!(engine.ledger().view(|w| w.cooldowns[&1].last_draw), 0);
    }

    #[test]
    fn test_exchange_prefers_legendary_tier() {
        let engine = test_engine();
        let cards = seed_catalog(&engine, &[(Rarity::Common, 1), (Rarity::Legendary, 1)]);
        let common = cards[0].id;
        engine.register_or_touch_user(1, "Ann", None, 0).unwrap();
        {
            let mut txn = engine.ledger().begin();
            txn.set_owned(1, common, 10);
            txn.commit().unwrap();
        }

        let reward = engine.exchange_ten(1, common).unwrap();
        assert_eq!(reward.rarity, Rarity::Legendary);
        assert_eq!(engine.ledger().view(|w| w.owned_count(1, common)), 0);
        assert_eq!(engine.ledger().view(|w| w.owned_count(1, reward.id)), 1);
    }

    #[test]
    fn test_exchange_falls_back_without_legendaries() {
        let engine = test_engine();
        let cards = seed_catalog(&engine, &[(Rarity::Common, 1)]);
        let common = cards[0].id;
        engine.register_or_touch_user(1, "Ann", None, 0).unwrap();
        {
            let mut txn = engine.ledger().begin();
            txn.set_owned(1, common, 10);
            txn.commit().unwrap();
        }

        // Exactly ten owned, no legendary in the catalog: plain draw fallback.
        let reward = engine.exchange_ten(1, common).unwrap();
        assert_eq!(reward.id, common);
        assert_eq!(engine.ledger().view(|w| w.owned_count(1, common)), 1);
    }

    #[test]
    fn test_exchange_with_nine_changes_nothing() {
        let engine = test_engine();
        let cards = seed_catalog(&engine, &[(Rarity::Common, 1), (Rarity::Legendary, 1)]);
        let common = cards[0].id;
        engine.register_or_touch_user(1, "Ann", None, 0).unwrap();
        {
            let mut txn = engine.ledger().begin();
            txn.set_owned(1, common, 9);
            txn.commit().unwrap();
        }

        let err = engine.exchange_ten(1, common).unwrap_err();
        assert!(matches!(
            err,
            GameError::InsufficientCards {
                needed: 10,
                owned: 9,
                ..
            }
        ));
        assert_eq!(engine.ledger().view(|w| w.owned_count(1, common)), 9);
    }
}
