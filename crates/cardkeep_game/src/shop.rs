//! # Economy Subsystem
//!
//! The daily merchant, plus sell and gift flows.
//!
//! The listing must be identical for every caller on a given day, so it is
//! derived from a private generator seeded with the day's stored shop seed -
//! never from the fairness generator. Killing the raid boss discounts every
//! price for the rest of the day.

use crate::config::GameConfig;
use crate::daily;
use crate::engine::Engine;
use crate::error::{GameError, GameResult};
use crate::gacha::DrawTable;
use crate::users;
use cardkeep_store::{Card, CardId, DailyState, InventoryItem, ItemKey, ItemKind, UserId};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// What a shop item does when bought.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopItemKind {
    /// A pack of independent card draws.
    Pack,
    /// A timed raid damage boost.
    Boost,
    /// An inventory weapon.
    Weapon {
        /// Power of today's weapon.
        power: u32,
    },
}

/// One line of the daily listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopItem {
    /// Stable item key; weapons encode day and power.
    pub key: ItemKey,
    /// Effect on purchase.
    pub kind: ShopItemKind,
    /// Display name.
    pub name: String,
    /// Today's price, discount applied.
    pub price: u64,
}

/// Effect applied by a completed purchase.
#[derive(Clone, Debug)]
pub enum PurchaseEffect {
    /// Cards credited by a pack.
    Cards(Vec<Card>),
    /// Raid boost active until this timestamp.
    BoostUntil(u64),
    /// Weapon added (or stacked) in the inventory.
    WeaponAdded(InventoryItem),
}

/// Receipt for a completed purchase.
#[derive(Clone, Debug)]
pub struct Purchase {
    /// The listing line that was bought.
    pub item: ShopItem,
    /// What it did.
    pub effect: PurchaseEffect,
}

/// Receipt for a merchant sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaleReceipt {
    /// Fixed per-copy price for the card's tier.
    pub unit_price: u64,
    /// Coins credited.
    pub total: u64,
    /// Balance after the sale.
    pub wallet_after: u64,
}

/// Derives the day's listing from its stored seed.
///
/// Deterministic: same day row, same three items, whatever the call order.
pub(crate) fn listing(day: &DailyState, config: &GameConfig) -> Vec<ShopItem> {
    let mut rng = ChaCha8Rng::seed_from_u64(day.shop_seed);
    let powers = &config.shop.weapon_powers;
    let power = if powers.is_empty() {
        0
    } else {
        powers[rng.gen_range(0..powers.len())]
    };

    let price = |base: u64| {
        if day.raid_killed {
            (base * config.shop.kill_discount_bp / 10_000).max(1)
        } else {
            base
        }
    };

    vec![
        ShopItem {
            key: format!("pack_{}_x{}", day.day, config.shop.pack_draws),
            kind: ShopItemKind::Pack,
            name: format!("Card pack x{}", config.shop.pack_draws),
            price: price(config.shop.pack_price),
        },
        ShopItem {
            key: format!("boost_{}_raid", day.day),
            kind: ShopItemKind::Boost,
            name: format!(
                "Raid boost +{}% ({} h)",
                config.raid.boost_percent, config.shop.boost_hours
            ),
            price: price(config.shop.boost_price),
        },
        ShopItem {
            key: format!("weapon_{}_{}", day.day, power),
            kind: ShopItemKind::Weapon { power },
            name: format!("Wayfarer blade +{power}"),
            price: price(config.shop.weapon_price),
        },
    ]
}

impl Engine {
    /// Today's three-item listing.
    ///
    /// # Errors
    ///
    /// Only storage failures.
    pub fn daily_shop(&self, now: u64) -> GameResult<Vec<ShopItem>> {
        let day = self.ensure_day(now)?;
        Ok(listing(&day, self.config()))
    }

    /// Buys one item from today's listing.
    ///
    /// Debit and effect are one transaction; a pack that cannot draw (empty
    /// catalog) aborts the whole purchase, wallet untouched.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownItem`] for keys not in today's listing,
    /// [`GameError::InsufficientFunds`], [`GameError::UnknownUser`],
    /// [`GameError::EmptyCatalog`].
    pub fn buy(&self, user: UserId, item_key: &str, now: u64) -> GameResult<Purchase> {
        // Day creation commits on its own; a failed purchase must not roll
        // back (and re-randomize) a freshly created day row.
        self.ensure_day(now)?;

        let mut txn = self.ledger().begin();
        let mut rng = self.rng();
        let day = daily::ensure_day_txn(&mut txn, self.config(), &mut rng, now);
        let items = listing(&day, self.config());
        let item = items
            .into_iter()
            .find(|i| i.key == item_key)
            .ok_or_else(|| GameError::UnknownItem(item_key.to_string()))?;

        let mut row = txn
            .state()
            .users
            .get(&user)
            .cloned()
            .ok_or(GameError::UnknownUser(user))?;
        if row.wallet < item.price {
            return Err(GameError::InsufficientFunds {
                needed: item.price,
                available: row.wallet,
            });
        }
        row.wallet -= item.price;

        let effect = match item.kind {
            ShopItemKind::Pack => {
                let table = DrawTable::from_world(txn.state(), &self.config().tier_weights);
                let mut drawn = Vec::new();
                for _ in 0..self.config().shop.pack_draws {
                    let id = table.pick(&mut *rng).ok_or(GameError::EmptyCatalog)?;
                    let owned = txn.state().owned_count(user, id);
                    txn.set_owned(user, id, owned + 1);
                    drawn.push(txn.state().cards[&id].clone());
                }
                PurchaseEffect::Cards(drawn)
            }
            ShopItemKind::Boost => {
                let until = now + self.config().shop.boost_hours * 3_600;
                row.raid_boost_until = until;
                PurchaseEffect::BoostUntil(until)
            }
            ShopItemKind::Weapon { power } => {
                let stack = match txn.state().item(user, &item.key) {
                    Some(existing) => {
                        let mut stack = existing.clone();
                        stack.quantity += 1;
                        stack
                    }
                    None => InventoryItem {
                        key: item.key.clone(),
                        kind: ItemKind::Weapon,
                        name: item.name.clone(),
                        power,
                        quantity: 1,
                    },
                };
                txn.put_item(user, stack.clone());
                PurchaseEffect::WeaponAdded(stack)
            }
        };

        txn.put_user(row);
        drop(rng);
        txn.commit()?;

        tracing::info!(user, item = %item.key, price = item.price, "shop: purchase");
        Ok(Purchase { item, effect })
    }

    /// Sells copies of a card to the merchant at the tier's fixed price.
    ///
    /// # Errors
    ///
    /// [`GameError::ZeroQuantity`], [`GameError::UnknownCard`],
    /// [`GameError::InsufficientCards`], [`GameError::UnknownUser`].
    pub fn sell(&self, user: UserId, card: CardId, quantity: u32) -> GameResult<SaleReceipt> {
        if quantity == 0 {
            return Err(GameError::ZeroQuantity);
        }
        let mut txn = self.ledger().begin();

        let rarity = txn
            .state()
            .cards
            .get(&card)
            .ok_or(GameError::UnknownCard(card))?
            .rarity;
        let owned = txn.state().owned_count(user, card);
        if owned < quantity {
            return Err(GameError::InsufficientCards {
                card,
                needed: quantity,
                owned,
            });
        }
        let mut row = txn
            .state()
            .users
            .get(&user)
            .cloned()
            .ok_or(GameError::UnknownUser(user))?;

        let unit_price = self.config().sell_prices.get(rarity);
        let total = unit_price * u64::from(quantity);
        txn.set_owned(user, card, owned - quantity);
        row.wallet += total;
        let wallet_after = row.wallet;
        txn.put_user(row);
        txn.commit()?;

        Ok(SaleReceipt {
            unit_price,
            total,
            wallet_after,
        })
    }

    /// Gifts copies of a card to another user. Pure ownership transfer.
    ///
    /// Returns the resolved recipient id.
    ///
    /// # Errors
    ///
    /// [`GameError::ZeroQuantity`], [`GameError::MalformedTarget`] /
    /// [`GameError::UnknownTarget`], [`GameError::SelfTarget`],
    /// [`GameError::UnknownCard`], [`GameError::InsufficientCards`].
    pub fn gift(
        &self,
        from: UserId,
        to_ref: &str,
        card: CardId,
        quantity: u32,
    ) -> GameResult<UserId> {
        if quantity == 0 {
            return Err(GameError::ZeroQuantity);
        }
        let mut txn = self.ledger().begin();

        if !txn.state().users.contains_key(&from) {
            return Err(GameError::UnknownUser(from));
        }
        let to = users::resolve_in(txn.state(), to_ref)?;
        if to == from {
            return Err(GameError::SelfTarget);
        }
        if !txn.state().cards.contains_key(&card) {
            return Err(GameError::UnknownCard(card));
        }
        let owned = txn.state().owned_count(from, card);
        if owned < quantity {
            return Err(GameError::InsufficientCards {
                card,
                needed: quantity,
                owned,
            });
        }

        let received = txn.state().owned_count(to, card);
        txn.set_owned(from, card, owned - quantity);
        txn.set_owned(to, card, received + quantity);
        txn.commit()?;

        tracing::debug!(from, to, card, quantity, "shop: gift");
        Ok(to)
    }
}
