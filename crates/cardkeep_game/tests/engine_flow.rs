//! # Engine Flow Integration Tests
//!
//! Cross-subsystem flows through the public engine surface: the draw/sell
//! economy loop, exchange fallbacks, shop discounts after a raid kill, and
//! durability across a ledger reopen.

use cardkeep_game::{
    Engine, GameConfig, GameError, PathChoice, PurchaseEffect, Rarity, RaidStatus,
};
use cardkeep_store::Ledger;
use std::sync::Arc;

const NOW: u64 = 1_700_000_000;

fn engine() -> Engine {
    Engine::with_rng_seed(Arc::new(Ledger::ephemeral()), GameConfig::default(), 77)
}

fn registered(engine: &Engine, id: u64) {
    engine
        .register_or_touch_user(id, &format!("user-{id}"), None, NOW)
        .unwrap();
    engine.choose_path(id, PathChoice::Drifter).unwrap();
}

#[test]
fn draw_then_sell_returns_to_absent() {
    let engine = engine();
    let card = engine.add_card("Moss Golem", Rarity::Common, "", "").unwrap();
    registered(&engine, 1);

    let drawn = engine.draw_card(1, NOW).unwrap();
    assert_eq!(drawn.id, card.id);

    let receipt = engine.sell(1, card.id, 1).unwrap();
    assert_eq!(receipt.total, 5);
    assert_eq!(engine.ledger().view(|w| w.users[&1].wallet), 5);
    // Ownership row is gone, not zeroed.
    assert!(engine
        .ledger()
        .view(|w| !w.ownership.contains_key(&(1, card.id))));
    assert!(engine.list_collection(1).unwrap().is_empty());
}

#[test]
fn collection_orders_by_count_then_id() {
    let engine = engine();
    let a = engine.add_card("Alpha", Rarity::Common, "", "").unwrap();
    let b = engine.add_card("Beta", Rarity::Rare, "", "").unwrap();
    let c = engine.add_card("Gamma", Rarity::Epic, "", "").unwrap();
    registered(&engine, 1);
    {
        let mut txn = engine.ledger().begin();
        txn.set_owned(1, a.id, 2);
        txn.set_owned(1, b.id, 5);
        txn.set_owned(1, c.id, 2);
        txn.commit().unwrap();
    }

    let entries = engine.list_collection(1).unwrap();
    let order: Vec<u32> = entries.iter().map(|e| e.card.id).collect();
    assert_eq!(order, vec![b.id, a.id, c.id]);
}

#[test]
fn kill_discount_applies_for_rest_of_day() {
    let engine = engine();
    let card = engine.add_card("Siege Ram", Rarity::Legendary, "", "").unwrap();
    registered(&engine, 1);
    {
        let mut txn = engine.ledger().begin();
        txn.set_owned(1, card.id, 1);
        txn.commit().unwrap();
    }

    // Find a timestamp whose day spawns a weak boss, then batter it down.
    let mut now = NOW;
    let day = loop {
        let day = engine.ensure_day(now).unwrap();
        if day.raid_active {
            break day;
        }
        now += 86_400;
    };

    let before = engine.daily_shop(now).unwrap();
    assert_eq!(before[0].price, 60);

    let mut attack_at = now;
    loop {
        let report = engine.attack(1, card.id, attack_at).unwrap();
        if report.killed {
            break;
        }
        attack_at += engine.config().attack_cooldown_secs;
    }
    assert!(matches!(
        engine.raid_status(attack_at).unwrap(),
        RaidStatus::Defeated { .. }
    ));

    let after = engine.daily_shop(now).unwrap();
    assert_eq!(after[0].price, 51);
    assert_eq!(after[1].price, 34);
    assert_eq!(after[2].price, 102);
    // Same items, same weapon; only prices moved.
    assert_eq!(before[2].key, after[2].key);
    assert_eq!(day.day, engine.ensure_day(now).unwrap().day);
}

#[test]
fn shop_weapon_flows_into_raid_damage() {
    let engine = engine();
    let card = engine.add_card("Moss Golem", Rarity::Common, "", "").unwrap();
    registered(&engine, 1);
    {
        let mut txn = engine.ledger().begin();
        txn.set_owned(1, card.id, 1);
        let mut row = txn.state().users[&1].clone();
        row.wallet = 120;
        txn.put_user(row);
        txn.commit().unwrap();
    }

    // Find an active-raid day so the attack is legal.
    let mut now = NOW;
    while !engine.ensure_day(now).unwrap().raid_active {
        now += 86_400;
    }

    let items = engine.daily_shop(now).unwrap();
    let weapon = items[2].clone();
    let purchase = engine.buy(1, &weapon.key, now).unwrap();
    let PurchaseEffect::WeaponAdded(added) = purchase.effect else {
        panic!("weapon purchase must add an item");
    };
    let power = engine.equip(1, &added.key).unwrap();

    let report = engine.attack(1, card.id, now).unwrap();
    assert_eq!(report.damage, 5 + power / 2);
}

#[test]
fn exchange_ten_property_pair() {
    let engine = engine();
    let common = engine.add_card("Moss Golem", Rarity::Common, "", "").unwrap();
    registered(&engine, 1);

    // Nine copies: precondition failure, nothing moves.
    {
        let mut txn = engine.ledger().begin();
        txn.set_owned(1, common.id, 9);
        txn.commit().unwrap();
    }
    assert!(matches!(
        engine.exchange_ten(1, common.id),
        Err(GameError::InsufficientCards { .. })
    ));
    assert_eq!(engine.ledger().view(|w| w.owned_count(1, common.id)), 9);

    // Ten copies, no legendaries in the catalog: falls back to a draw.
    {
        let mut txn = engine.ledger().begin();
        txn.set_owned(1, common.id, 10);
        txn.commit().unwrap();
    }
    let reward = engine.exchange_ten(1, common.id).unwrap();
    assert_eq!(reward.id, common.id);
    assert_eq!(engine.ledger().view(|w| w.owned_count(1, common.id)), 1);
}

#[test]
fn state_survives_ledger_reopen() {
    let dir = std::env::temp_dir().join(format!(
        "cardkeep_flow_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));

    let card_id;
    {
        let engine = Engine::with_rng_seed(
            Arc::new(Ledger::open(&dir).unwrap()),
            GameConfig::default(),
            77,
        );
        let card = engine.add_card("Moss Golem", Rarity::Common, "", "").unwrap();
        card_id = card.id;
        registered(&engine, 1);
        engine.draw_card(1, NOW).unwrap();
        engine.ledger().checkpoint().unwrap();
        engine.start_travel(1, 2, NOW).unwrap();
    }
    {
        let engine = Engine::with_rng_seed(
            Arc::new(Ledger::open(&dir).unwrap()),
            GameConfig::default(),
            78,
        );
        assert_eq!(engine.ledger().view(|w| w.owned_count(1, card_id)), 1);
        // The post-checkpoint travel commit also came back.
        assert!(matches!(
            engine.claim_travel(1, NOW + 100),
            Err(GameError::TravelNotFinished { .. })
        ));
        // And the draw cooldown is still hot.
        assert!(matches!(
            engine.draw_card(1, NOW + 1),
            Err(GameError::CooldownActive { .. })
        ));
    }

    std::fs::remove_dir_all(&dir).ok();
}
