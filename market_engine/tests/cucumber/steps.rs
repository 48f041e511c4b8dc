use std::str::FromStr;

use cucumber::{gherkin::Step, given, then, when};
use market_engine::{
    db_types::{Actor, NewOrder, NewOrderItem, OrderStatusType, Role},
    MarketplaceError,
    OrderManagement,
};
use mkt_common::Money;

use crate::{
    cucumber::{world::error_kind, MarketWorld},
    support::Marketplace,
};

fn actor(role: &str, id: &str) -> Actor {
    Actor::new(id, Role::from_str(role).expect("Not a valid role"))
}

fn status(s: &str) -> OrderStatusType {
    OrderStatusType::from_str(s).expect("Not a valid order status")
}

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut MarketWorld) {
    world.system = Some(Marketplace::new().await);
}

#[when(expr = "buyer '{word}' places order {word} with:")]
async fn place_order(world: &mut MarketWorld, step: &Step, buyer: String, label: String) {
    let table = step.table.as_ref().expect("The order needs a table of items");
    let mut order = NewOrder::new(&buyer, "42 Harbour Rd");
    for (i, row) in table.rows.iter().skip(1).enumerate() {
        let quantity = row[1].parse().expect("quantity must be an integer");
        let price = row[2].parse::<i64>().expect("unit price must be an integer");
        order = order.with_item(NewOrderItem::new(&row[0], format!("{label}-{i}"), quantity, Money::from(price)));
    }
    let result = world.market().orders.place_order(&Actor::buyer(&buyer), order).await;
    if let Some(placed) = world.record(result) {
        world.orders.insert(label, placed.order.id);
    }
}

#[when(expr = "{word} '{word}' moves order {word} from {word} to {word}")]
async fn move_order(world: &mut MarketWorld, role: String, id: String, label: String, from: String, to: String) {
    let order_id = world.order_id(&label);
    let result = world.market().orders.transition(&actor(&role, &id), order_id, status(&from), status(&to)).await;
    world.record(result);
}

#[when(expr = "order {word} is shipped and confirmed")]
async fn ship_and_confirm(world: &mut MarketWorld, label: String) {
    let order_id = world.order_id(&label);
    let order = world.market().db.fetch_order_with_items(order_id).await.expect("fetch failed").expect("no order");
    let seller = order.items[0].seller_id.clone();
    world.market().complete(order_id, &order.order.buyer_id, &seller).await;
}

#[when(expr = "admin re-runs commission creation for order {word}")]
async fn rerun_commissions(world: &mut MarketWorld, label: String) {
    let order_id = world.order_id(&label);
    let result = world.market().orders.ensure_commissions_for_order(&Actor::admin("root"), order_id).await;
    world.record(result);
}

#[when(expr = "seller '{word}' submits payment proof {word} of {int}")]
async fn submit_proof(world: &mut MarketWorld, seller: String, label: String, amount: i64) {
    let seller = Actor::seller(&seller);
    let result = world.market().settlement.submit_payment_proof(&seller, Money::from(amount), &label).await;
    if let Some(proof) = world.record(result) {
        world.proofs.insert(label, proof.id);
    }
}

#[when(expr = "admin approves payment proof {word}")]
async fn approve_proof(world: &mut MarketWorld, label: String) {
    let proof_id = world.proof_id(&label);
    let result = world.market().settlement.approve_payment_proof(&Actor::admin("root"), proof_id).await;
    if let Some(report) = world.record(result) {
        world.last_report = Some(report);
    }
}

#[when(expr = "admin rejects payment proof {word} because {string}")]
async fn reject_proof(world: &mut MarketWorld, label: String, note: String) {
    let proof_id = world.proof_id(&label);
    let result = world.market().settlement.reject_payment_proof(&Actor::admin("root"), proof_id, Some(&note)).await;
    world.record(result);
}

#[then(expr = "order {word} is {word}")]
async fn order_status(world: &mut MarketWorld, label: String, expected: String) {
    let order_id = world.order_id(&label);
    let order = world.market().db.fetch_order(order_id).await.expect("fetch failed").expect("no order");
    assert_eq!(order.status, status(&expected));
}

#[then(expr = "the request fails with {word}")]
async fn request_failed(world: &mut MarketWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The last request succeeded");
    assert_eq!(error_kind(err), kind, "{err}");
}

#[then("the request succeeds")]
async fn request_succeeded(world: &mut MarketWorld) {
    if let Some(e) = &world.last_error {
        panic!("The last request failed: {e}");
    }
}

#[then(expr = "seller '{word}' owes {int} across {int} pending commission(s)")]
async fn seller_owes(world: &mut MarketWorld, seller: String, total: i64, count: i64) {
    let summary = world.market().ledger.pending_commissions_by_seller(&Actor::admin("root")).await.expect("query");
    let (owed, n) = summary
        .iter()
        .find(|s| s.seller_id == seller)
        .map(|s| (s.total_owed, s.count))
        .unwrap_or((Money::zero(), 0));
    assert_eq!(owed, Money::from(total));
    assert_eq!(n, count);
}

#[then(expr = "seller '{word}' has been paid {int} in total")]
async fn seller_paid(world: &mut MarketWorld, seller: String, total: i64) {
    let paid = world.market().ledger.paid_total_for_seller(&Actor::seller(&seller), &seller).await.expect("query");
    assert_eq!(paid, Money::from(total));
}

#[then(expr = "the settlement covered {int} commission(s) leaving {int} unallocated")]
async fn settlement_outcome(world: &mut MarketWorld, settled: usize, unallocated: i64) {
    let report = world.last_report.as_ref().expect("No settlement has been made");
    assert_eq!(report.settled.len(), settled);
    assert_eq!(report.unallocated, Money::from(unallocated));
}

#[then(expr = "{word} '{word}' has {int} unread {word} notification(s)")]
async fn unread_notifications(world: &mut MarketWorld, role: String, id: String, count: usize, kind: String) {
    let notes = world.market().notifications.notifications_for(&actor(&role, &id), true).await.expect("query");
    let matching = notes.iter().filter(|n| n.notification_type.to_string() == kind).count();
    assert_eq!(matching, count, "{notes:#?}");
}

#[when(expr = "{word} '{word}' marks all their notifications read")]
async fn mark_all_read(world: &mut MarketWorld, role: String, id: String) {
    let reader = actor(&role, &id);
    let api = &world.market().notifications;
    let unread = api.notifications_for(&reader, true).await.expect("query");
    for note in unread {
        api.mark_read(&reader, note.id).await.expect("Could not mark notification read");
    }
}

#[when(expr = "{word} '{word}' marks a notification for {word} '{word}' read")]
async fn mark_someone_elses(world: &mut MarketWorld, role: String, id: String, owner_role: String, owner: String) {
    let api = &world.market().notifications;
    let theirs = api.notifications_for(&actor(&owner_role, &owner), false).await.expect("query");
    let note = theirs.first().expect("They have no notifications");
    let result = api.mark_read(&actor(&role, &id), note.id).await.map_err(MarketplaceError::from);
    world.record(result);
}
