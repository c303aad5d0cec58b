//! Recharge order integration tests.

mod common;

use common::{TestHarness, ADMIN, INACTIVE_SETTING};
use orbia_ledger_core::{
    AccountId, Actor, ConfirmProof, EntryFilter, EntryStatus, EntryType, OrderFilter,
    OrderStatus, PageRequest, PaymentType,
};
use orbia_ledger_service::ServiceError;
use orbia_ledger_store::Store;

// ============================================================================
// Confirm
// ============================================================================

#[test]
fn confirm_credits_wallet_and_writes_one_entry() {
    let harness = TestHarness::new();
    let account = AccountId::new(42);
    let order = harness.pending_order(account, 10_000);

    let confirmed = harness
        .ledger
        .confirm(&order.order_id, Actor::Admin(ADMIN), ConfirmProof::default())
        .unwrap();

    assert_eq!(confirmed.order.status, OrderStatus::Confirmed);
    assert_eq!(confirmed.order.confirmed_by, Some(Actor::Admin(ADMIN)));

    let wallet = harness.ledger.wallet_info(account).unwrap();
    assert_eq!(wallet.balance_cents, 10_000);
    assert_eq!(wallet.total_recharge_cents, 10_000);
    assert_eq!(wallet.balance_formatted, "100.00");

    let page = harness
        .ledger
        .list_transactions(account, &EntryFilter::default(), PageRequest::default())
        .unwrap();
    assert_eq!(page.total, 1);
    let entry = &page.items[0];
    assert_eq!(entry.entry_type, EntryType::Recharge);
    assert_eq!(entry.status, EntryStatus::Completed);
    assert_eq!(entry.balance_before_cents, 0);
    assert_eq!(entry.balance_after_cents, 10_000);
    assert_eq!(entry.related_order_type.as_deref(), Some("recharge_order"));
    assert_eq!(
        entry.related_order_id.as_deref(),
        Some(order.order_id.to_string().as_str())
    );
    assert_eq!(entry.payment_method.as_deref(), Some("crypto"));
    assert_eq!(entry, &confirmed.entry);
}

#[test]
fn second_confirm_is_rejected_without_side_effects() {
    let harness = TestHarness::new();
    let account = AccountId::new(42);
    let order = harness.pending_order(account, 10_000);
    harness
        .ledger
        .confirm(&order.order_id, Actor::Admin(ADMIN), ConfirmProof::default())
        .unwrap();

    let err = harness
        .ledger
        .confirm(&order.order_id, Actor::Admin(ADMIN), ConfirmProof::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidStateTransition {
            from: OrderStatus::Confirmed,
            to: OrderStatus::Confirmed
        }
    ));

    assert_eq!(harness.ledger.wallet_info(account).unwrap().balance_cents, 10_000);
    let page = harness
        .ledger
        .list_transactions(account, &EntryFilter::default(), PageRequest::default())
        .unwrap();
    assert_eq!(page.total, 1);
}

#[test]
fn racing_confirms_credit_exactly_once() {
    let harness = TestHarness::new();
    let account = AccountId::new(42);
    let order = harness.pending_order(account, 10_000);
    let ledger = &harness.ledger;

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    ledger.confirm(&order.order_id, Actor::Admin(ADMIN), ConfirmProof::default())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result,
            Err(ServiceError::InvalidStateTransition { .. })
        ));
    }

    let wallet = ledger.wallet_info(account).unwrap();
    assert_eq!(wallet.balance_cents, 10_000);
    assert_eq!(wallet.total_recharge_cents, 10_000);
    let page = ledger
        .list_transactions(account, &EntryFilter::default(), PageRequest::default())
        .unwrap();
    assert_eq!(page.total, 1);
}

#[test]
fn confirm_merges_admin_remark_and_overrides_hash() {
    let harness = TestHarness::new();
    let mut request = TestHarness::crypto_request(AccountId::new(3), 2_500);
    request.crypto_tx_hash = Some("0xpayer".into());
    request.remark = Some("sent from exchange".into());
    let order = harness.ledger.create_crypto_order(request).unwrap();

    let confirmed = harness
        .ledger
        .confirm(
            &order.order_id,
            Actor::Admin(ADMIN),
            ConfirmProof {
                crypto_tx_hash: Some("0xverified".into()),
                remark: Some("checked on explorer".into()),
            },
        )
        .unwrap();

    assert_eq!(
        confirmed.order.remark.as_deref(),
        Some("sent from exchange\n[Admin]: checked on explorer")
    );
    assert_eq!(confirmed.order.crypto_tx_hash.as_deref(), Some("0xverified"));
    assert_eq!(confirmed.entry.crypto_tx_hash.as_deref(), Some("0xverified"));
}

#[test]
fn confirm_that_would_overflow_balance_is_invalid_input() {
    let harness = TestHarness::new();
    let account = AccountId::new(42);
    harness.fund(account, i64::MAX - 10);
    let order = harness.pending_order(account, 100);

    let err = harness
        .ledger
        .confirm(&order.order_id, Actor::Admin(ADMIN), ConfirmProof::default())
        .unwrap_err();
    assert_eq!(err.reason_code(), "invalid_input");

    let stored = harness.ledger.store().get_order(&order.order_id).unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(
        harness.ledger.wallet_info(account).unwrap().balance_cents,
        i64::MAX - 10
    );
    let page = harness
        .ledger
        .list_transactions(account, &EntryFilter::default(), PageRequest::default())
        .unwrap();
    assert_eq!(page.total, 1);
}

#[test]
fn confirm_unknown_order_is_not_found() {
    let harness = TestHarness::new();
    let other = TestHarness::new().pending_order(AccountId::new(1), 100);

    let err = harness
        .ledger
        .confirm(&other.order_id, Actor::Admin(ADMIN), ConfirmProof::default())
        .unwrap_err();
    assert_eq!(err.reason_code(), "not_found");
}

// ============================================================================
// Reject
// ============================================================================

#[test]
fn reject_leaves_wallet_untouched() {
    let harness = TestHarness::new();
    let account = AccountId::new(42);
    harness.fund(account, 500);
    let order = harness.pending_order(account, 10_000);

    let rejected = harness
        .ledger
        .reject(&order.order_id, Actor::Admin(ADMIN), "payment not received")
        .unwrap();
    assert_eq!(rejected.status, OrderStatus::Failed);
    assert_eq!(rejected.failed_reason.as_deref(), Some("payment not received"));

    assert_eq!(harness.ledger.wallet_info(account).unwrap().balance_cents, 500);
    let page = harness
        .ledger
        .list_transactions(account, &EntryFilter::default(), PageRequest::default())
        .unwrap();
    assert_eq!(page.total, 1, "only the funding entry exists");

    let err = harness
        .ledger
        .confirm(&order.order_id, Actor::Admin(ADMIN), ConfirmProof::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidStateTransition {
            from: OrderStatus::Failed,
            to: OrderStatus::Confirmed
        }
    ));
}

#[test]
fn reject_requires_reason() {
    let harness = TestHarness::new();
    let order = harness.pending_order(AccountId::new(42), 100);

    let err = harness
        .ledger
        .reject(&order.order_id, Actor::Admin(ADMIN), "   ")
        .unwrap_err();
    assert_eq!(err.reason_code(), "invalid_input");

    let stored = harness.ledger.store().get_order(&order.order_id).unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn crypto_order_snapshots_destination() {
    let harness = TestHarness::new();
    let order = harness.pending_order(AccountId::new(42), 10_000);

    assert_eq!(order.status, OrderStatus::Pending);
    let destination = order.destination.as_ref().unwrap();
    assert_eq!(destination.network, "TRC20");
    assert_eq!(destination.address, "TTreasury");
    assert!(order.order_id.to_string().starts_with("RCHORD_"));

    let stored = harness.ledger.store().get_order(&order.order_id).unwrap().unwrap();
    assert_eq!(stored, order);
}

#[test]
fn crypto_order_validation() {
    let harness = TestHarness::new();
    let account = AccountId::new(42);

    let err = harness
        .ledger
        .create_crypto_order(TestHarness::crypto_request(account, 0))
        .unwrap_err();
    assert_eq!(err.reason_code(), "invalid_input");

    let mut request = TestHarness::crypto_request(account, 100);
    request.payer_crypto_address = " ".into();
    assert_eq!(
        harness.ledger.create_crypto_order(request).unwrap_err().reason_code(),
        "invalid_input"
    );

    let mut request = TestHarness::crypto_request(account, 100);
    request.payment_setting_id = INACTIVE_SETTING;
    assert_eq!(
        harness.ledger.create_crypto_order(request).unwrap_err().reason_code(),
        "invalid_input"
    );

    let mut request = TestHarness::crypto_request(account, 100);
    request.payment_setting_id = 99;
    assert!(matches!(
        harness.ledger.create_crypto_order(request),
        Err(ServiceError::NotFound {
            entity: "payment_setting",
            ..
        })
    ));
}

#[test]
fn online_order_has_empty_payment_url() {
    let harness = TestHarness::new();
    let created = harness
        .ledger
        .create_online_order(AccountId::new(42), 5_000, "stripe")
        .unwrap();

    assert_eq!(created.payment_url, "");
    assert_eq!(created.order.payment_type, PaymentType::Online);
    assert_eq!(created.order.online_payment_platform.as_deref(), Some("stripe"));
    assert!(created.order.destination.is_none());
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn order_listings_and_detail() {
    let harness = TestHarness::new();
    let alice = AccountId::new(10);
    let bob = AccountId::new(20);

    let first = harness.pending_order(alice, 100);
    let second = harness
        .ledger
        .create_online_order(alice, 200, "stripe")
        .unwrap()
        .order;
    let bobs = harness.pending_order(bob, 300);
    harness
        .ledger
        .reject(&first.order_id, Actor::Admin(ADMIN), "duplicate")
        .unwrap();

    let mine = harness
        .ledger
        .my_orders(alice, None, PageRequest::default())
        .unwrap();
    assert_eq!(mine.total, 2);
    assert_eq!(mine.items[0].order_id, second.order_id);

    let pending = harness
        .ledger
        .my_orders(alice, Some(OrderStatus::Pending), PageRequest::default())
        .unwrap();
    assert_eq!(pending.total, 1);

    let crypto = harness
        .ledger
        .all_orders(
            &OrderFilter {
                payment_type: Some(PaymentType::Crypto),
                ..OrderFilter::default()
            },
            PageRequest::new(1, 1),
        )
        .unwrap();
    assert_eq!(crypto.total, 2);
    assert_eq!(crypto.total_pages, 2);
    assert_eq!(crypto.items.len(), 1);
    assert_eq!(crypto.items[0].order_id, bobs.order_id);

    assert!(harness.ledger.order_detail(bob, &bobs.order_id, false).is_ok());
    assert!(harness.ledger.order_detail(alice, &bobs.order_id, true).is_ok());
    assert!(matches!(
        harness.ledger.order_detail(alice, &bobs.order_id, false),
        Err(ServiceError::PermissionDenied(_))
    ));
}
