//! Ledger replay tests: the entry log alone reproduces every balance.

mod common;

use common::{TestHarness, ADMIN};
use orbia_ledger_core::{
    AccountId, Actor, ConfirmProof, EntryFilter, EntryStatus, LedgerEntry, PageRequest,
};
use orbia_ledger_service::DebitRequest;

fn all_entries(harness: &TestHarness, account: AccountId) -> Vec<LedgerEntry> {
    let mut entries = Vec::new();
    let mut page = 1_u64;
    loop {
        let batch = harness
            .ledger
            .list_transactions(account, &EntryFilter::default(), PageRequest::new(i64::try_from(page).unwrap(), 3))
            .unwrap();
        entries.extend(batch.items);
        if page >= batch.total_pages {
            break;
        }
        page += 1;
    }
    entries
}

#[test]
fn replaying_entries_reproduces_balances() {
    let harness = TestHarness::new();
    let account = AccountId::new(42);

    harness.fund(account, 10_000);
    for amount in [1_250, 300, 4_000] {
        harness
            .ledger
            .debit(DebitRequest {
                account_id: account,
                amount_cents: amount,
                related_order_type: Some("campaign".into()),
                related_order_id: None,
                remark: None,
            })
            .unwrap();
    }
    harness.fund(account, 2_500);
    // Refused debit leaves no trace.
    assert!(harness
        .ledger
        .debit(DebitRequest {
            account_id: account,
            amount_cents: 1_000_000,
            related_order_type: None,
            related_order_id: None,
            remark: None,
        })
        .is_err());
    // Rejected order leaves no trace.
    let rejected = harness.pending_order(account, 9_999);
    harness
        .ledger
        .reject(&rejected.order_id, Actor::Admin(ADMIN), "no payment")
        .unwrap();

    let mut entries = all_entries(&harness, account);
    assert_eq!(entries.len(), 5);
    entries.reverse();

    let mut balance = 0;
    let mut recharged = 0;
    let mut consumed = 0;
    for entry in &entries {
        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(entry.balance_before_cents, balance, "{}", entry.transaction_id);
        balance += entry.signed_amount();
        assert_eq!(entry.balance_after_cents, balance, "{}", entry.transaction_id);
        if entry.signed_amount() > 0 {
            recharged += entry.amount_cents;
        } else {
            consumed += entry.amount_cents;
        }
    }

    let wallet = harness.ledger.wallet_info(account).unwrap();
    assert_eq!(wallet.balance_cents, balance);
    assert_eq!(wallet.total_recharge_cents, recharged);
    assert_eq!(wallet.total_consume_cents, consumed);
    assert_eq!(balance, 6_950);
}

#[test]
fn ensure_wallet_is_idempotent() {
    let harness = TestHarness::new();
    let account = AccountId::new(42);

    let created = harness.ledger.ensure_wallet(account).unwrap();
    assert_eq!(created.balance_cents, 0);

    harness.fund(account, 700);
    let again = harness.ledger.ensure_wallet(account).unwrap();
    assert_eq!(again.balance_cents, 700);
    assert_eq!(again.total_recharge_cents, 700);
}

#[test]
fn recharges_on_many_accounts_stay_separate() {
    let harness = TestHarness::new();
    let orders: Vec<_> = (1..=4)
        .map(|n| harness.pending_order(AccountId::new(n), n * 100))
        .collect();
    let ledger = &harness.ledger;

    std::thread::scope(|scope| {
        for order in &orders {
            scope.spawn(move || {
                ledger
                    .confirm(&order.order_id, Actor::Admin(ADMIN), ConfirmProof::default())
                    .unwrap()
            });
        }
    });

    for n in 1..=4 {
        let account = AccountId::new(n);
        assert_eq!(ledger.wallet_info(account).unwrap().balance_cents, n * 100);
        assert_eq!(all_entries(&harness, account).len(), 1);
    }
}
