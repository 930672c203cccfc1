use chrono::{Duration, Utc};
use sea_orm::Database;
use uuid::Uuid;

use ledger::{
    Account, AccountKind, CreateAccountCmd, CreatePostCmd, CreateTransactionCmd, EntryDirection,
    EntryDraft, Ledger, LedgerError, MoneyCents, Post, TransactionListFilter, TransactionStatus,
    UpdateTransactionCmd,
};
use migration::MigratorTrait;

async fn ledger_with_db() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Ledger::builder().database(db).build().await.unwrap()
}

/// A ledger with a minimal chart of accounts: Cash (asset) and
/// Office Supplies (expense).
async fn ledger_with_accounts() -> (Ledger, Account, Account) {
    let ledger = ledger_with_db().await;
    let cash = ledger
        .create_account(CreateAccountCmd::new("Cash", AccountKind::Asset))
        .await
        .unwrap();
    let supplies = ledger
        .create_account(CreateAccountCmd::new("Office Supplies", AccountKind::Expense))
        .await
        .unwrap();
    (ledger, cash, supplies)
}

async fn make_post(ledger: &Ledger, content: &str) -> Post {
    ledger
        .create_post(CreatePostCmd::new("user-7", "finance-bot", content))
        .await
        .unwrap()
}

fn cents(major: f64) -> MoneyCents {
    MoneyCents::from_major_f64(major).unwrap()
}

fn balanced_cmd(post_id: Uuid, debit: Uuid, credit: Uuid, amount: MoneyCents) -> CreateTransactionCmd {
    CreateTransactionCmd::new(
        post_id,
        "Office supplies",
        Utc::now() - Duration::minutes(5),
        "user-7",
    )
    .entry(EntryDraft::debit(debit, amount))
    .entry(EntryDraft::credit(credit, amount))
}

#[tokio::test]
async fn balanced_creation_starts_pending() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid $500 for office supplies").await;

    let tx = ledger
        .create_transaction(balanced_cmd(post.id, supplies.id, cash.id, cents(500.0)))
        .await
        .unwrap();

    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.post_id, post.id);
    assert_eq!(tx.created_by, "user-7");
    assert!(tx.approved_by.is_none());
    assert_eq!(tx.entries.len(), 2);

    let fetched = ledger.transaction(tx.id).await.unwrap();
    assert_eq!(fetched.status, TransactionStatus::Pending);
    assert_eq!(fetched.entries.len(), 2);
    let debits: i64 = fetched
        .entries
        .iter()
        .filter(|e| e.direction == EntryDirection::Debit)
        .map(|e| e.amount.cents())
        .sum();
    assert_eq!(debits, 50_000);
}

#[tokio::test]
async fn unbalanced_creation_reports_delta_and_persists_nothing() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid for supplies").await;

    let cmd = CreateTransactionCmd::new(
        post.id,
        "Office supplies",
        Utc::now() - Duration::minutes(5),
        "user-7",
    )
    .entry(EntryDraft::debit(supplies.id, cents(100.0)))
    .entry(EntryDraft::credit(cash.id, cents(99.0)));

    let err = ledger.create_transaction(cmd).await.unwrap_err();
    match err {
        LedgerError::Unbalanced { delta } => assert_eq!(delta.to_string(), "1.00"),
        other => panic!("expected Unbalanced, got {other:?}"),
    }

    assert_eq!(ledger.transaction_for_post(post.id).await.unwrap(), None);
    let page = ledger
        .list_transactions(&TransactionListFilter::default(), None, 10)
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn fewer_than_two_entries_is_rejected() {
    let (ledger, _cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid for supplies").await;

    let cmd = CreateTransactionCmd::new(
        post.id,
        "Office supplies",
        Utc::now() - Duration::minutes(5),
        "user-7",
    )
    .entry(EntryDraft::debit(supplies.id, cents(500.0)));

    let err = ledger.create_transaction(cmd).await.unwrap_err();
    assert_eq!(err, LedgerError::InsufficientEntries(1));
}

#[tokio::test]
async fn malformed_entries_are_rejected() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid for supplies").await;

    // Both sides set on one line.
    let both = EntryDraft {
        account_id: supplies.id,
        debit: Some(cents(500.0)),
        credit: Some(cents(500.0)),
    };
    let cmd = CreateTransactionCmd::new(
        post.id,
        "Office supplies",
        Utc::now() - Duration::minutes(5),
        "user-7",
    )
    .entry(both)
    .entry(EntryDraft::credit(cash.id, cents(500.0)));
    let err = ledger.create_transaction(cmd).await.unwrap_err();
    assert!(matches!(err, LedgerError::MalformedEntry(_)));

    // Zero amount.
    let cmd = CreateTransactionCmd::new(
        post.id,
        "Office supplies",
        Utc::now() - Duration::minutes(5),
        "user-7",
    )
    .entry(EntryDraft::debit(supplies.id, MoneyCents::ZERO))
    .entry(EntryDraft::credit(cash.id, MoneyCents::ZERO));
    let err = ledger.create_transaction(cmd).await.unwrap_err();
    assert!(matches!(err, LedgerError::MalformedEntry(_)));
}

#[tokio::test]
async fn future_dates_are_rejected() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid for supplies").await;

    let cmd = CreateTransactionCmd::new(
        post.id,
        "Office supplies",
        Utc::now() + Duration::days(1),
        "user-7",
    )
    .entry(EntryDraft::debit(supplies.id, cents(500.0)))
    .entry(EntryDraft::credit(cash.id, cents(500.0)));

    let err = ledger.create_transaction(cmd).await.unwrap_err();
    assert_eq!(err, LedgerError::FutureDate);
}

#[tokio::test]
async fn unknown_and_inactive_accounts_are_rejected() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;

    let post = make_post(&ledger, "Paid for supplies").await;
    let ghost = Uuid::new_v4();
    let cmd = balanced_cmd(post.id, ghost, cash.id, cents(500.0));
    let err = ledger.create_transaction(cmd).await.unwrap_err();
    assert_eq!(err, LedgerError::UnknownAccount(ghost.to_string()));

    ledger.set_account_active(supplies.id, false).await.unwrap();
    let cmd = balanced_cmd(post.id, supplies.id, cash.id, cents(500.0));
    let err = ledger.create_transaction(cmd).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::InactiveAccount("Office Supplies".to_string())
    );

    // Nothing was linked by the failed attempts.
    assert_eq!(ledger.transaction_for_post(post.id).await.unwrap(), None);
}

#[tokio::test]
async fn a_post_converts_at_most_once() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid for supplies").await;

    ledger
        .create_transaction(balanced_cmd(post.id, supplies.id, cash.id, cents(500.0)))
        .await
        .unwrap();

    let err = ledger
        .create_transaction(balanced_cmd(post.id, supplies.id, cash.id, cents(100.0)))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::PostAlreadyLinked(post.id.to_string()));
}

#[tokio::test]
async fn approval_is_terminal() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid for supplies").await;
    let tx = ledger
        .create_transaction(balanced_cmd(post.id, supplies.id, cash.id, cents(500.0)))
        .await
        .unwrap();

    let approved = ledger.approve_transaction(tx.id, "manager-1").await.unwrap();
    assert_eq!(approved.status, TransactionStatus::Approved);
    assert_eq!(approved.approved_by.as_deref(), Some("manager-1"));
    assert!(approved.approved_at.is_some());

    let err = ledger
        .approve_transaction(tx.id, "manager-2")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition(_)));

    let err = ledger
        .reject_transaction(tx.id, "manager-2", Some("late"))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::TransactionLocked);

    let err = ledger
        .update_transaction(tx.id, UpdateTransactionCmd::new().description("edited"))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::TransactionLocked);

    // The stored record is untouched by the failed attempts.
    let fetched = ledger.transaction(tx.id).await.unwrap();
    assert_eq!(fetched.description, "Office supplies");
    assert_eq!(fetched.approved_by.as_deref(), Some("manager-1"));
}

#[tokio::test]
async fn rejection_keeps_reason_and_allows_resubmission() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid for supplies").await;
    let tx = ledger
        .create_transaction(balanced_cmd(post.id, supplies.id, cash.id, cents(500.0)))
        .await
        .unwrap();

    let rejected = ledger
        .reject_transaction(tx.id, "manager-1", Some("wrong amount"))
        .await
        .unwrap();
    assert_eq!(rejected.status, TransactionStatus::Rejected);
    assert_eq!(rejected.rejected_by.as_deref(), Some("manager-1"));
    assert_eq!(rejected.rejection_reason.as_deref(), Some("wrong amount"));

    // A second rejection of the same transaction fails.
    let err = ledger
        .reject_transaction(tx.id, "manager-2", None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition(_)));

    let amount = cents(550.0);
    let resubmitted = ledger
        .update_transaction(
            tx.id,
            UpdateTransactionCmd::new()
                .description("Office supplies, corrected")
                .entries(vec![
                    EntryDraft::debit(supplies.id, amount),
                    EntryDraft::credit(cash.id, amount),
                ]),
        )
        .await
        .unwrap();

    assert_eq!(resubmitted.status, TransactionStatus::Pending);
    assert_eq!(resubmitted.description, "Office supplies, corrected");
    assert!(resubmitted.rejected_by.is_none());
    assert!(resubmitted.rejection_reason.is_none());
    assert!(resubmitted.approved_by.is_none());
    assert_eq!(resubmitted.created_at, rejected.created_at);
    assert_eq!(resubmitted.entries.len(), 2);
    assert!(resubmitted.entries.iter().all(|e| e.amount.cents() == 55_000));

    // The resubmitted transaction can now be approved.
    let approved = ledger.approve_transaction(tx.id, "manager-1").await.unwrap();
    assert_eq!(approved.status, TransactionStatus::Approved);
}

#[tokio::test]
async fn failed_update_leaves_the_stored_record_alone() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid for supplies").await;
    let tx = ledger
        .create_transaction(balanced_cmd(post.id, supplies.id, cash.id, cents(500.0)))
        .await
        .unwrap();
    ledger
        .reject_transaction(tx.id, "manager-1", Some("check the receipt"))
        .await
        .unwrap();

    let err = ledger
        .update_transaction(
            tx.id,
            UpdateTransactionCmd::new().entries(vec![
                EntryDraft::debit(supplies.id, cents(100.0)),
                EntryDraft::credit(cash.id, cents(99.0)),
            ]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unbalanced { .. }));

    let fetched = ledger.transaction(tx.id).await.unwrap();
    assert_eq!(fetched.status, TransactionStatus::Rejected);
    assert_eq!(fetched.rejection_reason.as_deref(), Some("check the receipt"));
    assert!(fetched.entries.iter().all(|e| e.amount.cents() == 50_000));
}

#[tokio::test]
async fn update_without_new_entries_revalidates_the_existing_set() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;
    let post = make_post(&ledger, "Paid for supplies").await;
    let tx = ledger
        .create_transaction(balanced_cmd(post.id, supplies.id, cash.id, cents(500.0)))
        .await
        .unwrap();

    let updated = ledger
        .update_transaction(
            tx.id,
            UpdateTransactionCmd::new().occurred_at(Utc::now() - Duration::days(2)),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, TransactionStatus::Pending);
    assert_eq!(updated.entries.len(), 2);
}

#[tokio::test]
async fn listing_filters_by_status_and_paginates() {
    let (ledger, cash, supplies) = ledger_with_accounts().await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let post = make_post(&ledger, &format!("purchase {i}")).await;
        let cmd = CreateTransactionCmd::new(
            post.id,
            format!("purchase {i}"),
            Utc::now() - Duration::days(i + 1),
            "user-7",
        )
        .entry(EntryDraft::debit(supplies.id, cents(10.0)))
        .entry(EntryDraft::credit(cash.id, cents(10.0)));
        ids.push(ledger.create_transaction(cmd).await.unwrap().id);
    }
    ledger.approve_transaction(ids[0], "manager-1").await.unwrap();

    // Newest first.
    let page = ledger
        .list_transactions(&TransactionListFilter::default(), None, 10)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.items[0].id, ids[0]);
    assert!(page.next_cursor.is_none());

    // Status allow-list.
    let pending_only = TransactionListFilter {
        statuses: Some(vec![TransactionStatus::Pending]),
        ..Default::default()
    };
    let page = ledger.list_transactions(&pending_only, None, 10).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(page
        .items
        .iter()
        .all(|t| t.status == TransactionStatus::Pending));

    // Date window, [from, to).
    let window = TransactionListFilter {
        from: Some(Utc::now() - Duration::days(2) - Duration::hours(1)),
        to: Some(Utc::now()),
        ..Default::default()
    };
    let page = ledger.list_transactions(&window, None, 10).await.unwrap();
    assert_eq!(page.items.len(), 2);

    // Keyset pagination walks all rows exactly once.
    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = ledger
            .list_transactions(&TransactionListFilter::default(), cursor.as_deref(), 1)
            .await
            .unwrap();
        seen.extend(page.items.iter().map(|t| t.id));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    assert_eq!(seen, ids);
}

#[tokio::test]
async fn garbage_cursor_is_rejected() {
    let ledger = ledger_with_db().await;
    let err = ledger
        .list_transactions(&TransactionListFilter::default(), Some("not-a-cursor"), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn operations_on_unknown_transactions_fail_cleanly() {
    let ledger = ledger_with_db().await;
    let ghost = Uuid::new_v4();

    let err = ledger.transaction(ghost).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));

    let err = ledger.approve_transaction(ghost, "manager-1").await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));

    let err = ledger
        .update_transaction(ghost, UpdateTransactionCmd::new().description("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}
