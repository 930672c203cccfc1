use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use sea_orm::{
    Condition, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    CreateTransactionCmd, Entry, EntryDraft, LedgerError, ResultLedger, Transaction,
    TransactionStatus, UpdateTransactionCmd, accounts, balance::validate_entry_set, entries,
    transactions,
};

use super::{Ledger, normalize_required_text, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, acts as an allow-list of statuses to return.
    pub statuses: Option<Vec<TransactionStatus>>,
}

/// One page of a transaction listing, newest first.
///
/// Entries are not loaded for listings; fetch the full aggregate with
/// [`Ledger::transaction`] when needed.
#[derive(Clone, Debug)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    /// Opaque cursor for the next page, `None` on the last page.
    pub next_cursor: Option<String>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultLedger<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(LedgerError::InvalidAmount(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.statuses.as_ref().is_some_and(|s| s.is_empty()) {
        return Err(LedgerError::InvalidAmount(
            "statuses must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    occurred_at: DateTime<Utc>,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultLedger<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| LedgerError::InvalidAmount("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultLedger<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| LedgerError::InvalidAmount("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| LedgerError::InvalidAmount("invalid transactions cursor".to_string()))
    }
}

impl Ledger {
    /// Converts a post into a formal transaction, initial status `pending`.
    ///
    /// Validation order: entry set shape and balance, date, post existence
    /// and linkage, account references. Nothing is written unless everything
    /// passes; the transaction row, its entry rows and the post
    /// back-reference are committed as one unit.
    pub async fn create_transaction(
        &self,
        cmd: CreateTransactionCmd,
    ) -> ResultLedger<Transaction> {
        validate_entry_set(&cmd.entries)?;
        if cmd.occurred_at > Utc::now() {
            return Err(LedgerError::FutureDate);
        }
        let created_by = normalize_required_text(&cmd.created_by, "creator id")?;

        let mut tx = Transaction::new(
            cmd.post_id,
            cmd.description.trim().to_string(),
            cmd.occurred_at,
            created_by,
        )?;
        for draft in &cmd.entries {
            tx.entries.push(Entry::from_draft(tx.id, draft)?);
        }

        with_tx!(self, |db_tx| {
            let post = crate::posts::Entity::find_by_id(cmd.post_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::NotFound("post not exists".to_string()))?;
            if post.transaction_id.is_some() {
                return Err(LedgerError::PostAlreadyLinked(cmd.post_id.to_string()));
            }

            self.require_active_accounts(&db_tx, &cmd.entries).await?;

            if let Err(err) = transactions::ActiveModel::from(&tx).insert(&db_tx).await {
                // The unique index on transactions.post_id is the
                // serialization point for the 1:1 link; probe it before
                // propagating an opaque driver error.
                let linked = transactions::Entity::find()
                    .filter(transactions::Column::PostId.eq(cmd.post_id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if linked {
                    tracing::warn!(post = %cmd.post_id, "post conversion race lost");
                    return Err(LedgerError::PostAlreadyLinked(cmd.post_id.to_string()));
                }
                return Err(err.into());
            }
            for entry in &tx.entries {
                entries::ActiveModel::from(entry).insert(&db_tx).await?;
            }

            self.link_post_to_transaction(&db_tx, cmd.post_id, tx.id)
                .await?;

            tracing::info!(id = %tx.id, post = %cmd.post_id, "transaction created");
            Ok(tx)
        })
    }

    /// Transitions a `pending` transaction to `approved` (terminal).
    ///
    /// The transition is a conditional write keyed on the stored status, so
    /// concurrent approve/reject calls serialize: exactly one wins, the other
    /// fails `InvalidTransition`.
    pub async fn approve_transaction(
        &self,
        transaction_id: Uuid,
        approver_id: &str,
    ) -> ResultLedger<Transaction> {
        let approver = normalize_required_text(approver_id, "approver id")?;

        let result = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::Status,
                Expr::value(TransactionStatus::Approved.as_str()),
            )
            .col_expr(
                transactions::Column::ApprovedBy,
                Expr::value(Some(approver.clone())),
            )
            .col_expr(
                transactions::Column::ApprovedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(transactions::Column::Id.eq(transaction_id.to_string()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending.as_str()))
            .exec(&self.database)
            .await?;

        if result.rows_affected == 0 {
            return Err(self.transition_conflict(transaction_id, "approve").await?);
        }

        tracing::info!(id = %transaction_id, approver = %approver, "transaction approved");
        self.transaction(transaction_id).await
    }

    /// Transitions a `pending` transaction to `rejected` (editable), keeping
    /// the rejector and an optional reason for the author to act on.
    ///
    /// No balance re-check: the entries are unchanged.
    pub async fn reject_transaction(
        &self,
        transaction_id: Uuid,
        rejected_by: &str,
        reason: Option<&str>,
    ) -> ResultLedger<Transaction> {
        let rejector = normalize_required_text(rejected_by, "rejector id")?;
        let reason = super::normalize_optional_text(reason);

        let result = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::Status,
                Expr::value(TransactionStatus::Rejected.as_str()),
            )
            .col_expr(
                transactions::Column::RejectedBy,
                Expr::value(Some(rejector.clone())),
            )
            .col_expr(
                transactions::Column::RejectionReason,
                Expr::value(reason),
            )
            .filter(transactions::Column::Id.eq(transaction_id.to_string()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending.as_str()))
            .exec(&self.database)
            .await?;

        if result.rows_affected == 0 {
            return Err(self.transition_conflict(transaction_id, "reject").await?);
        }

        tracing::info!(id = %transaction_id, rejector = %rejector, "transaction rejected");
        self.transaction(transaction_id).await
    }

    /// Edits a transaction and resubmits it for review.
    ///
    /// Allowed from `pending` and `rejected`; `approved` is locked. The
    /// effective entry set is re-validated before any write, a patched set
    /// replaces the old one wholesale, and the status always resets to
    /// `pending` with approval/rejection metadata cleared. On failure the
    /// stored aggregate is untouched.
    pub async fn update_transaction(
        &self,
        transaction_id: Uuid,
        patch: UpdateTransactionCmd,
    ) -> ResultLedger<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("transaction not exists".to_string()))?;
        if model.status == TransactionStatus::Approved.as_str() {
            return Err(LedgerError::TransactionLocked);
        }

        let occurred_at = patch.occurred_at.unwrap_or(model.occurred_at);
        if occurred_at > Utc::now() {
            return Err(LedgerError::FutureDate);
        }
        let description = match patch.description.as_deref() {
            Some(text) => text.trim().to_string(),
            None => model.description.clone(),
        };

        // Validate the exact set about to be committed, replacement or not.
        let effective_drafts: Vec<EntryDraft> = match &patch.entries {
            Some(drafts) => drafts.clone(),
            None => self
                .load_entries(&self.database, transaction_id)
                .await?
                .iter()
                .map(|entry| match entry.direction {
                    crate::EntryDirection::Debit => {
                        EntryDraft::debit(entry.account_id, entry.amount)
                    }
                    crate::EntryDirection::Credit => {
                        EntryDraft::credit(entry.account_id, entry.amount)
                    }
                })
                .collect(),
        };
        validate_entry_set(&effective_drafts)?;

        let replacement: Option<Vec<Entry>> = match &patch.entries {
            Some(drafts) => Some(
                drafts
                    .iter()
                    .map(|draft| Entry::from_draft(transaction_id, draft))
                    .collect::<ResultLedger<_>>()?,
            ),
            None => None,
        };

        with_tx!(self, |db_tx| {
            if let Some(drafts) = &patch.entries {
                self.require_active_accounts(&db_tx, drafts).await?;
            }

            let result = transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::Description,
                    Expr::value(description.clone()),
                )
                .col_expr(transactions::Column::OccurredAt, Expr::value(occurred_at))
                .col_expr(
                    transactions::Column::Status,
                    Expr::value(TransactionStatus::Pending.as_str()),
                )
                .col_expr(
                    transactions::Column::ApprovedBy,
                    Expr::value(None::<String>),
                )
                .col_expr(
                    transactions::Column::ApprovedAt,
                    Expr::value(None::<DateTime<Utc>>),
                )
                .col_expr(
                    transactions::Column::RejectedBy,
                    Expr::value(None::<String>),
                )
                .col_expr(
                    transactions::Column::RejectionReason,
                    Expr::value(None::<String>),
                )
                .filter(transactions::Column::Id.eq(transaction_id.to_string()))
                .filter(
                    transactions::Column::Status
                        .ne(TransactionStatus::Approved.as_str()),
                )
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                // Approved (or deleted) underneath us since the first read.
                return Err(self.transition_conflict(transaction_id, "update").await?);
            }

            if let Some(new_entries) = &replacement {
                entries::Entity::delete_many()
                    .filter(entries::Column::TransactionId.eq(transaction_id.to_string()))
                    .exec(&db_tx)
                    .await?;
                for entry in new_entries {
                    entries::ActiveModel::from(entry).insert(&db_tx).await?;
                }
            }

            tracing::info!(id = %transaction_id, "transaction updated, back to pending");
            Ok::<(), LedgerError>(())
        })?;

        self.transaction(transaction_id).await
    }

    /// Returns the full aggregate (transaction plus entries).
    pub async fn transaction(&self, transaction_id: Uuid) -> ResultLedger<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("transaction not exists".to_string()))?;

        let mut tx = Transaction::try_from(model)?;
        tx.entries = self.load_entries(&self.database, transaction_id).await?;
        Ok(tx)
    }

    /// Lists transactions newest first with keyset pagination.
    pub async fn list_transactions(
        &self,
        filter: &TransactionListFilter,
        cursor: Option<&str>,
        limit: u64,
    ) -> ResultLedger<TransactionPage> {
        validate_list_filter(filter)?;
        let limit = limit.clamp(1, 200);

        let mut query = transactions::Entity::find()
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit + 1);

        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::OccurredAt.lt(to));
        }
        if let Some(statuses) = &filter.statuses {
            let statuses: Vec<String> =
                statuses.iter().map(|s| s.as_str().to_string()).collect();
            query = query.filter(transactions::Column::Status.is_in(statuses));
        }

        if let Some(raw) = cursor {
            let cursor = TransactionsCursor::decode(raw)?;
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::OccurredAt.lt(cursor.occurred_at))
                    .add(
                        Condition::all()
                            .add(transactions::Column::OccurredAt.eq(cursor.occurred_at))
                            .add(transactions::Column::Id.lt(cursor.transaction_id)),
                    ),
            );
        }

        let mut models = query.all(&self.database).await?;
        let next_cursor = if models.len() as u64 > limit {
            models.truncate(limit as usize);
            models.last().map(|m| {
                TransactionsCursor {
                    occurred_at: m.occurred_at,
                    transaction_id: m.id.clone(),
                }
                .encode()
            })
        } else {
            None
        };
        let next_cursor = next_cursor.transpose()?;

        let items = models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;

        Ok(TransactionPage { items, next_cursor })
    }

    /// Ensures every referenced account exists and is active.
    ///
    /// Inactive accounts may still back historical entries, but new entries
    /// must not reference them.
    async fn require_active_accounts<C: ConnectionTrait>(
        &self,
        db: &C,
        drafts: &[EntryDraft],
    ) -> ResultLedger<()> {
        let ids: Vec<String> = {
            let mut seen: Vec<Uuid> = Vec::new();
            for draft in drafts {
                if !seen.contains(&draft.account_id) {
                    seen.push(draft.account_id);
                }
            }
            seen.iter().map(Uuid::to_string).collect()
        };

        let models = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids.clone()))
            .all(db)
            .await?;
        let by_id: HashMap<&str, &accounts::Model> =
            models.iter().map(|m| (m.id.as_str(), m)).collect();

        for id in &ids {
            match by_id.get(id.as_str()) {
                None => return Err(LedgerError::UnknownAccount(id.clone())),
                Some(model) if !model.active => {
                    return Err(LedgerError::InactiveAccount(model.name.clone()));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    async fn load_entries<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultLedger<Vec<Entry>> {
        let models = entries::Entity::find()
            .filter(entries::Column::TransactionId.eq(transaction_id.to_string()))
            .all(db)
            .await?;
        models.into_iter().map(Entry::try_from).collect()
    }

    /// Explains why a conditional status transition touched zero rows.
    async fn transition_conflict(
        &self,
        transaction_id: Uuid,
        action: &str,
    ) -> ResultLedger<LedgerError> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(&self.database)
            .await?;
        Ok(match model {
            None => LedgerError::NotFound("transaction not exists".to_string()),
            Some(model) if model.status == TransactionStatus::Approved.as_str() => {
                if action == "approve" {
                    LedgerError::InvalidTransition(
                        "transaction is already approved".to_string(),
                    )
                } else {
                    LedgerError::TransactionLocked
                }
            }
            Some(model) => LedgerError::InvalidTransition(format!(
                "cannot {action} a {} transaction",
                model.status
            )),
        })
    }
}
