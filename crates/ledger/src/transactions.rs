//! Transaction primitives.
//!
//! A [`Transaction`] is the formal double-entry record spawned from exactly
//! one post. It owns its [`Entry`](crate::Entry) set (minimum two lines) and
//! moves through a small state machine:
//!
//! ```text
//! create ──► pending ──approve──► approved   (terminal)
//!               ▲  └────reject──► rejected
//!               └────────edit─────────┘
//! ```
//!
//! `approved` is terminal; any further mutation fails. An edit to a rejected
//! (or still-pending) transaction re-validates the entry set and re-enters
//! `pending`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger, entries::Entry, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(LedgerError::InvalidTransition(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    /// The originating post. Immutable once set; the unique index on this
    /// column is what makes the post↔transaction link 1:1.
    pub post_id: Uuid,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub status: TransactionStatus,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<Entry>,
}

impl Transaction {
    pub fn new(
        post_id: Uuid,
        description: String,
        occurred_at: DateTime<Utc>,
        created_by: String,
    ) -> ResultLedger<Self> {
        if created_by.trim().is_empty() {
            return Err(LedgerError::InvalidAmount(
                "creator identity is required".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            post_id,
            description,
            occurred_at,
            status: TransactionStatus::Pending,
            created_by,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejection_reason: None,
            created_at: Utc::now(),
            entries: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub post_id: String,
    pub description: String,
    pub occurred_at: DateTimeUtc,
    pub status: String,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTimeUtc>,
    pub rejected_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
    #[sea_orm(
        belongs_to = "super::posts::Entity",
        from = "Column::PostId",
        to = "super::posts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Posts,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl Related<super::posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            post_id: ActiveValue::Set(tx.post_id.to_string()),
            description: ActiveValue::Set(tx.description.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            approved_by: ActiveValue::Set(tx.approved_by.clone()),
            approved_at: ActiveValue::Set(tx.approved_at),
            rejected_by: ActiveValue::Set(tx.rejected_by.clone()),
            rejection_reason: ActiveValue::Set(tx.rejection_reason.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            post_id: parse_uuid(&model.post_id, "post")?,
            description: model.description,
            occurred_at: model.occurred_at,
            status: TransactionStatus::try_from(model.status.as_str())?,
            created_by: model.created_by,
            approved_by: model.approved_by,
            approved_at: model.approved_at,
            rejected_by: model.rejected_by,
            rejection_reason: model.rejection_reason,
            created_at: model.created_at,
            entries: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Approved,
            TransactionStatus::Rejected,
        ] {
            assert_eq!(
                TransactionStatus::try_from(status.as_str()).unwrap(),
                status
            );
        }
        assert!(TransactionStatus::try_from("voided").is_err());
    }

    #[test]
    fn new_transaction_starts_pending() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            "Office supplies".to_string(),
            Utc::now(),
            "alice".to_string(),
        )
        .unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.approved_by.is_none());
    }
}
