//! Transaction entries.
//!
//! An [`Entry`] is a single debit or credit line owned by its parent
//! transaction. Entries never exist independently: the engine creates and
//! replaces them only as a whole set, so a persisted transaction is balanced
//! at every point in time.
//!
//! Amounts are stored as positive integer cents plus an explicit direction,
//! so each line is unambiguously a debit or a credit.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyCents, ResultLedger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl EntryDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl TryFrom<&str> for EntryDirection {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(LedgerError::MalformedEntry(format!(
                "invalid entry direction: {other}"
            ))),
        }
    }
}

/// Caller-supplied entry line, not yet validated.
///
/// Exactly one of `debit`/`credit` must be present and positive; the balance
/// validator rejects everything else before any write happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub account_id: Uuid,
    pub debit: Option<MoneyCents>,
    pub credit: Option<MoneyCents>,
}

impl EntryDraft {
    #[must_use]
    pub fn debit(account_id: Uuid, amount: MoneyCents) -> Self {
        Self {
            account_id,
            debit: Some(amount),
            credit: None,
        }
    }

    #[must_use]
    pub fn credit(account_id: Uuid, amount: MoneyCents) -> Self {
        Self {
            account_id,
            debit: None,
            credit: Some(amount),
        }
    }

    /// Splits the draft into direction + amount, rejecting malformed shapes.
    pub fn direction_amount(&self) -> ResultLedger<(EntryDirection, MoneyCents)> {
        match (self.debit, self.credit) {
            (Some(_), Some(_)) => Err(LedgerError::MalformedEntry(
                "an entry is either a debit or a credit, not both".to_string(),
            )),
            (None, None) => Err(LedgerError::MalformedEntry(
                "an entry needs a debit or a credit amount".to_string(),
            )),
            (Some(amount), None) if amount.is_positive() => Ok((EntryDirection::Debit, amount)),
            (None, Some(amount)) if amount.is_positive() => Ok((EntryDirection::Credit, amount)),
            _ => Err(LedgerError::MalformedEntry(
                "entry amounts must be positive".to_string(),
            )),
        }
    }
}

/// A validated, persisted entry line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub direction: EntryDirection,
    pub amount: MoneyCents,
}

impl Entry {
    /// Builds a persisted entry from a validated draft.
    pub fn from_draft(transaction_id: Uuid, draft: &EntryDraft) -> ResultLedger<Self> {
        let (direction, amount) = draft.direction_amount()?;
        Ok(Self {
            id: Uuid::new_v4(),
            transaction_id,
            account_id: draft.account_id,
            direction,
            amount,
        })
    }

    /// Signed amount: debits positive, credits negative.
    #[must_use]
    pub fn signed_amount(&self) -> MoneyCents {
        match self.direction {
            EntryDirection::Debit => self.amount,
            EntryDirection::Credit => -self.amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub account_id: String,
    pub direction: String,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Entry> for ActiveModel {
    fn from(entry: &Entry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            account_id: ActiveValue::Set(entry.account_id.to_string()),
            direction: ActiveValue::Set(entry.direction.as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount.cents()),
        }
    }
}

impl TryFrom<Model> for Entry {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: crate::util::parse_uuid(&model.id, "entry")?,
            transaction_id: crate::util::parse_uuid(&model.transaction_id, "transaction")?,
            account_id: crate::util::parse_uuid(&model.account_id, "account")?,
            direction: EntryDirection::try_from(model.direction.as_str())?,
            amount: MoneyCents::new(model.amount_minor),
        })
    }
}
