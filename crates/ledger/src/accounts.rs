//! Chart of accounts.
//!
//! An [`Account`] is a named, typed bucket that transaction entries reference.
//! Accounts are soft-deleted (`active = false`) and never removed, so
//! historical entries always resolve. The `(name, kind)` pair is unique,
//! case-insensitively, via the normalized `name_norm` column.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, util::normalize_name};

/// The five recognized account types of double-entry bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            other => Err(LedgerError::InvalidAccount(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier, generated once and persisted, so the account can be
    /// renamed without breaking entry references.
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub category: Option<String>,
    pub active: bool,
}

impl Account {
    pub fn new(name: String, kind: AccountKind, category: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            kind,
            category,
            active: true,
        }
    }

    /// The case-insensitive key used for uniqueness and search.
    pub fn name_norm(&self) -> String {
        normalize_name(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub category: Option<String>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            name: ActiveValue::Set(account.name.clone()),
            name_norm: ActiveValue::Set(account.name_norm()),
            kind: ActiveValue::Set(account.kind.as_str().to_string()),
            category: ActiveValue::Set(account.category.clone()),
            active: ActiveValue::Set(account.active),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("account".to_string()))?,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            category: model.category,
            active: model.active,
        })
    }
}
