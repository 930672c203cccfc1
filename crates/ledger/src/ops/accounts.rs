use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountKind, CreateAccountCmd, LedgerError, ResultLedger, accounts,
    util::normalize_name,
};

use super::{Ledger, with_tx};

impl Ledger {
    /// Adds an account to the chart of accounts.
    ///
    /// The `(name, kind)` pair is unique case-insensitively. The pre-check
    /// gives a friendly error in the common case; the unique index on
    /// `(name_norm, kind)` is what guarantees it under concurrent creation,
    /// so a failed insert is probed for a duplicate before being propagated.
    pub async fn create_account(&self, cmd: CreateAccountCmd) -> ResultLedger<Account> {
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidAccount(
                "account name must not be empty".to_string(),
            ));
        }

        let mut account = Account::new(
            name.to_string(),
            cmd.kind,
            super::normalize_optional_text(cmd.category.as_deref()),
        );
        account.active = cmd.active;
        let name_norm = account.name_norm();

        with_tx!(self, |db_tx| {
            let existing = accounts::Entity::find()
                .filter(accounts::Column::NameNorm.eq(name_norm.clone()))
                .filter(accounts::Column::Kind.eq(cmd.kind.as_str()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(LedgerError::DuplicateAccount(account.name));
            }

            if let Err(err) = accounts::ActiveModel::from(&account).insert(&db_tx).await {
                let lost_race = accounts::Entity::find()
                    .filter(accounts::Column::NameNorm.eq(name_norm.clone()))
                    .filter(accounts::Column::Kind.eq(cmd.kind.as_str()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if lost_race {
                    tracing::warn!(name = %account.name, "lost account creation race");
                    return Err(LedgerError::DuplicateAccount(account.name));
                }
                return Err(err.into());
            }

            tracing::info!(id = %account.id, name = %account.name, kind = account.kind.as_str(), "account created");
            Ok(account)
        })
    }

    /// Activates or deactivates an account. Idempotent; accounts are never
    /// physically removed, historical entries keep referencing them.
    pub async fn set_account_active(&self, account_id: Uuid, active: bool) -> ResultLedger<()> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("account not exists".to_string()))?;

        if model.active == active {
            return Ok(());
        }

        let update = accounts::ActiveModel {
            id: ActiveValue::Set(model.id),
            active: ActiveValue::Set(active),
            ..Default::default()
        };
        update.update(&self.database).await?;
        tracing::info!(id = %account_id, active, "account active flag changed");
        Ok(())
    }

    /// Returns an account by id.
    pub async fn account(&self, account_id: Uuid) -> ResultLedger<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    /// Lists accounts of one kind, name-ordered. Inactive accounts are
    /// excluded unless requested.
    pub async fn list_accounts_by_kind(
        &self,
        kind: AccountKind,
        include_inactive: bool,
    ) -> ResultLedger<Vec<Account>> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::Kind.eq(kind.as_str()))
            .order_by_asc(accounts::Column::NameNorm);
        if !include_inactive {
            query = query.filter(accounts::Column::Active.eq(true));
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(Account::try_from).collect()
    }

    /// Case-insensitive substring search over account names, used to
    /// deduplicate "create inline" prompts. Includes inactive accounts so a
    /// near-duplicate can be reactivated instead of recreated.
    pub async fn find_accounts_by_name(
        &self,
        query: &str,
        kind: Option<AccountKind>,
    ) -> ResultLedger<Vec<Account>> {
        let needle = normalize_name(query);
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut select = accounts::Entity::find()
            .filter(accounts::Column::NameNorm.contains(&needle))
            .order_by_asc(accounts::Column::NameNorm);
        if let Some(kind) = kind {
            select = select.filter(accounts::Column::Kind.eq(kind.as_str()));
        }

        let models = select.all(&self.database).await?;
        models.into_iter().map(Account::try_from).collect()
    }
}
