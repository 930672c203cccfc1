//! Initial schema migration - creates all tables from scratch.
//!
//! - `posts`: free-text updates, each optionally linked to one transaction
//! - `accounts`: the chart of accounts, soft-deleted via `active`
//! - `transactions`: formal double-entry records with approval state
//! - `entries`: debit/credit lines owned by their transaction
//!
//! Two unique indexes carry the engine's concurrency guarantees:
//! `accounts(name_norm, kind)` and `transactions(post_id)`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Posts {
    Table,
    Id,
    AuthorId,
    Persona,
    Content,
    Attachments,
    TransactionId,
    CreatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    NameNorm,
    Kind,
    Category,
    Active,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    PostId,
    Description,
    OccurredAt,
    Status,
    CreatedBy,
    ApprovedBy,
    ApprovedAt,
    RejectedBy,
    RejectionReason,
    CreatedAt,
}

#[derive(Iden)]
enum Entries {
    Table,
    Id,
    TransactionId,
    AccountId,
    Direction,
    AmountMinor,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Posts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Posts::AuthorId).string().not_null())
                    .col(ColumnDef::new(Posts::Persona).string().not_null())
                    .col(ColumnDef::new(Posts::Content).string().not_null())
                    .col(ColumnDef::new(Posts::Attachments).string())
                    .col(ColumnDef::new(Posts::TransactionId).string())
                    .col(
                        ColumnDef::new(Posts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::NameNorm).string().not_null())
                    .col(ColumnDef::new(Accounts::Kind).string().not_null())
                    .col(ColumnDef::new(Accounts::Category).string())
                    .col(ColumnDef::new(Accounts::Active).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-name_norm-kind-unique")
                    .table(Accounts::Table)
                    .col(Accounts::NameNorm)
                    .col(Accounts::Kind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::PostId).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Transactions::ApprovedBy).string())
                    .col(
                        ColumnDef::new(Transactions::ApprovedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(Transactions::RejectedBy).string())
                    .col(ColumnDef::new(Transactions::RejectionReason).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-post_id")
                            .from(Transactions::Table, Transactions::PostId)
                            .to(Posts::Table, Posts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The 1:1 post↔transaction link.
        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-post_id-unique")
                    .table(Transactions::Table)
                    .col(Transactions::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-status")
                    .table(Transactions::Table)
                    .col(Transactions::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Entries::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Entries::AccountId).string().not_null())
                    .col(ColumnDef::new(Entries::Direction).string().not_null())
                    .col(
                        ColumnDef::new(Entries::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-transaction_id")
                            .from(Entries::Table, Entries::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-account_id")
                            .from(Entries::Table, Entries::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-transaction_id")
                    .table(Entries::Table)
                    .col(Entries::TransactionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Entries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        Ok(())
    }
}
