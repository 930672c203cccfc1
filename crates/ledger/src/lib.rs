//! Double-entry ledger engine for post-driven bookkeeping.
//!
//! Users write informal posts; some of them get converted into formal
//! double-entry transactions that go through an approval workflow. This crate
//! is the engine behind that flow:
//!
//! - chart of accounts with soft-delete and case-insensitive uniqueness
//! - pure balance validation over debit/credit entry sets
//! - transaction lifecycle (pending → approved / rejected → resubmission)
//! - 1:1 post↔transaction linkage
//! - an advisory "this post sounds financial" heuristic
//!
//! All state lives in an injected [`sea_orm::DatabaseConnection`]; the
//! [`Ledger`] facade validates fully before the first write and performs
//! every multi-row mutation inside a single database transaction.

pub use accounts::{Account, AccountKind};
pub use balance::{BalanceTotals, compute_totals, validate_entry_set};
pub use commands::{
    CreateAccountCmd, CreatePostCmd, CreateTransactionCmd, UpdateTransactionCmd,
};
pub use detector::{FINANCIAL_TERMS, suggests_financial};
pub use entries::{Entry, EntryDirection, EntryDraft};
pub use error::LedgerError;
pub use money::MoneyCents;
pub use ops::{Ledger, LedgerBuilder, TransactionListFilter, TransactionPage};
pub use posts::{MAX_CONTENT_CHARS, Post};
pub use transactions::{Transaction, TransactionStatus};

pub mod accounts;
mod balance;
mod commands;
mod detector;
pub mod entries;
mod error;
mod money;
mod ops;
pub mod posts;
pub mod transactions;
mod util;

type ResultLedger<T> = Result<T, LedgerError>;
