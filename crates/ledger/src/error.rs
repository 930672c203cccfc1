//! The module contains the errors the ledger can throw.
//!
//! Variants fall into three groups:
//!
//! - validation errors, correctable by the caller before any write
//!   ([`InvalidAccount`], [`Unbalanced`], [`FutureDate`], ...)
//! - state errors, conflicts with the persisted state including lost races
//!   ([`InvalidTransition`], [`TransactionLocked`], [`NotFound`])
//! - collaborator failures, propagated untouched ([`Database`])
//!
//!  [`InvalidAccount`]: LedgerError::InvalidAccount
//!  [`Unbalanced`]: LedgerError::Unbalanced
//!  [`FutureDate`]: LedgerError::FutureDate
//!  [`InvalidTransition`]: LedgerError::InvalidTransition
//!  [`TransactionLocked`]: LedgerError::TransactionLocked
//!  [`NotFound`]: LedgerError::NotFound
//!  [`Database`]: LedgerError::Database
use sea_orm::DbErr;
use thiserror::Error;

use crate::MoneyCents;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid account: {0}")]
    InvalidAccount(String),
    #[error("account \"{0}\" already exists for this type")]
    DuplicateAccount(String),
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    #[error("account \"{0}\" is inactive and cannot take new entries")]
    InactiveAccount(String),
    #[error("at least 2 entries are required, got {0}")]
    InsufficientEntries(usize),
    #[error("malformed entry: {0}")]
    MalformedEntry(String),
    #[error("entries do not balance: debits differ from credits by {delta}")]
    Unbalanced { delta: MoneyCents },
    #[error("transaction date must not be in the future")]
    FutureDate,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid post: {0}")]
    InvalidPost(String),
    #[error("post \"{0}\" is already linked to a transaction")]
    PostAlreadyLinked(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("approved transactions are immutable")]
    TransactionLocked,
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAccount(a), Self::InvalidAccount(b)) => a == b,
            (Self::DuplicateAccount(a), Self::DuplicateAccount(b)) => a == b,
            (Self::UnknownAccount(a), Self::UnknownAccount(b)) => a == b,
            (Self::InactiveAccount(a), Self::InactiveAccount(b)) => a == b,
            (Self::InsufficientEntries(a), Self::InsufficientEntries(b)) => a == b,
            (Self::MalformedEntry(a), Self::MalformedEntry(b)) => a == b,
            (Self::Unbalanced { delta: a }, Self::Unbalanced { delta: b }) => a == b,
            (Self::FutureDate, Self::FutureDate) => true,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidPost(a), Self::InvalidPost(b)) => a == b,
            (Self::PostAlreadyLinked(a), Self::PostAlreadyLinked(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::TransactionLocked, Self::TransactionLocked) => true,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
