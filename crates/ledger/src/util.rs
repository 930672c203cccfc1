//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! parsing and normalization so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

/// Normalizes a name for case-insensitive comparison: NFKC, lowercased,
/// whitespace-trimmed.
pub(crate) fn normalize_name(value: &str) -> String {
    value.trim().nfkc().collect::<String>().to_lowercase()
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultLedger<Uuid> {
    Uuid::parse_str(value).map_err(|_| LedgerError::NotFound(label.to_string()))
}
