//! Financial-activity detector.
//!
//! A deterministic, advisory heuristic over post content: if the text
//! mentions money, suggest converting the post into a transaction. The term
//! table is fixed so behavior is reproducible and unit-testable; false
//! positives and negatives are acceptable, and nothing in the engine gates on
//! the result.

/// Terms whose presence (case-insensitive substring) marks a post as
/// financially relevant: payment verbs, currency symbols, currency codes and
/// monetary nouns.
pub const FINANCIAL_TERMS: &[&str] = &[
    // payment verbs
    "paid",
    "pay",
    "bought",
    "purchase",
    "sold",
    "spent",
    "owe",
    "reimburse",
    "refund",
    "deposit",
    "withdraw",
    "invoice",
    "transfer",
    // currency symbols
    "$",
    "€",
    "£",
    "¥",
    // currency codes
    "usd",
    "eur",
    "gbp",
    // monetary nouns
    "payment",
    "expense",
    "revenue",
    "salary",
    "receipt",
    "budget",
    "price",
    "fee",
    "loan",
    "cash",
];

/// Returns `true` when the content matches the term table.
///
/// Advisory only; never blocks or forces transaction creation.
#[must_use]
pub fn suggests_financial(content: &str) -> bool {
    let lowered = content.to_lowercase();
    FINANCIAL_TERMS.iter().any(|term| lowered.contains(term))
}
