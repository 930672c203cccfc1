//! Balance validation for candidate entry sets.
//!
//! Pure and stateless: the lifecycle operations call [`validate_entry_set`]
//! against the exact set about to be committed, before any write. Totals are
//! integer cents; decimal input has already been rounded to cents at the
//! boundary, so "balanced" is exact equality here (equivalent to the sub-cent
//! `|Δ| < 0.01` tolerance on raw decimal amounts).

use crate::{EntryDirection, EntryDraft, LedgerError, MoneyCents, ResultLedger};

/// Debit/credit totals for a candidate entry set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceTotals {
    pub total_debits: MoneyCents,
    pub total_credits: MoneyCents,
    /// `total_debits - total_credits`.
    pub delta: MoneyCents,
    pub is_balanced: bool,
}

/// Sums debits and credits over the drafts.
///
/// Malformed drafts (both/neither sides, non-positive amounts) contribute
/// nothing to either total; [`validate_entry_set`] is the gate that rejects
/// them. This function never fails.
#[must_use]
pub fn compute_totals(entries: &[EntryDraft]) -> BalanceTotals {
    let mut total_debits = MoneyCents::ZERO;
    let mut total_credits = MoneyCents::ZERO;

    for draft in entries {
        match draft.direction_amount() {
            Ok((EntryDirection::Debit, amount)) => total_debits += amount,
            Ok((EntryDirection::Credit, amount)) => total_credits += amount,
            Err(_) => {}
        }
    }

    let delta = total_debits - total_credits;
    BalanceTotals {
        total_debits,
        total_credits,
        delta,
        is_balanced: delta.is_zero(),
    }
}

/// Validates a candidate entry set for commit.
///
/// Checks, in order: at least two entries, every entry well-formed, debits
/// equal credits. The returned [`Unbalanced`](LedgerError::Unbalanced) carries
/// the computed delta so callers can explain the problem.
pub fn validate_entry_set(entries: &[EntryDraft]) -> ResultLedger<()> {
    if entries.len() < 2 {
        return Err(LedgerError::InsufficientEntries(entries.len()));
    }
    for draft in entries {
        draft.direction_amount()?;
    }
    let totals = compute_totals(entries);
    if !totals.is_balanced {
        return Err(LedgerError::Unbalanced {
            delta: totals.delta,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn debit(cents: i64) -> EntryDraft {
        EntryDraft::debit(Uuid::new_v4(), MoneyCents::new(cents))
    }

    fn credit(cents: i64) -> EntryDraft {
        EntryDraft::credit(Uuid::new_v4(), MoneyCents::new(cents))
    }

    #[test]
    fn balanced_pair_has_zero_delta() {
        let totals = compute_totals(&[debit(10_000), credit(10_000)]);
        assert_eq!(totals.total_debits.cents(), 10_000);
        assert_eq!(totals.total_credits.cents(), 10_000);
        assert!(totals.is_balanced);
        assert!(validate_entry_set(&[debit(10_000), credit(10_000)]).is_ok());
    }

    #[test]
    fn unbalanced_set_reports_delta() {
        let err = validate_entry_set(&[debit(10_000), credit(9_900)]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Unbalanced {
                delta: MoneyCents::new(100)
            }
        );
    }

    #[test]
    fn decimal_input_rounded_at_boundary_balances_exactly() {
        // 0.1 + 0.2 vs 0.3 would fail a raw f64 comparison.
        let a = MoneyCents::from_major_f64(0.1).unwrap();
        let b = MoneyCents::from_major_f64(0.2).unwrap();
        let c = MoneyCents::from_major_f64(0.3).unwrap();
        let set = [
            EntryDraft::debit(Uuid::new_v4(), a),
            EntryDraft::debit(Uuid::new_v4(), b),
            EntryDraft::credit(Uuid::new_v4(), c),
        ];
        assert!(compute_totals(&set).is_balanced);
    }

    #[test]
    fn fewer_than_two_entries_is_insufficient() {
        assert_eq!(
            validate_entry_set(&[]).unwrap_err(),
            LedgerError::InsufficientEntries(0)
        );
        assert_eq!(
            validate_entry_set(&[debit(100)]).unwrap_err(),
            LedgerError::InsufficientEntries(1)
        );
    }

    #[test]
    fn malformed_entries_are_rejected_before_balance() {
        let both = EntryDraft {
            account_id: Uuid::new_v4(),
            debit: Some(MoneyCents::new(100)),
            credit: Some(MoneyCents::new(100)),
        };
        assert!(matches!(
            validate_entry_set(&[both, credit(100)]).unwrap_err(),
            LedgerError::MalformedEntry(_)
        ));

        let neither = EntryDraft {
            account_id: Uuid::new_v4(),
            debit: None,
            credit: None,
        };
        assert!(matches!(
            validate_entry_set(&[neither, credit(100)]).unwrap_err(),
            LedgerError::MalformedEntry(_)
        ));

        assert!(matches!(
            validate_entry_set(&[debit(0), credit(0)]).unwrap_err(),
            LedgerError::MalformedEntry(_)
        ));
    }

    #[test]
    fn multi_line_sets_balance_across_entries() {
        let set = [debit(7_500), debit(2_500), credit(6_000), credit(4_000)];
        assert!(validate_entry_set(&set).is_ok());
    }
}
