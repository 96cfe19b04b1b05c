use shared_types::{EmiRow, InstallmentStatus, Loan, LoanLedger};
use tracing::debug;

use crate::format::{format_amount, user_display_name, DisplayFormat};

/// Expands loans into one row per installment, loan order first, then ordinal.
pub fn flatten_installments(loans: &[Loan], format: &DisplayFormat) -> Vec<EmiRow> {
    let rows: Vec<EmiRow> = loans
        .iter()
        .flat_map(|loan| {
            let user_name = user_display_name(loan.user.as_ref());
            loan.installments.iter().map(move |installment| EmiRow {
                loan_id: loan.id.clone(),
                loan_reason: loan.reason.clone(),
                loan_status: loan.status,
                user_id: loan.user_id().map(str::to_string),
                user_name: user_name.clone(),
                ordinal: installment.ordinal,
                amount: format_amount(&installment.amount),
                due_date: format.date(installment.due_date),
                status: installment.status,
            })
        })
        .collect();

    debug!(loans = loans.len(), rows = rows.len(), "Flattened installments");
    rows
}

/// Paid and pending tallies for a single loan
pub fn loan_ledger(loan: &Loan) -> LoanLedger {
    let mut ledger = LoanLedger {
        loan_id: loan.id.clone(),
        installment_count: loan.installments.len(),
        ..Default::default()
    };

    for installment in &loan.installments {
        let amount = installment.amount.or_zero();
        match installment.status {
            InstallmentStatus::Paid => {
                ledger.paid_count += 1;
                ledger.paid_total += amount;
            }
            InstallmentStatus::Pending => {
                ledger.pending_count += 1;
                ledger.pending_total += amount;
            }
        }
    }

    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::loan;

    #[test]
    fn test_empty_input() {
        assert!(flatten_installments(&[], &DisplayFormat::default()).is_empty());
    }

    #[test]
    fn test_order_and_ordinals_restart_per_loan() {
        use InstallmentStatus::*;
        let loans = vec![
            loan("L1", Some(("u1", Some("Asha"))), &[(100.0, Paid), (100.0, Pending)]),
            loan("L2", Some(("u2", Some("Ravi"))), &[(250.0, Pending)]),
        ];

        let rows = flatten_installments(&loans, &DisplayFormat::default());
        let keys: Vec<(&str, u32)> = rows.iter().map(|r| (r.loan_id.as_str(), r.ordinal)).collect();
        assert_eq!(keys, vec![("L1", 1), ("L1", 2), ("L2", 1)]);
        assert_eq!(rows[2].amount, "250.00");
        assert_eq!(rows[2].user_name, "Ravi");
    }

    #[test]
    fn test_row_count_matches_installment_count() {
        use InstallmentStatus::*;
        let loans = vec![
            loan("A", None, &[]),
            loan("B", Some(("u1", None)), &[(1.0, Paid), (2.0, Paid), (3.0, Pending)]),
            loan("C", Some(("u2", Some("Meena"))), &[(4.0, Pending)]),
        ];
        let expected: usize = loans.iter().map(|l| l.installments.len()).sum();

        let rows = flatten_installments(&loans, &DisplayFormat::default());
        assert_eq!(rows.len(), expected);
        assert!(rows.iter().all(|r| r.loan_id != "A"));
    }

    #[test]
    fn test_missing_user_name_uses_sentinel() {
        let loans = vec![
            loan("A", None, &[(10.0, InstallmentStatus::Pending)]),
            loan("B", Some(("u1", None)), &[(10.0, InstallmentStatus::Pending)]),
        ];

        let rows = flatten_installments(&loans, &DisplayFormat::default());
        assert_eq!(rows[0].user_name, "Unknown");
        assert_eq!(rows[0].user_id, None);
        assert_eq!(rows[1].user_name, "Unknown");
        assert_eq!(rows[1].user_id.as_deref(), Some("u1"));
        assert_eq!(rows[0].due_date, "05/01/2025");
    }

    #[test]
    fn test_loan_ledger_paid_and_pending() {
        use InstallmentStatus::*;
        let loan = loan("L", Some(("u1", Some("Asha"))), &[(500.0, Paid), (500.0, Pending)]);

        let ledger = loan_ledger(&loan);
        assert_eq!(format!("{:.2}", ledger.paid_total), "500.00");
        assert_eq!(ledger.pending_count, 1);
        assert_eq!(ledger.paid_count, 1);
        assert_eq!(ledger.pending_total, 500.0);

        let rows = flatten_installments(std::slice::from_ref(&loan), &DisplayFormat::default());
        let ordinals: Vec<u32> = rows.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
    }
}
