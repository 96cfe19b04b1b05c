use chrono::NaiveDate;
use shared_types::{
    ContributionPayment, Installment, InstallmentStatus, Loan, LoanStatus, MoneyValue, UserRef,
};

pub(crate) fn loan(
    id: &str,
    user: (&str, &str),
    status: LoanStatus,
    installments: &[(f64, InstallmentStatus)],
) -> Loan {
    Loan {
        id: id.to_string(),
        user: Some(UserRef {
            id: user.0.to_string(),
            name: Some(user.1.to_string()),
        }),
        amount: MoneyValue::Number(1000.0),
        reason: format!("reason-{}", id),
        interest_rate: Some(8.0),
        duration_months: Some(installments.len() as u32),
        emi_start_date: NaiveDate::from_ymd_opt(2025, 1, 5),
        status,
        created_at: None,
        total_amount_payable: None,
        emi_amount: None,
        installments: installments
            .iter()
            .enumerate()
            .map(|(i, (amount, status))| Installment {
                ordinal: i as u32 + 1,
                amount: MoneyValue::Number(*amount),
                due_date: NaiveDate::from_ymd_opt(2025, i as u32 + 1, 5),
                status: *status,
            })
            .collect(),
    }
}

pub(crate) fn payment(id: &str, name: &str, month: &str, date: &str) -> ContributionPayment {
    ContributionPayment {
        id: id.to_string(),
        user: Some(UserRef {
            id: format!("user-{}", name.to_lowercase()),
            name: Some(name.to_string()),
        }),
        amount: MoneyValue::Number(600.0),
        month: month.to_string(),
        date: chrono::DateTime::parse_from_rfc3339(date)
            .ok()
            .map(|at| at.with_timezone(&chrono::Utc)),
    }
}
