use chrono::{DateTime, NaiveDate, Utc};
use shared_types::{
    ContributionPayment, Installment, InstallmentStatus, Loan, LoanStatus, MoneyValue, UserRef,
};

pub fn loan(
    id: &str,
    user: Option<(&str, Option<&str>)>,
    amounts: &[(f64, InstallmentStatus)],
) -> Loan {
    Loan {
        id: id.to_string(),
        user: user.map(|(id, name)| UserRef {
            id: id.to_string(),
            name: name.map(str::to_string),
        }),
        amount: MoneyValue::Number(1000.0),
        reason: format!("reason-{}", id),
        interest_rate: None,
        duration_months: None,
        emi_start_date: None,
        status: LoanStatus::Approved,
        created_at: None,
        total_amount_payable: None,
        emi_amount: None,
        installments: amounts
            .iter()
            .enumerate()
            .map(|(i, (amount, status))| Installment {
                ordinal: i as u32 + 1,
                amount: MoneyValue::Number(*amount),
                due_date: NaiveDate::from_ymd_opt(2025, i as u32 % 12 + 1, 5),
                status: *status,
            })
            .collect(),
    }
}

pub fn payment(id: &str, user_name: Option<&str>, month: &str, date: &str) -> ContributionPayment {
    ContributionPayment {
        id: id.to_string(),
        user: Some(UserRef {
            id: format!("user-{}", id),
            name: user_name.map(str::to_string),
        }),
        amount: MoneyValue::Number(600.0),
        month: month.to_string(),
        date: DateTime::parse_from_rfc3339(date)
            .ok()
            .map(|at| at.with_timezone(&Utc)),
    }
}
