//! Client-side guards on loan status transitions, installment updates and form submissions.
//!
//! Every check here runs before a request is built. A failed check means no request is sent.

use chrono::NaiveDate;
use shared_types::{
    CreateLoanRequest, CreatePaymentRequest, InstallmentStatus, LedgerError, Loan, LoanStatus,
    LoanUpdate, Role,
};

/// Whether an admin edit may move a loan from `from` to `to`.
///
/// Nothing leaves `completed`. Every other move, including a revert to `pending`, is open to
/// the admin edit form.
pub fn can_transition(from: LoanStatus, to: LoanStatus) -> bool {
    match (from, to) {
        (LoanStatus::Completed, _) => false,
        (LoanStatus::Pending | LoanStatus::Approved | LoanStatus::Rejected, _) => true,
    }
}

/// Raw values of the admin loan-edit form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanUpdateForm {
    pub status: String,
    pub interest_rate: String,
    pub duration: String,
    pub emi_start_date: String,
}

impl LoanUpdateForm {
    pub fn status(status: LoanStatus) -> Self {
        Self {
            status: status.as_str().to_string(),
            ..Default::default()
        }
    }

    pub fn approve(interest_rate: &str, duration: &str, emi_start_date: &str) -> Self {
        Self {
            status: LoanStatus::Approved.as_str().to_string(),
            interest_rate: interest_rate.to_string(),
            duration: duration.to_string(),
            emi_start_date: emi_start_date.to_string(),
        }
    }
}

pub fn validate_loan_update(
    current: LoanStatus,
    form: &LoanUpdateForm,
) -> Result<LoanUpdate, LedgerError> {
    let status: LoanStatus = form.status.parse().map_err(|_| {
        LedgerError::validation(
            "status",
            "Status must be one of pending, approved, rejected or completed",
        )
    })?;

    if !can_transition(current, status) {
        return Err(LedgerError::InvalidTransition {
            from: current.to_string(),
            to: status.to_string(),
        });
    }

    if status != LoanStatus::Approved {
        return Ok(LoanUpdate {
            status,
            interest_rate: None,
            duration: None,
            emi_start_date: None,
        });
    }

    let interest_rate = form.interest_rate.trim();
    let duration = form.duration.trim();
    let emi_start_date = form.emi_start_date.trim();

    let missing: Vec<(&str, &str)> = [
        ("interestRate", "interest rate", interest_rate),
        ("duration", "duration", duration),
        ("emiStartDate", "EMI start date", emi_start_date),
    ]
    .into_iter()
    .filter(|(_, _, value)| value.is_empty())
    .map(|(field, label, _)| (field, label))
    .collect();

    if let Some((field, _)) = missing.first() {
        let labels: Vec<&str> = missing.iter().map(|(_, label)| *label).collect();
        return Err(LedgerError::validation(
            field,
            format!("Approving a loan requires {}", labels.join(", ")),
        ));
    }

    let rate: f64 = interest_rate
        .parse()
        .map_err(|_| LedgerError::validation("interestRate", "Interest rate must be a number"))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(LedgerError::validation(
            "interestRate",
            "Interest rate must be greater than 0",
        ));
    }

    let months: i64 = duration.parse().map_err(|_| {
        LedgerError::validation("duration", "Duration must be a whole number of months")
    })?;
    if months < 1 {
        return Err(LedgerError::validation(
            "duration",
            "Duration must be at least 1 month",
        ));
    }
    let months = u32::try_from(months)
        .map_err(|_| LedgerError::validation("duration", "Duration is too long"))?;

    let start = NaiveDate::parse_from_str(emi_start_date, "%Y-%m-%d").map_err(|_| {
        LedgerError::InvalidDate {
            field: "emiStartDate".to_string(),
            value: emi_start_date.to_string(),
        }
    })?;

    Ok(LoanUpdate {
        status,
        interest_rate: Some(rate),
        duration: Some(months),
        emi_start_date: Some(start),
    })
}

pub fn validate_loan_request(amount: &str, reason: &str) -> Result<CreateLoanRequest, LedgerError> {
    let amount = amount.trim();
    let reason = reason.trim();
    if amount.is_empty() || reason.is_empty() {
        let field = if amount.is_empty() { "amount" } else { "reason" };
        return Err(LedgerError::validation(field, "All loan fields are required"));
    }

    let amount: f64 = amount
        .parse()
        .map_err(|_| LedgerError::validation("amount", "Loan amount must be a number"))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::validation("amount", "Loan amount must be positive"));
    }

    Ok(CreateLoanRequest {
        amount,
        reason: reason.to_string(),
    })
}

/// Contributions must be for a named month and exactly the configured monthly amount
pub fn validate_contribution(
    month: &str,
    amount: Option<f64>,
    configured_amount: Option<f64>,
) -> Result<CreatePaymentRequest, LedgerError> {
    let month = month.trim();
    if month.is_empty() {
        return Err(LedgerError::validation("month", "Month is required"));
    }

    let configured = configured_amount
        .filter(|a| a.is_finite() && *a > 0.0)
        .ok_or_else(|| LedgerError::validation("amount", "Payment amount not available"))?;

    let amount = amount.unwrap_or(configured);
    if (amount - configured).abs() >= 0.005 {
        return Err(LedgerError::validation(
            "amount",
            format!("Amount must be {:.2}", configured),
        ));
    }

    Ok(CreatePaymentRequest {
        amount: configured,
        month: month.to_string(),
    })
}

/// Who is attempting an installment update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub role: Role,
    pub user_id: Option<String>,
}

/// Admins may set any installment status; members may only pay their own pending
/// installment. Nothing changes once the loan is completed.
pub fn validate_installment_change(
    loan: &Loan,
    ordinal: u32,
    new_status: InstallmentStatus,
    actor: &Actor,
) -> Result<(), LedgerError> {
    if loan.status.is_terminal() {
        return Err(LedgerError::validation(
            "status",
            "Installments of a completed loan can no longer change",
        ));
    }

    let installment = loan
        .installment(ordinal)
        .ok_or_else(|| LedgerError::InstallmentNotFound {
            loan_id: loan.id.clone(),
            ordinal,
        })?;

    if actor.role.is_admin() {
        return Ok(());
    }

    let owns_loan = match (&actor.user_id, loan.user_id()) {
        (Some(actor_id), Some(owner_id)) => actor_id == owner_id,
        _ => false,
    };
    if !owns_loan {
        return Err(LedgerError::validation(
            "loan",
            "Only the owner of a loan can pay its installments",
        ));
    }

    if new_status != InstallmentStatus::Paid || installment.is_paid() {
        return Err(LedgerError::validation(
            "status",
            "Only a pending installment can be marked as paid",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::loan;
    use shared_types::InstallmentStatus::*;

    #[test]
    fn test_approval_without_emi_parameters_is_rejected() {
        let form = LoanUpdateForm::approve("", "", "");
        let err = validate_loan_update(LoanStatus::Pending, &form).unwrap_err();

        assert_eq!(err.field(), Some("interestRate"));
        assert_eq!(
            err.to_string(),
            "Approving a loan requires interest rate, duration, EMI start date"
        );
    }

    #[test]
    fn test_approval_with_parameters_proceeds() {
        let form = LoanUpdateForm::approve("7.5", "12", "2025-02-01");
        let update = validate_loan_update(LoanStatus::Pending, &form).unwrap();

        assert_eq!(update.status, LoanStatus::Approved);
        assert_eq!(update.interest_rate, Some(7.5));
        assert_eq!(update.duration, Some(12));
        assert_eq!(update.emi_start_date, NaiveDate::from_ymd_opt(2025, 2, 1));
    }

    #[test]
    fn test_approval_rejects_non_positive_values() {
        let zero_rate = LoanUpdateForm::approve("0", "12", "2025-02-01");
        assert_eq!(
            validate_loan_update(LoanStatus::Pending, &zero_rate).unwrap_err().field(),
            Some("interestRate")
        );

        let zero_months = LoanUpdateForm::approve("7", "0", "2025-02-01");
        assert_eq!(
            validate_loan_update(LoanStatus::Pending, &zero_months).unwrap_err().field(),
            Some("duration")
        );

        let bad_date = LoanUpdateForm::approve("7", "6", "01/02/2025");
        assert!(matches!(
            validate_loan_update(LoanStatus::Pending, &bad_date),
            Err(LedgerError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_only_missing_fields_are_listed() {
        let form = LoanUpdateForm::approve("8", "", "");
        let err = validate_loan_update(LoanStatus::Pending, &form).unwrap_err();
        assert_eq!(err.field(), Some("duration"));
        assert_eq!(err.to_string(), "Approving a loan requires duration, EMI start date");
    }

    #[test]
    fn test_other_transitions_need_no_parameters() {
        let update =
            validate_loan_update(LoanStatus::Pending, &LoanUpdateForm::status(LoanStatus::Rejected))
                .unwrap();
        assert_eq!(update.status, LoanStatus::Rejected);
        assert_eq!(update.interest_rate, None);

        let revert =
            validate_loan_update(LoanStatus::Approved, &LoanUpdateForm::status(LoanStatus::Pending));
        assert!(revert.is_ok());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let form = LoanUpdateForm {
            status: "archived".to_string(),
            ..Default::default()
        };
        let err = validate_loan_update(LoanStatus::Pending, &form).unwrap_err();
        assert_eq!(err.field(), Some("status"));
    }

    #[test]
    fn test_nothing_leaves_completed() {
        for to in LoanStatus::ALL {
            assert!(!can_transition(LoanStatus::Completed, to));
        }
        assert!(can_transition(LoanStatus::Pending, LoanStatus::Completed));
        assert!(can_transition(LoanStatus::Rejected, LoanStatus::Approved));

        let err = validate_loan_update(
            LoanStatus::Completed,
            &LoanUpdateForm::status(LoanStatus::Pending),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransition { .. }));
    }

    #[test]
    fn test_loan_request_validation() {
        assert!(validate_loan_request("", "Medical").is_err());
        assert!(validate_loan_request("5000", " ").is_err());
        assert_eq!(
            validate_loan_request("-10", "Medical").unwrap_err().to_string(),
            "Loan amount must be positive"
        );
        let request = validate_loan_request("5000", "Medical").unwrap();
        assert_eq!(request.amount, 5000.0);
    }

    #[test]
    fn test_contribution_validation() {
        assert_eq!(
            validate_contribution(" ", None, Some(600.0)).unwrap_err().to_string(),
            "Month is required"
        );
        assert_eq!(
            validate_contribution("2025-01", None, None).unwrap_err().to_string(),
            "Payment amount not available"
        );
        assert_eq!(
            validate_contribution("2025-01", Some(500.0), Some(600.0))
                .unwrap_err()
                .to_string(),
            "Amount must be 600.00"
        );

        let request = validate_contribution("2025-01", None, Some(600.0)).unwrap();
        assert_eq!(request.amount, 600.0);
        assert_eq!(request.month, "2025-01");
    }

    fn member(id: &str) -> Actor {
        Actor {
            role: Role::Member,
            user_id: Some(id.to_string()),
        }
    }

    #[test]
    fn test_member_pays_own_pending_installment() {
        let loan = loan("L1", Some(("u1", Some("Asha"))), &[(500.0, Paid), (500.0, Pending)]);

        assert!(validate_installment_change(&loan, 2, Paid, &member("u1")).is_ok());
        assert!(validate_installment_change(&loan, 1, Paid, &member("u1")).is_err());
        assert!(validate_installment_change(&loan, 2, Pending, &member("u1")).is_err());
        assert!(validate_installment_change(&loan, 2, Paid, &member("u2")).is_err());
        assert!(matches!(
            validate_installment_change(&loan, 3, Paid, &member("u1")),
            Err(LedgerError::InstallmentNotFound { ordinal: 3, .. })
        ));
    }

    #[test]
    fn test_admin_may_set_either_status_until_completed() {
        let mut loan = loan("L1", Some(("u1", None)), &[(500.0, Paid)]);
        let admin = Actor {
            role: Role::Admin,
            user_id: Some("admin".to_string()),
        };

        assert!(validate_installment_change(&loan, 1, Pending, &admin).is_ok());

        loan.status = LoanStatus::Completed;
        assert!(validate_installment_change(&loan, 1, Pending, &admin).is_err());
    }
}
