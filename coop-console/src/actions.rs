//! User actions against the backend.
//!
//! Every action validates its input first and returns `ApiError::Rejected` without touching
//! the network when validation fails. A valid action issues exactly one request and is never
//! retried.

use projections::{
    validate_contribution, validate_installment_change, validate_loan_request,
    validate_loan_update, LoanUpdateForm,
};
use shared_types::{
    CreateLoanRequest, CreatePaymentRequest, InstallmentStatus, LedgerError, Loan, LoanUpdate,
    LoginRequest,
};
use tracing::info;

use crate::client::SocietyApi;
use crate::error::ApiError;
use crate::session::Session;

pub async fn login<A: SocietyApi + ?Sized>(
    api: &A,
    session: &mut Session,
    email: &str,
    password: &str,
) -> Result<(), ApiError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(LedgerError::validation("email", "Email and password are required").into());
    }

    let token = api
        .login(&LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        })
        .await?;
    session.login(&token)
}

fn require_admin(session: &Session, field: &str, message: &str) -> Result<(), ApiError> {
    if session.role().is_admin() {
        Ok(())
    } else {
        Err(LedgerError::validation(field, message).into())
    }
}

/// Admin edit of a loan's status, including approval with EMI parameters
pub async fn update_loan<A: SocietyApi + ?Sized>(
    api: &A,
    session: &Session,
    loan: &Loan,
    form: &LoanUpdateForm,
) -> Result<LoanUpdate, ApiError> {
    require_admin(session, "status", "Only admins can change a loan's status")?;

    let update = validate_loan_update(loan.status, form)?;
    api.update_loan(session, &loan.id, &update).await?;
    info!("Loan {} moved from {} to {}", loan.id, loan.status, update.status);
    Ok(update)
}

pub async fn delete_loan<A: SocietyApi + ?Sized>(
    api: &A,
    session: &Session,
    loan_id: &str,
) -> Result<(), ApiError> {
    require_admin(session, "loan", "Only admins can delete a loan")?;
    api.delete_loan(session, loan_id).await?;
    info!("Deleted loan {}", loan_id);
    Ok(())
}

pub async fn request_loan<A: SocietyApi + ?Sized>(
    api: &A,
    session: &Session,
    amount: &str,
    reason: &str,
) -> Result<CreateLoanRequest, ApiError> {
    let request = validate_loan_request(amount, reason)?;
    api.request_loan(session, &request).await?;
    info!("Requested loan of {:.2}", request.amount);
    Ok(request)
}

/// Sets one installment's status. The installment is addressed by its ordinal; the
/// backend's positional index is derived from it here and nowhere else.
pub async fn set_installment_status<A: SocietyApi + ?Sized>(
    api: &A,
    session: &Session,
    loan: &Loan,
    ordinal: u32,
    status: InstallmentStatus,
) -> Result<(), ApiError> {
    validate_installment_change(loan, ordinal, status, &session.actor())?;

    let installment = loan
        .installment(ordinal)
        .ok_or_else(|| LedgerError::InstallmentNotFound {
            loan_id: loan.id.clone(),
            ordinal,
        })?;

    api.update_installment_status(session, &loan.id, installment.wire_index(), status)
        .await?;
    info!("Installment #{} of loan {} set to {}", ordinal, loan.id, status);
    Ok(())
}

pub async fn pay_installment<A: SocietyApi + ?Sized>(
    api: &A,
    session: &Session,
    loan: &Loan,
    ordinal: u32,
) -> Result<(), ApiError> {
    set_installment_status(api, session, loan, ordinal, InstallmentStatus::Paid).await
}

/// Records a monthly contribution. `configured_amount` is the society's current monthly
/// amount; when `amount` is `None` that amount is paid.
pub async fn make_contribution<A: SocietyApi + ?Sized>(
    api: &A,
    session: &Session,
    month: &str,
    amount: Option<f64>,
    configured_amount: Option<f64>,
) -> Result<CreatePaymentRequest, ApiError> {
    let request = validate_contribution(month, amount, configured_amount)?;
    api.make_payment(session, &request).await?;
    info!("Paid contribution of {:.2} for {}", request.amount, request.month);
    Ok(request)
}

/// Admin correction of a recorded contribution. The edited month and amount go through the
/// same checks as a new payment.
pub async fn update_contribution<A: SocietyApi + ?Sized>(
    api: &A,
    session: &Session,
    payment_id: &str,
    month: &str,
    amount: Option<f64>,
    configured_amount: Option<f64>,
) -> Result<CreatePaymentRequest, ApiError> {
    require_admin(session, "payment", "Only admins can edit a contribution")?;
    let request = validate_contribution(month, amount, configured_amount)?;
    api.update_payment(session, payment_id, &request).await?;
    info!(
        "Contribution {} updated to {:.2} for {}",
        payment_id, request.amount, request.month
    );
    Ok(request)
}

pub async fn delete_contribution<A: SocietyApi + ?Sized>(
    api: &A,
    session: &Session,
    payment_id: &str,
) -> Result<(), ApiError> {
    require_admin(session, "payment", "Only admins can delete a contribution")?;
    api.delete_payment(session, payment_id).await?;
    info!("Deleted contribution {}", payment_id);
    Ok(())
}
