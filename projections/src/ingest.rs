//! Normalization of backend records into the canonical ledger model.
//!
//! Every shape variation the backend has produced over time is resolved here, so the
//! rest of the crate only ever sees [`Loan`] and [`ContributionPayment`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::{
    ContributionPayment, Installment, InstallmentStatus, LedgerError, Loan, LoanDetailsResponse,
    LoanLedger, LoanStatus, RawInstallment, RawLoan, RawLoanStatus, RawPayment, UserRef,
};
use tracing::warn;

use crate::flatten::loan_ledger;

/// Decodes listing records one at a time, skipping the ones that do not fit `T`
fn decode_records<T: DeserializeOwned>(kind: &str, records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or("<no id>")
                .to_string();
            match serde_json::from_value(record) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(record_id = %id, "Skipping unreadable {} record: {}", kind, e);
                    None
                }
            }
        })
        .collect()
}

pub fn decode_loans(records: Vec<Value>) -> Vec<RawLoan> {
    decode_records("loan", records)
}

pub fn decode_payments(records: Vec<Value>) -> Vec<RawPayment> {
    decode_records("payment", records)
}

/// Decodes and normalizes a loan listing; unreadable records are logged and dropped
pub fn loans_from_records(records: Vec<Value>) -> Vec<Loan> {
    normalize_loans(decode_loans(records))
}

pub fn payments_from_records(records: Vec<Value>) -> Vec<ContributionPayment> {
    normalize_payments(decode_payments(records))
}

pub fn normalize_loan(raw: RawLoan) -> Result<Loan, LedgerError> {
    let (status, nested_rate, nested_duration) = match raw.status {
        RawLoanStatus::Simple(status) => (status.parse::<LoanStatus>()?, None, None),
        RawLoanStatus::Detailed {
            status,
            interest_rate,
            duration,
        } => (status.parse::<LoanStatus>()?, interest_rate, duration),
    };

    let installments = raw
        .payments
        .into_iter()
        .enumerate()
        .map(|(index, installment)| normalize_installment(&raw.id, index, installment))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Loan {
        emi_start_date: lenient_date(&raw.id, "emiStartDate", raw.emi_start_date.as_deref()),
        created_at: lenient_timestamp(&raw.id, "createdAt", raw.created_at.as_deref()),
        id: raw.id,
        user: raw.user.map(UserRef::from),
        amount: raw.amount.unwrap_or_default(),
        reason: raw.reason.unwrap_or_default(),
        interest_rate: raw.interest_rate.or(nested_rate),
        duration_months: raw.duration.or(nested_duration),
        status,
        total_amount_payable: raw.total_amount_payable,
        emi_amount: raw.emi_amount,
        installments,
    })
}

/// Normalizes the loan details payload. The server's own EMI tallies are compared with the
/// ledger derived from the installments and any disagreement is logged.
pub fn normalize_loan_details(response: LoanDetailsResponse) -> Result<Loan, LedgerError> {
    let loan = normalize_loan(response.loan)?;
    let ledger = loan_ledger(&loan);
    if !tallies_match(&ledger, response.paid_emis, response.pending_emis) {
        warn!(
            loan_id = %loan.id,
            server_paid = ?response.paid_emis,
            server_pending = ?response.pending_emis,
            local_paid = ledger.paid_total,
            local_pending = ledger.pending_count,
            "Server EMI tallies disagree with the installment list"
        );
    }
    Ok(loan)
}

/// Absent server tallies never count as a mismatch
pub fn tallies_match(
    ledger: &LoanLedger,
    paid_emis: Option<f64>,
    pending_emis: Option<u32>,
) -> bool {
    let paid_ok = paid_emis.map_or(true, |paid| (paid - ledger.paid_total).abs() < 0.005);
    let pending_ok = pending_emis.map_or(true, |pending| pending as usize == ledger.pending_count);
    paid_ok && pending_ok
}

fn normalize_installment(
    loan_id: &str,
    index: usize,
    raw: RawInstallment,
) -> Result<Installment, LedgerError> {
    Ok(Installment {
        ordinal: index as u32 + 1,
        amount: raw.amount.unwrap_or_default(),
        due_date: lenient_date(loan_id, "payments.date", raw.date.as_deref()),
        status: raw.status.parse::<InstallmentStatus>()?,
    })
}

/// Normalizes a batch, skipping records that cannot be understood
pub fn normalize_loans(raw: Vec<RawLoan>) -> Vec<Loan> {
    raw.into_iter()
        .filter_map(|loan| {
            let id = loan.id.clone();
            match normalize_loan(loan) {
                Ok(loan) => Some(loan),
                Err(e) => {
                    warn!(loan_id = %id, "Skipping loan record: {}", e);
                    None
                }
            }
        })
        .collect()
}

pub fn normalize_payment(raw: RawPayment) -> ContributionPayment {
    ContributionPayment {
        date: lenient_timestamp(&raw.id, "date", raw.date.as_deref()),
        id: raw.id,
        user: raw.user.map(UserRef::from),
        amount: raw.amount.unwrap_or_default(),
        month: raw.month.unwrap_or_default().trim().to_string(),
    }
}

pub fn normalize_payments(raw: Vec<RawPayment>) -> Vec<ContributionPayment> {
    raw.into_iter().map(normalize_payment).collect()
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
pub fn parse_date(field: &str, value: &str) -> Result<Option<NaiveDate>, LedgerError> {
    Ok(parse_timestamp(field, value)?.map(|at| at.date_naive()))
}

pub fn parse_timestamp(field: &str, value: &str) -> Result<Option<DateTime<Utc>>, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(at.with_timezone(&Utc)));
    }

    if let Ok(at) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(at.and_utc()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(at) = date.and_hms_opt(0, 0, 0) {
            return Ok(Some(at.and_utc()));
        }
    }

    Err(LedgerError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn lenient_date(record_id: &str, field: &str, value: Option<&str>) -> Option<NaiveDate> {
    lenient_timestamp(record_id, field, value).map(|at| at.date_naive())
}

fn lenient_timestamp(record_id: &str, field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
    match parse_timestamp(field, value?) {
        Ok(at) => at,
        Err(e) => {
            warn!(record_id, "{}", e);
            None
        }
    }
}
