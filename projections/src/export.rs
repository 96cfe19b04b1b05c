//! CSV export of the ledger tables.

use csv::WriterBuilder;
use serde::Serialize;
use shared_types::{ContributionPayment, EmiRow, LedgerError};
use std::io::Write;

use crate::format::{format_amount, status_label, user_display_name, DisplayFormat};

#[derive(Serialize)]
struct EmiRecord<'a> {
    #[serde(rename = "Loan Reason")]
    loan_reason: &'a str,
    #[serde(rename = "User Name")]
    user_name: &'a str,
    #[serde(rename = "Payment #")]
    ordinal: u32,
    #[serde(rename = "Amount")]
    amount: &'a str,
    #[serde(rename = "Due Date")]
    due_date: &'a str,
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Serialize)]
struct ContributionRecord<'a> {
    #[serde(rename = "User Name")]
    user_name: String,
    #[serde(rename = "Month")]
    month: &'a str,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Date")]
    date: String,
}

pub fn write_emi_csv<W: Write>(rows: &[EmiRow], writer: W) -> Result<(), LedgerError> {
    let mut csv = WriterBuilder::new().has_headers(true).from_writer(writer);

    for row in rows {
        csv.serialize(EmiRecord {
            loan_reason: &row.loan_reason,
            user_name: &row.user_name,
            ordinal: row.ordinal,
            amount: &row.amount,
            due_date: &row.due_date,
            status: status_label(row.status.as_str()),
        })
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    }

    csv.flush().map_err(|e| LedgerError::Export(e.to_string()))
}

pub fn write_contributions_csv<W: Write>(
    payments: &[ContributionPayment],
    format: &DisplayFormat,
    writer: W,
) -> Result<(), LedgerError> {
    let mut csv = WriterBuilder::new().has_headers(true).from_writer(writer);

    for payment in payments {
        csv.serialize(ContributionRecord {
            user_name: user_display_name(payment.user.as_ref()),
            month: &payment.month,
            amount: format_amount(&payment.amount),
            date: format.timestamp(payment.date),
        })
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    }

    csv.flush().map_err(|e| LedgerError::Export(e.to_string()))
}
