use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::user::{RawUserRef, UserRef};
use crate::LedgerError;

/// Loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Pending,
        LoanStatus::Approved,
        LoanStatus::Rejected,
        LoanStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LoanStatus::Completed)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(LoanStatus::Pending),
            "approved" => Ok(LoanStatus::Approved),
            "rejected" => Ok(LoanStatus::Rejected),
            "completed" => Ok(LoanStatus::Completed),
            other => Err(LedgerError::UnknownStatus(other.to_string())),
        }
    }
}

/// Status of a single EMI installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

impl InstallmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallmentStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(InstallmentStatus::Pending),
            "paid" => Ok(InstallmentStatus::Paid),
            other => Err(LedgerError::UnknownStatus(other.to_string())),
        }
    }
}

/// A currency amount as received: either a JSON number or a (possibly numeric) string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum MoneyValue {
    Number(f64),
    Text(String),
}

impl MoneyValue {
    /// Numeric value, or `None` when the text does not parse as a finite number
    pub fn parsed(&self) -> Option<f64> {
        match self {
            MoneyValue::Number(value) if value.is_finite() => Some(*value),
            MoneyValue::Number(_) => None,
            MoneyValue::Text(text) => text
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
        }
    }

    /// Value used in sums: unparseable amounts count as zero
    pub fn or_zero(&self) -> f64 {
        self.parsed().unwrap_or(0.0)
    }
}

impl Default for MoneyValue {
    fn default() -> Self {
        MoneyValue::Number(0.0)
    }
}

impl From<f64> for MoneyValue {
    fn from(value: f64) -> Self {
        MoneyValue::Number(value)
    }
}

/// One scheduled EMI entry. `ordinal` is 1-based, assigned once at ingestion and never renumbered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Installment {
    pub ordinal: u32,
    pub amount: MoneyValue,
    pub due_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
}

impl Installment {
    /// Positional index the backend uses to address this installment
    pub fn wire_index(&self) -> u32 {
        self.ordinal.saturating_sub(1)
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }
}

/// Canonical loan record, normalized from [`RawLoan`] at the ingestion boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Loan {
    pub id: String,
    pub user: Option<UserRef>,
    pub amount: MoneyValue,
    pub reason: String,
    pub interest_rate: Option<f64>,
    pub duration_months: Option<u32>,
    pub emi_start_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub total_amount_payable: Option<f64>,
    pub emi_amount: Option<f64>,
    pub installments: Vec<Installment>,
}

impl Loan {
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }

    pub fn installment(&self, ordinal: u32) -> Option<&Installment> {
        self.installments.iter().find(|i| i.ordinal == ordinal)
    }
}

/// Loan status as it appears on the wire across backend revisions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLoanStatus {
    Simple(String),
    #[serde(rename_all = "camelCase")]
    Detailed {
        status: String,
        #[serde(default)]
        interest_rate: Option<f64>,
        #[serde(default)]
        duration: Option<u32>,
    },
}

/// Installment as embedded in a backend loan document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInstallment {
    #[serde(default)]
    pub amount: Option<MoneyValue>,
    #[serde(default)]
    pub date: Option<String>,
    pub status: String,
}

/// Loan document as the backend sends it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLoan {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user: Option<RawUserRef>,
    #[serde(default)]
    pub amount: Option<MoneyValue>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub interest_rate: Option<f64>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub emi_start_date: Option<String>,
    pub status: RawLoanStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub total_amount_payable: Option<f64>,
    #[serde(default)]
    pub emi_amount: Option<f64>,
    #[serde(default)]
    pub payments: Vec<RawInstallment>,
}

/// Loan listing; older backends return a bare array.
///
/// Records stay undecoded so one unreadable loan cannot fail the whole listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoansResponse {
    Paged {
        loans: Vec<serde_json::Value>,
        #[serde(default)]
        total: u64,
    },
    Bare(Vec<serde_json::Value>),
}

impl LoansResponse {
    pub fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            LoansResponse::Paged { loans, .. } => loans,
            LoansResponse::Bare(loans) => loans,
        }
    }
}

/// Loan details endpoint: the loan plus server-side EMI tallies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetailsResponse {
    pub loan: RawLoan,
    #[serde(rename = "paidEMIs", default)]
    pub paid_emis: Option<f64>,
    #[serde(rename = "pendingEMIs", default)]
    pub pending_emis: Option<u32>,
}

/// Request to create a new loan
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateLoanRequest {
    pub amount: f64,
    pub reason: String,
}

/// Admin loan update. EMI parameters are only sent when approving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoanUpdate {
    pub status: LoanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub interest_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub emi_start_date: Option<NaiveDate>,
}

/// Body of the installment status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentStatusUpdate {
    pub status: InstallmentStatus,
}
