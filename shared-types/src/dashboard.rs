use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::loan::LoansResponse;
use crate::payment::CurrentAmount;
use crate::user::RawUser;

/// Server-side monthly contribution total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPaymentSummary {
    #[serde(alias = "_id", alias = "month")]
    pub label: String,
    #[serde(default)]
    pub total_amount: f64,
}

/// Server-side loan tally for one status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoanStatusSummary {
    #[serde(alias = "_id")]
    pub status: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total_amount: f64,
}

/// Chart series: parallel label and value arrays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Fixed pending/approved/rejected/completed buckets, in that order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusBuckets {
    pub labels: [String; 4],
    pub counts: [u64; 4],
    pub amounts: [f64; 4],
}

/// Headline counters of the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardCounts {
    pub completed_loans: u64,
    pub pending_loans: u64,
    pub ongoing_loans: u64,
    pub rejected_loans: u64,
    pub total_users: u64,
    pub total_meetings: u64,
    pub total_notices: u64,
    pub total_balance: f64,
    pub total_resignations: u64,
    pub total_payments: u64,
}

/// Dashboard endpoint payload. Every collection is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardResponse {
    pub current_amount: Option<CurrentAmount>,
    pub payment_summary: Vec<MonthlyPaymentSummary>,
    pub loan_summary: Vec<LoanStatusSummary>,
    pub pending_users: Vec<RawUser>,
    pub user_payments: Vec<serde_json::Value>,
    pub user_loans: Option<LoansResponse>,
    pub counts: DashboardCounts,
}

impl DashboardResponse {
    pub fn user_loan_records(&self) -> Vec<serde_json::Value> {
        self.user_loans
            .clone()
            .map(LoansResponse::into_records)
            .unwrap_or_default()
    }
}
