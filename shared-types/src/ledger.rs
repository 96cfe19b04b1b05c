use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::loan::{InstallmentStatus, LoanStatus};

/// One installment expanded into a cross-loan table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmiRow {
    pub loan_id: String,
    pub loan_reason: String,
    pub loan_status: LoanStatus,
    pub user_id: Option<String>,
    pub user_name: String,
    pub ordinal: u32,
    /// Amount with two decimals, or the raw text when it does not parse
    pub amount: String,
    pub due_date: String,
    pub status: InstallmentStatus,
}

/// Totals over a set of EMI rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmiSummary {
    pub total_count: usize,
    pub paid_count: usize,
    pub pending_count: usize,
    pub total_amount: f64,
    pub total_paid: f64,
}

impl EmiSummary {
    pub fn total_pending(&self) -> f64 {
        self.total_amount - self.total_paid
    }
}

/// Per-loan EMI tallies shown on the loan details page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoanLedger {
    pub loan_id: String,
    pub installment_count: usize,
    pub paid_count: usize,
    pub pending_count: usize,
    pub paid_total: f64,
    pub pending_total: f64,
}

/// Filtered contribution payments with their count and total
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContributionSummary {
    pub count: usize,
    pub total_amount: f64,
}

/// One page of an already-filtered collection. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
