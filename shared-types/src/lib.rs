use serde::{Deserialize, Serialize};

pub mod dashboard;
pub mod error;
pub mod ledger;
pub mod loan;
pub mod payment;
pub mod user;

pub use dashboard::{
    DashboardCounts, DashboardResponse, LoanStatusSummary, MonthSeries, MonthlyPaymentSummary,
    StatusBuckets,
};
pub use error::LedgerError;
pub use ledger::{ContributionSummary, EmiRow, EmiSummary, LoanLedger, Page};
pub use loan::{
    CreateLoanRequest, Installment, InstallmentStatus, InstallmentStatusUpdate, Loan,
    LoanDetailsResponse, LoanStatus, LoanUpdate, LoansResponse, MoneyValue, RawInstallment,
    RawLoan, RawLoanStatus,
};
pub use payment::{
    ContributionPayment, CreatePaymentRequest, CurrentAmount, PaymentsResponse, RawPayment,
};
pub use user::{
    LoginRequest, LoginResponse, RawUser, RawUserRef, Role, UserRef, UsersResponse,
};

/// Error body returned by the backend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref().or(self.error.as_deref())
    }
}
