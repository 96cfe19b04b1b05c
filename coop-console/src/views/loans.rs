use projections::{loan_ledger, search_loans};
use shared_types::{Loan, LoanLedger, Role};
use tracing::warn;

use crate::error::ApiError;
use crate::views::{route_failure, FormError};

/// Loan listing with free-text search
#[derive(Debug, Clone)]
pub struct LoanSearchView {
    role: Role,
    loans: Vec<Loan>,
    query: String,
    error: Option<String>,
}

impl LoanSearchView {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            loans: Vec::new(),
            query: String::new(),
            error: None,
        }
    }

    pub fn load(&mut self, result: Result<Vec<Loan>, ApiError>) {
        match result {
            Ok(loans) => {
                self.loans = loans;
                self.error = None;
            }
            Err(err) => {
                warn!("Failed to load loans: {}", err);
                self.loans.clear();
                self.error = Some(err.to_string());
            }
        }
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn results(&self) -> Vec<&Loan> {
        search_loans(&self.query, self.role, &self.loans)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn action_failed(&mut self, err: ApiError) -> Option<FormError> {
        route_failure(&mut self.error, err)
    }
}

/// One loan with its installment schedule and paid/pending tallies
#[derive(Debug, Clone, Default)]
pub struct LoanDetailsView {
    loan: Option<Loan>,
    ledger: Option<LoanLedger>,
    error: Option<String>,
}

impl LoanDetailsView {
    pub fn load(&mut self, result: Result<Loan, ApiError>) {
        match result {
            Ok(loan) => {
                self.ledger = Some(loan_ledger(&loan));
                self.loan = Some(loan);
                self.error = None;
            }
            Err(err) => {
                warn!("Failed to load loan details: {}", err);
                self.loan = None;
                self.ledger = None;
                self.error = Some(err.to_string());
            }
        }
    }

    pub fn loan(&self) -> Option<&Loan> {
        self.loan.as_ref()
    }

    pub fn ledger(&self) -> Option<&LoanLedger> {
        self.ledger.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn action_failed(&mut self, err: ApiError) -> Option<FormError> {
        route_failure(&mut self.error, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::loan;
    use shared_types::InstallmentStatus::*;
    use shared_types::{LedgerError, LoanStatus};

    fn loans() -> Vec<Loan> {
        vec![
            loan("L1", ("u1", "Asha"), LoanStatus::Approved, &[]),
            loan("L2", ("u2", "Ravi"), LoanStatus::Pending, &[]),
        ]
    }

    #[test]
    fn test_search_by_status() {
        let mut view = LoanSearchView::new(Role::Admin);
        view.load(Ok(loans()));

        view.set_query("approved");
        let ids: Vec<&str> = view.results().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["L1"]);

        view.set_query("");
        assert_eq!(view.results().len(), 2);
    }

    #[test]
    fn test_member_cannot_search_by_name() {
        let mut admin = LoanSearchView::new(Role::Admin);
        admin.load(Ok(loans()));
        admin.set_query("ravi");
        assert_eq!(admin.results().len(), 1);

        let mut member = LoanSearchView::new(Role::Member);
        member.load(Ok(loans()));
        member.set_query("ravi");
        assert!(member.results().is_empty());
    }

    #[test]
    fn test_details_ledger() {
        let mut view = LoanDetailsView::default();
        view.load(Ok(loan(
            "L1",
            ("u1", "Asha"),
            LoanStatus::Approved,
            &[(500.0, Paid), (500.0, Pending)],
        )));

        let ledger = view.ledger().unwrap();
        assert_eq!(format!("{:.2}", ledger.paid_total), "500.00");
        assert_eq!(ledger.pending_count, 1);
        assert_eq!(ledger.installment_count, 2);
    }

    #[test]
    fn test_details_failure_and_form_error() {
        let mut view = LoanDetailsView::default();
        view.load(Err(ApiError::server(404, Some("Loan not found"))));
        assert!(view.loan().is_none());
        assert_eq!(view.error(), Some("Loan not found"));

        let mut view = LoanDetailsView::default();
        let form = view.action_failed(ApiError::Rejected(LedgerError::validation(
            "interestRate",
            "Interest rate must be greater than 0",
        )));
        assert_eq!(form.and_then(|f| f.field).as_deref(), Some("interestRate"));
        assert_eq!(view.error(), None);
    }
}
