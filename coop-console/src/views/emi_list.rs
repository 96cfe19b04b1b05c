use projections::{
    available_loans, flatten_installments, summarize_emis, write_emi_csv, DisplayFormat,
    EmiFilter,
};
use shared_types::{EmiRow, EmiSummary, LedgerError, Loan, Role, UserRef};
use std::io::Write;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::views::{route_failure, FormError};

/// Cross-loan installment table with user and dependent loan selectors
#[derive(Debug, Clone)]
pub struct EmiListView {
    role: Role,
    format: DisplayFormat,
    loans: Vec<Loan>,
    users: Vec<UserRef>,
    rows: Vec<EmiRow>,
    filter: EmiFilter,
    error: Option<String>,
}

impl EmiListView {
    pub fn new(role: Role, format: DisplayFormat) -> Self {
        Self {
            role,
            format,
            loans: Vec::new(),
            users: Vec::new(),
            rows: Vec::new(),
            filter: EmiFilter::default(),
            error: None,
        }
    }

    pub fn load(&mut self, result: Result<(Vec<Loan>, Vec<UserRef>), ApiError>) {
        match result {
            Ok((loans, users)) => {
                self.rows = flatten_installments(&loans, &self.format);
                self.loans = loans;
                self.users = users;
                self.error = None;
                self.reconcile();
                debug!("EMI list holds {} rows", self.rows.len());
            }
            Err(err) => {
                warn!("Failed to load EMI list: {}", err);
                self.loans.clear();
                self.users.clear();
                self.rows.clear();
                self.error = Some(err.to_string());
            }
        }
    }

    /// Admin-only; members always see just their own loans
    pub fn select_user(&mut self, user_id: Option<&str>) {
        self.filter = EmiFilter::new(user_id, self.filter.loan_id.as_deref()).for_role(self.role);
        self.reconcile();
    }

    pub fn select_loan(&mut self, loan_id: Option<&str>) {
        self.filter = EmiFilter::new(self.filter.user_id.as_deref(), loan_id);
        self.reconcile();
    }

    fn reconcile(&mut self) {
        let available = available_loans(&self.loans, self.filter.user_id.as_deref());
        if self.filter.reconcile(&available) {
            debug!("Cleared loan selection that no longer belongs to the selected user");
        }
    }

    pub fn filter(&self) -> &EmiFilter {
        &self.filter
    }

    pub fn users(&self) -> &[UserRef] {
        &self.users
    }

    pub fn available_loans(&self) -> Vec<&Loan> {
        available_loans(&self.loans, self.filter.user_id.as_deref())
    }

    pub fn visible_rows(&self) -> Vec<EmiRow> {
        self.filter.apply(&self.rows)
    }

    pub fn summary(&self) -> EmiSummary {
        summarize_emis(&self.visible_rows())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn action_failed(&mut self, err: ApiError) -> Option<FormError> {
        route_failure(&mut self.error, err)
    }

    pub fn export_csv<W: Write>(&self, writer: W) -> Result<(), LedgerError> {
        write_emi_csv(&self.visible_rows(), writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::loan;
    use shared_types::InstallmentStatus::*;
    use shared_types::LoanStatus;

    fn loaded(role: Role) -> EmiListView {
        let mut view = EmiListView::new(role, DisplayFormat::default());
        view.load(Ok((
            vec![
                loan("L1", ("u1", "Asha"), LoanStatus::Approved, &[(500.0, Paid), (500.0, Pending)]),
                loan("L2", ("u2", "Ravi"), LoanStatus::Approved, &[(300.0, Pending)]),
                loan("L3", ("u1", "Asha"), LoanStatus::Pending, &[]),
            ],
            vec![],
        )));
        view
    }

    #[test]
    fn test_rows_and_summary() {
        let view = loaded(Role::Admin);
        let rows = view.visible_rows();

        assert_eq!(rows.len(), 3);
        let ordinals: Vec<(String, u32)> =
            rows.iter().map(|r| (r.loan_id.clone(), r.ordinal)).collect();
        assert_eq!(
            ordinals,
            vec![
                ("L1".to_string(), 1),
                ("L1".to_string(), 2),
                ("L2".to_string(), 1)
            ]
        );

        let summary = view.summary();
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.pending_count, 2);
        assert_eq!(summary.total_amount, 1300.0);
    }

    #[test]
    fn test_changing_user_clears_stale_loan() {
        let mut view = loaded(Role::Admin);
        view.select_user(Some("u1"));
        view.select_loan(Some("L1"));
        assert_eq!(view.visible_rows().len(), 2);

        view.select_user(Some("u2"));
        assert_eq!(view.filter().loan_id, None);
        assert_eq!(view.visible_rows().len(), 1);
        let available: Vec<&str> = view.available_loans().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(available, vec!["L2"]);
    }

    #[test]
    fn test_selecting_foreign_loan_is_cleared() {
        let mut view = loaded(Role::Admin);
        view.select_user(Some("u2"));
        view.select_loan(Some("L1"));
        assert_eq!(view.filter().loan_id, None);
    }

    #[test]
    fn test_member_user_selection_is_ignored() {
        let mut view = loaded(Role::Member);
        view.select_user(Some("u2"));
        assert_eq!(view.filter().user_id, None);
        assert_eq!(view.visible_rows().len(), 3);
    }

    #[test]
    fn test_failed_load_resets_to_empty() {
        let mut view = loaded(Role::Admin);
        view.load(Err(ApiError::server(503, None)));

        assert!(view.visible_rows().is_empty());
        assert_eq!(view.summary(), EmiSummary::default());
        assert_eq!(view.error(), Some("Request failed with status 503"));

        view.load(Ok((vec![], vec![])));
        assert_eq!(view.error(), None);
    }

    #[test]
    fn test_export_uses_visible_rows() {
        let mut view = loaded(Role::Admin);
        view.select_user(Some("u2"));

        let mut buffer = Vec::new();
        view.export_csv(&mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(output.contains("reason-L2,Ravi,1,300.00,05/01/2025,Pending"));
    }
}
