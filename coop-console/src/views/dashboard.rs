use projections::ingest::{loans_from_records, payments_from_records};
use projections::{cumulative_series, month_series, status_buckets};
use shared_types::{
    ContributionPayment, DashboardCounts, DashboardResponse, Loan, MonthSeries, Role,
    StatusBuckets, UserRef,
};
use tracing::warn;

use crate::error::ApiError;

/// Headline counters and chart series
#[derive(Debug, Clone)]
pub struct DashboardView {
    role: Role,
    counts: DashboardCounts,
    monthly: MonthSeries,
    cumulative: MonthSeries,
    buckets: StatusBuckets,
    current_amount: Option<f64>,
    pending_users: Vec<UserRef>,
    own_payments: Vec<ContributionPayment>,
    own_loans: Vec<Loan>,
    error: Option<String>,
}

impl DashboardView {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            counts: DashboardCounts::default(),
            monthly: MonthSeries::default(),
            cumulative: MonthSeries::default(),
            buckets: status_buckets(&[]),
            current_amount: None,
            pending_users: Vec::new(),
            own_payments: Vec::new(),
            own_loans: Vec::new(),
            error: None,
        }
    }

    pub fn load(&mut self, result: Result<DashboardResponse, ApiError>) {
        let role = self.role;
        *self = Self::new(role);

        match result {
            Ok(response) => {
                self.monthly = month_series(&response.payment_summary);
                self.cumulative = cumulative_series(&self.monthly);
                self.buckets = status_buckets(&response.loan_summary);
                self.current_amount = response.current_amount.as_ref().map(|a| a.amount);
                self.own_loans = loans_from_records(response.user_loan_records());
                self.own_payments = payments_from_records(response.user_payments);
                if role.is_admin() {
                    self.pending_users =
                        response.pending_users.into_iter().map(UserRef::from).collect();
                }
                self.counts = response.counts;
            }
            Err(err) => {
                warn!("Failed to load dashboard: {}", err);
                self.error = Some(err.to_string());
            }
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn counts(&self) -> &DashboardCounts {
        &self.counts
    }

    pub fn monthly(&self) -> &MonthSeries {
        &self.monthly
    }

    pub fn cumulative(&self) -> &MonthSeries {
        &self.cumulative
    }

    pub fn buckets(&self) -> &StatusBuckets {
        &self.buckets
    }

    pub fn current_amount(&self) -> Option<f64> {
        self.current_amount
    }

    pub fn pending_users(&self) -> &[UserRef] {
        &self.pending_users
    }

    pub fn own_payments(&self) -> &[ContributionPayment] {
        &self.own_payments
    }

    pub fn own_loans(&self) -> &[Loan] {
        &self.own_loans
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
