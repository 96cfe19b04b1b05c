//! Terminal-independent view models.
//!
//! A view owns the records it was loaded with, the user's current selections and the
//! page-level error. Loading replaces everything: a failed load leaves an empty projection
//! and an error message, never stale rows. Form validation failures are reported separately
//! as [`FormError`] and leave the page-level error alone.

pub mod contributions;
pub mod dashboard;
pub mod emi_list;
pub mod loans;

pub use contributions::ContributionsView;
pub use dashboard::DashboardView;
pub use emi_list::EmiListView;
pub use loans::{LoanDetailsView, LoanSearchView};

use shared_types::LedgerError;
use tracing::warn;

use crate::error::ApiError;

/// Validation failure shown next to the form that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    pub field: Option<String>,
    pub message: String,
}

impl From<&LedgerError> for FormError {
    fn from(err: &LedgerError) -> Self {
        Self {
            field: err.field().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Routes an action failure: validation errors become a [`FormError`], anything else
/// becomes the page-level error.
pub(crate) fn route_failure(page_error: &mut Option<String>, err: ApiError) -> Option<FormError> {
    match err {
        ApiError::Rejected(ref ledger) => Some(FormError::from(ledger)),
        other => {
            warn!("Action failed: {}", other);
            *page_error = Some(other.to_string());
            None
        }
    }
}
