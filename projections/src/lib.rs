//! Projections Crate
//!
//! Derived views over a society's loan ledger and contribution payments. The backend owns
//! every business rule (EMI amortization, interest, payment validation); this crate only
//! reshapes records it has already computed.
//!
//! # Architecture
//!
//! - **Types**: records and derived view structures live in the `shared-types` crate
//! - **Ingestion**: backend records are normalized once, in [`ingest`]
//! - **Projections**: everything else is a pure function over normalized records
//!
//! # Example
//!
//! ```rust,ignore
//! use projections::{flatten_installments, summarize_emis, DisplayFormat, EmiFilter};
//!
//! let loans = projections::ingest::loans_from_records(listing.into_records());
//! let rows = flatten_installments(&loans, &DisplayFormat::default());
//! let summary = summarize_emis(&EmiFilter::new(Some(user_id), None).apply(&rows));
//! ```

pub mod aggregate;
pub mod approval;
pub mod charts;
pub mod export;
pub mod filter;
pub mod flatten;
pub mod format;
pub mod ingest;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used items
pub use aggregate::{
    filter_contributions, loan_counts, monthly_totals, paginate, summarize_contributions,
    summarize_emis, summarize_loans_by_status, ContributionFilter,
};
pub use approval::{
    can_transition, validate_contribution, validate_installment_change, validate_loan_request,
    validate_loan_update, Actor, LoanUpdateForm,
};
pub use charts::{cumulative_series, month_series, status_buckets};
pub use export::{write_contributions_csv, write_emi_csv};
pub use filter::{available_loans, search_loans, EmiFilter};
pub use flatten::{flatten_installments, loan_ledger};
pub use format::{DisplayFormat, StatusTone};
