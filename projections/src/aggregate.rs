//! Totals over installment rows, contribution payments and loans.

use chrono::Datelike;
use shared_types::{
    ContributionPayment, ContributionSummary, DashboardCounts, EmiRow, EmiSummary,
    InstallmentStatus, Loan, LoanStatus, LoanStatusSummary, MonthlyPaymentSummary, Page,
};
use std::collections::BTreeMap;

/// Parses a displayed amount; anything unparseable counts as zero
fn row_amount(row: &EmiRow) -> f64 {
    row.amount
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn summarize_emis(rows: &[EmiRow]) -> EmiSummary {
    rows.iter().fold(EmiSummary::default(), |mut summary, row| {
        let amount = row_amount(row);
        summary.total_count += 1;
        summary.total_amount += amount;
        match row.status {
            InstallmentStatus::Paid => {
                summary.paid_count += 1;
                summary.total_paid += amount;
            }
            InstallmentStatus::Pending => summary.pending_count += 1,
        }
        summary
    })
}

/// Optional constraints over contribution payments, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionFilter {
    /// Case-insensitive substring of the month label
    pub month: Option<String>,
    /// Calendar year of the payment date
    pub year: Option<i32>,
    /// Case-insensitive substring of the payer's name
    pub user_name: Option<String>,
}

impl ContributionFilter {
    pub fn is_empty(&self) -> bool {
        self.month.is_none() && self.year.is_none() && self.user_name.is_none()
    }

    pub fn matches(&self, payment: &ContributionPayment) -> bool {
        if let Some(month) = needle(self.month.as_deref()) {
            if !payment.month.to_lowercase().contains(&month) {
                return false;
            }
        }

        if let Some(year) = self.year {
            if payment.date.map(|at| at.year()) != Some(year) {
                return false;
            }
        }

        if let Some(user_name) = needle(self.user_name.as_deref()) {
            let hit = payment
                .user_name()
                .map(|name| name.to_lowercase().contains(&user_name))
                .unwrap_or(false);
            if !hit {
                return false;
            }
        }

        true
    }
}

fn needle(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

pub fn filter_contributions(
    payments: &[ContributionPayment],
    filter: &ContributionFilter,
) -> Vec<ContributionPayment> {
    payments
        .iter()
        .filter(|payment| filter.matches(payment))
        .cloned()
        .collect()
}

pub fn summarize_contributions(payments: &[ContributionPayment]) -> ContributionSummary {
    ContributionSummary {
        count: payments.len(),
        total_amount: payments.iter().map(|p| p.amount.or_zero()).sum(),
    }
}

/// Slices one page out of an already-filtered collection.
///
/// Pages are 1-based; a page past the end clamps to the last page and there is always
/// at least one (possibly empty) page.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Count and principal per loan status, in pending/approved/rejected/completed order
pub fn summarize_loans_by_status(loans: &[Loan]) -> Vec<LoanStatusSummary> {
    LoanStatus::ALL
        .iter()
        .map(|status| {
            let matching = loans.iter().filter(|loan| loan.status == *status);
            let (count, total_amount) = matching.fold((0u64, 0.0), |(count, total), loan| {
                (count + 1, total + loan.amount.or_zero())
            });
            LoanStatusSummary {
                status: status.as_str().to_string(),
                count,
                total_amount,
            }
        })
        .collect()
}

/// Contribution totals grouped by month label, as the dashboard endpoint reports them
pub fn monthly_totals(payments: &[ContributionPayment]) -> Vec<MonthlyPaymentSummary> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for payment in payments {
        *totals.entry(payment.month.trim()).or_default() += payment.amount.or_zero();
    }

    totals
        .into_iter()
        .map(|(label, total_amount)| MonthlyPaymentSummary {
            label: label.to_string(),
            total_amount,
        })
        .collect()
}

/// Loan counters of the dashboard computed from a loan listing
pub fn loan_counts(loans: &[Loan]) -> DashboardCounts {
    let count = |status: LoanStatus| loans.iter().filter(|l| l.status == status).count() as u64;
    DashboardCounts {
        completed_loans: count(LoanStatus::Completed),
        pending_loans: count(LoanStatus::Pending),
        ongoing_loans: count(LoanStatus::Approved),
        rejected_loans: count(LoanStatus::Rejected),
        ..Default::default()
    }
}
