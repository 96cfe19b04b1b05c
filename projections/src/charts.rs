//! Reshaping of server-side summaries into chart series.

use regex::Regex;
use shared_types::{
    LoanStatus, LoanStatusSummary, MonthSeries, MonthlyPaymentSummary, StatusBuckets,
};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::format::status_label;

fn canonical_month() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").ok())
        .as_ref()
}

/// True for zero-padded `YYYY-MM` labels, the only form that sorts chronologically
pub fn is_canonical_month(label: &str) -> bool {
    canonical_month()
        .map(|re| re.is_match(label.trim()))
        .unwrap_or(false)
}

/// Monthly totals ordered by label (lexicographic).
pub fn month_series(summary: &[MonthlyPaymentSummary]) -> MonthSeries {
    let mut sorted: Vec<&MonthlyPaymentSummary> = summary.iter().collect();
    sorted.sort_by(|a, b| a.label.cmp(&b.label));

    let odd: Vec<&str> = sorted
        .iter()
        .map(|entry| entry.label.as_str())
        .filter(|label| !is_canonical_month(label))
        .collect();
    if !odd.is_empty() {
        warn!(
            labels = ?odd,
            "Month labels are not YYYY-MM; chart order may not be chronological"
        );
    }

    MonthSeries {
        labels: sorted.iter().map(|entry| entry.label.clone()).collect(),
        values: sorted.iter().map(|entry| entry.total_amount).collect(),
    }
}

/// Running total over an already ordered series
pub fn cumulative_series(series: &MonthSeries) -> MonthSeries {
    let values = series
        .values
        .iter()
        .scan(0.0, |running, value| {
            *running += value;
            Some(*running)
        })
        .collect();

    MonthSeries {
        labels: series.labels.clone(),
        values,
    }
}

/// Fixed four-bucket arrays; statuses missing from the summary stay at zero
pub fn status_buckets(summary: &[LoanStatusSummary]) -> StatusBuckets {
    let mut buckets = StatusBuckets {
        labels: LoanStatus::ALL.map(|status| status_label(status.as_str())),
        counts: [0; 4],
        amounts: [0.0; 4],
    };

    for entry in summary {
        let Ok(status) = entry.status.parse::<LoanStatus>() else {
            debug!(status = %entry.status, "Ignoring unknown loan status in summary");
            continue;
        };
        let slot = bucket_index(status);
        buckets.counts[slot] += entry.count;
        buckets.amounts[slot] += entry.total_amount;
    }

    buckets
}

fn bucket_index(status: LoanStatus) -> usize {
    match status {
        LoanStatus::Pending => 0,
        LoanStatus::Approved => 1,
        LoanStatus::Rejected => 2,
        LoanStatus::Completed => 3,
    }
}
