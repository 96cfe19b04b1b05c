use projections::{
    filter_contributions, paginate, summarize_contributions, write_contributions_csv,
    ContributionFilter, DisplayFormat,
};
use shared_types::{ContributionPayment, ContributionSummary, LedgerError, Page};
use std::io::Write;
use tracing::warn;

use crate::error::ApiError;
use crate::views::{route_failure, FormError};

/// Contribution payments table. Pagination always runs over the filtered set, and any
/// filter change returns to the first page.
#[derive(Debug, Clone)]
pub struct ContributionsView {
    format: DisplayFormat,
    payments: Vec<ContributionPayment>,
    filter: ContributionFilter,
    page: usize,
    per_page: usize,
    error: Option<String>,
}

impl ContributionsView {
    pub fn new(format: DisplayFormat, per_page: usize) -> Self {
        Self {
            format,
            payments: Vec::new(),
            filter: ContributionFilter::default(),
            page: 1,
            per_page: per_page.max(1),
            error: None,
        }
    }

    pub fn load(&mut self, result: Result<Vec<ContributionPayment>, ApiError>) {
        match result {
            Ok(payments) => {
                self.payments = payments;
                self.error = None;
            }
            Err(err) => {
                warn!("Failed to load contributions: {}", err);
                self.payments.clear();
                self.error = Some(err.to_string());
            }
        }
        self.page = 1;
    }

    pub fn set_filter(&mut self, filter: ContributionFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_month(&mut self, month: Option<String>) {
        self.filter.month = month;
        self.page = 1;
    }

    pub fn set_year(&mut self, year: Option<i32>) {
        self.filter.year = year;
        self.page = 1;
    }

    pub fn set_user_name(&mut self, user_name: Option<String>) {
        self.filter.user_name = user_name;
        self.page = 1;
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = self.current_page_for(page).page;
    }

    pub fn next_page(&mut self) {
        self.go_to(self.page + 1);
    }

    pub fn previous_page(&mut self) {
        self.go_to(self.page.saturating_sub(1));
    }

    pub fn filter(&self) -> &ContributionFilter {
        &self.filter
    }

    pub fn filtered(&self) -> Vec<ContributionPayment> {
        filter_contributions(&self.payments, &self.filter)
    }

    pub fn summary(&self) -> ContributionSummary {
        summarize_contributions(&self.filtered())
    }

    pub fn current_page(&self) -> Page<ContributionPayment> {
        self.current_page_for(self.page)
    }

    fn current_page_for(&self, page: usize) -> Page<ContributionPayment> {
        paginate(&self.filtered(), page, self.per_page)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn action_failed(&mut self, err: ApiError) -> Option<FormError> {
        route_failure(&mut self.error, err)
    }

    /// Exports every filtered payment, not just the current page
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<(), LedgerError> {
        write_contributions_csv(&self.filtered(), &self.format, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::payment;

    fn loaded() -> ContributionsView {
        let mut view = ContributionsView::new(DisplayFormat::default(), 2);
        view.load(Ok(vec![
            payment("p1", "Asha", "January", "2025-01-10T00:00:00Z"),
            payment("p2", "Ravi", "January", "2024-01-12T00:00:00Z"),
            payment("p3", "Asha", "February", "2025-02-10T00:00:00Z"),
            payment("p4", "Meena", "Jan", "2025-01-28T00:00:00Z"),
            payment("p5", "Ravi", "March", "2025-03-03T00:00:00Z"),
        ]));
        view
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut view = loaded();
        view.next_page();
        assert_eq!(view.current_page().page, 2);

        view.set_month(Some("jan".to_string()));
        assert_eq!(view.current_page().page, 1);
    }

    #[test]
    fn test_month_and_year_filter() {
        let mut view = loaded();
        view.set_month(Some("jan".to_string()));
        view.set_year(Some(2025));

        let ids: Vec<String> = view.filtered().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["p1", "p4"]);
        assert_eq!(view.summary().count, 2);
        assert_eq!(view.summary().total_amount, 1200.0);
        assert_eq!(view.current_page().total_pages, 1);
    }

    #[test]
    fn test_pages_are_over_filtered_set() {
        let mut view = loaded();
        assert_eq!(view.current_page().total_pages, 3);

        view.set_user_name(Some("ravi".to_string()));
        let page = view.current_page();
        assert_eq!(page.total_items, 2);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());

        view.next_page();
        assert_eq!(view.current_page().page, 1);
    }

    #[test]
    fn test_previous_page_stops_at_first() {
        let mut view = loaded();
        view.previous_page();
        assert_eq!(view.current_page().page, 1);
        view.go_to(99);
        assert_eq!(view.current_page().page, 3);
    }

    #[test]
    fn test_failed_load_resets_to_empty() {
        let mut view = loaded();
        view.load(Err(ApiError::NotAuthenticated));

        assert!(view.filtered().is_empty());
        assert_eq!(view.summary(), ContributionSummary::default());
        assert!(view.error().is_some());
    }
}
