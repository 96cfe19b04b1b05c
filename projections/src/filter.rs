//! Row filters, dependent loan selection and free-text loan search.

use shared_types::{EmiRow, Loan, Role};

use crate::format::format_amount;

/// User and loan constraints over flattened rows. An absent constraint does not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmiFilter {
    pub user_id: Option<String>,
    pub loan_id: Option<String>,
}

impl EmiFilter {
    pub fn new(user_id: Option<&str>, loan_id: Option<&str>) -> Self {
        Self {
            user_id: selection(user_id),
            loan_id: selection(loan_id),
        }
    }

    /// Members only ever see their own loans, so the user constraint is dropped for them
    pub fn for_role(mut self, role: Role) -> Self {
        if !role.is_admin() {
            self.user_id = None;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.loan_id.is_none()
    }

    pub fn matches(&self, row: &EmiRow) -> bool {
        let user_ok = match &self.user_id {
            Some(user_id) => row.user_id.as_deref() == Some(user_id.as_str()),
            None => true,
        };
        let loan_ok = match &self.loan_id {
            Some(loan_id) => row.loan_id == *loan_id,
            None => true,
        };
        user_ok && loan_ok
    }

    pub fn apply(&self, rows: &[EmiRow]) -> Vec<EmiRow> {
        rows.iter().filter(|row| self.matches(row)).cloned().collect()
    }

    /// Clears a loan selection that is not among `available`. Returns true when cleared.
    pub fn reconcile(&mut self, available: &[&Loan]) -> bool {
        let stale = match &self.loan_id {
            Some(loan_id) => !available.iter().any(|loan| loan.id == *loan_id),
            None => false,
        };
        if stale {
            self.loan_id = None;
        }
        stale
    }
}

/// Empty selector values mean "no selection"
fn selection(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Loans offered by the dependent loan selector for the chosen user
pub fn available_loans<'a>(loans: &'a [Loan], user_id: Option<&str>) -> Vec<&'a Loan> {
    match user_id {
        Some(user_id) => loans
            .iter()
            .filter(|loan| loan.user_id() == Some(user_id))
            .collect(),
        None => loans.iter().collect(),
    }
}

/// Case-insensitive substring search over loans.
///
/// A loan matches when the query occurs in any of: the owner's name (admins only), the
/// amount with two decimals, the reason, or the status. Blank queries match everything.
pub fn search_loans<'a>(query: &str, role: Role, loans: &'a [Loan]) -> Vec<&'a Loan> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return loans.iter().collect();
    }

    loans
        .iter()
        .filter(|loan| loan_matches(loan, &needle, role))
        .collect()
}

fn loan_matches(loan: &Loan, needle: &str, role: Role) -> bool {
    let name_hit = role.is_admin()
        && loan
            .user_name()
            .map(|name| name.to_lowercase().contains(needle))
            .unwrap_or(false);

    name_hit
        || format_amount(&loan.amount).to_lowercase().contains(needle)
        || loan.reason.to_lowercase().contains(needle)
        || loan.status.as_str().contains(needle)
}
