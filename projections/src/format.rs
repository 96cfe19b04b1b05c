//! Presentation formatting for amounts, dates and statuses.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{InstallmentStatus, LoanStatus, MoneyValue, Role, UserRef};

/// Shown in place of a missing user name
pub const UNKNOWN_USER: &str = "Unknown";

/// Shown in place of any other missing optional field
pub const NOT_AVAILABLE: &str = "N/A";

/// How amounts and dates are rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFormat {
    pub currency_symbol: String,
    /// chrono `strftime` pattern used for due dates and payment dates
    pub date_format: String,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

impl DisplayFormat {
    pub fn currency(&self, value: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, value)
    }

    pub fn optional_currency(&self, value: Option<f64>) -> String {
        match value {
            Some(value) => self.currency(value),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    pub fn date(&self, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => date.format(&self.date_format).to_string(),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    pub fn timestamp(&self, at: Option<DateTime<Utc>>) -> String {
        self.date(at.map(|at| at.date_naive()))
    }

    /// Currency-prefixed amount, or the raw text when it does not parse
    pub fn money(&self, amount: &MoneyValue) -> String {
        match amount.parsed() {
            Some(value) => self.currency(value),
            None => format_amount(amount),
        }
    }
}

/// Two decimals when the amount parses, the raw text otherwise
pub fn format_amount(amount: &MoneyValue) -> String {
    match (amount.parsed(), amount) {
        (Some(value), _) => format!("{:.2}", value),
        (None, MoneyValue::Text(raw)) => raw.clone(),
        (None, MoneyValue::Number(raw)) => raw.to_string(),
    }
}

/// Capitalizes a wire status for display ("pending" -> "Pending")
pub fn status_label(status: &str) -> String {
    let mut chars = status.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Badge colouring for a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Success,
    Warning,
    Danger,
    Secondary,
}

impl StatusTone {
    pub fn for_loan(status: LoanStatus) -> Self {
        match status {
            LoanStatus::Approved => StatusTone::Success,
            LoanStatus::Rejected => StatusTone::Danger,
            LoanStatus::Pending => StatusTone::Warning,
            LoanStatus::Completed => StatusTone::Secondary,
        }
    }

    pub fn for_installment(status: InstallmentStatus) -> Self {
        match status {
            InstallmentStatus::Paid => StatusTone::Success,
            InstallmentStatus::Pending => StatusTone::Warning,
        }
    }
}

pub fn optional_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) if rate > 0.0 => format!("{}%", rate),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn optional_duration(months: Option<u32>) -> String {
    match months {
        Some(1) => "1 month".to_string(),
        Some(months) if months > 0 => format!("{} months", months),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Name of the owning user, falling back to [`UNKNOWN_USER`]
pub fn user_display_name(user: Option<&UserRef>) -> String {
    user.and_then(|u| u.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_USER)
        .to_string()
}

/// Admins see who owns a record; members only ever see their own
pub fn owner_label(role: Role, user: Option<&UserRef>) -> String {
    if role.is_admin() {
        user_display_name(user)
    } else {
        "You".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(&MoneyValue::Number(500.0)), "500.00");
        assert_eq!(format_amount(&MoneyValue::Text("250.5".to_string())), "250.50");
        assert_eq!(format_amount(&MoneyValue::Text("n/a".to_string())), "n/a");
    }

    #[test]
    fn test_dates_use_configured_pattern() {
        let format = DisplayFormat {
            currency_symbol: "$".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        };
        let date = NaiveDate::from_ymd_opt(2025, 3, 7);
        assert_eq!(format.date(date), "2025-03-07");
        assert_eq!(format.date(None), NOT_AVAILABLE);
        assert_eq!(DisplayFormat::default().date(date), "07/03/2025");
    }

    #[test]
    fn test_currency() {
        let format = DisplayFormat::default();
        assert_eq!(format.currency(1000.0), "₹1000.00");
        assert_eq!(format.optional_currency(None), "N/A");
        assert_eq!(format.money(&MoneyValue::Text("1500".to_string())), "₹1500.00");
        assert_eq!(format.money(&MoneyValue::Text("tbd".to_string())), "tbd");
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label("pending"), "Pending");
        assert_eq!(status_label(""), "");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(optional_rate(None), "N/A");
        assert_eq!(optional_rate(Some(7.5)), "7.5%");
        assert_eq!(optional_duration(Some(12)), "12 months");
        assert_eq!(optional_duration(None), "N/A");

        let anonymous = UserRef {
            id: "u1".to_string(),
            name: None,
        };
        assert_eq!(user_display_name(Some(&anonymous)), UNKNOWN_USER);
        assert_eq!(user_display_name(None), UNKNOWN_USER);
        assert_eq!(owner_label(Role::Member, Some(&anonymous)), "You");
    }
}
