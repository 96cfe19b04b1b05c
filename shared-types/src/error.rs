/// Errors raised by ledger ingestion, validation and export
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Invalid date '{value}' in field {field}")]
    InvalidDate { field: String, value: String },

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Cannot move loan from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Installment #{ordinal} not found on loan {loan_id}")]
    InstallmentNotFound { loan_id: String, ordinal: u32 },

    #[error("Export error: {0}")]
    Export(String),
}

impl LedgerError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Field the error belongs to, for form-level display
    pub fn field(&self) -> Option<&str> {
        match self {
            LedgerError::Validation { field, .. } | LedgerError::InvalidDate { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}
