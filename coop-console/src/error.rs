use shared_types::LedgerError;

/// Failures of a console action. Validation failures never reach the network.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not logged in, run `coop-ledger login` first")]
    NotAuthenticated,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Session file error: {0}")]
    SessionFile(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Snapshot data is read-only")]
    ReadOnly,

    #[error(transparent)]
    Rejected(#[from] LedgerError),
}

impl ApiError {
    /// Client-side validation failure, shown next to the form rather than as a page error
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Rejected(_))
    }

    pub fn server(status: u16, message: Option<&str>) -> Self {
        ApiError::Server {
            status,
            message: message
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status {}", status)),
        }
    }
}
