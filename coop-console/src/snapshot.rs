//! Offline data source over a directory of saved backend responses.
//!
//! Layout: `loans.json`, `payments.json` and `users.json` are required; `dashboard.json` and
//! `amount.json` are optional. Each file holds the body of the matching endpoint, so both
//! the wrapped (`{"loans": [...]}`) and bare-array shapes are accepted.

use async_trait::async_trait;
use projections::ingest::{loans_from_records, payments_from_records};
use projections::{loan_counts, monthly_totals, summarize_loans_by_status};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared_types::{
    ContributionPayment, CreateLoanRequest, CreatePaymentRequest, CurrentAmount,
    DashboardResponse, InstallmentStatus, Loan, LoanUpdate, LoansResponse, LoginRequest,
    PaymentsResponse, RawUser, UserRef, UsersResponse,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::client::{LedgerSource, SocietyApi};
use crate::error::ApiError;
use crate::session::Session;

#[derive(Deserialize)]
#[serde(untagged)]
enum UsersFile {
    Paged(UsersResponse),
    Bare(Vec<RawUser>),
}

impl UsersFile {
    fn into_users(self) -> Vec<RawUser> {
        match self {
            UsersFile::Paged(response) => response.users,
            UsersFile::Bare(users) => users,
        }
    }
}

pub struct SnapshotSource {
    dir: PathBuf,
}

impl SnapshotSource {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(ApiError::Snapshot(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T, ApiError> {
        let path = self.dir.join(name);
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|e| ApiError::Snapshot(format!("Failed to read {}: {}", path.display(), e)))?;
        debug!("Read {} bytes from {:?}", contents.len(), path);
        serde_json::from_slice(&contents)
            .map_err(|e| ApiError::Decode(format!("{}: {}", name, e)))
    }

    async fn read_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ApiError> {
        if !self.dir.join(name).exists() {
            return Ok(None);
        }
        self.read(name).await.map(Some)
    }

    async fn raw_users(&self) -> Result<Vec<RawUser>, ApiError> {
        let users: UsersFile = self.read("users.json").await?;
        Ok(users.into_users())
    }
}

/// The backend only returns a member's own records; snapshots hold everything.
/// A member without a user id owns nothing.
fn owned_by_session(session: &Session, owner: Option<&str>) -> bool {
    if session.role().is_admin() {
        return true;
    }
    match (session.user_id(), owner) {
        (Some(user_id), Some(owner)) => user_id == owner,
        _ => false,
    }
}

#[async_trait]
impl LedgerSource for SnapshotSource {
    async fn fetch_loans(&self, session: &Session) -> Result<Vec<Loan>, ApiError> {
        let response: LoansResponse = self.read("loans.json").await?;
        let loans: Vec<Loan> = loans_from_records(response.into_records())
            .into_iter()
            .filter(|loan| owned_by_session(session, loan.user_id()))
            .collect();
        info!("Loaded {} loans from snapshot", loans.len());
        Ok(loans)
    }

    async fn fetch_loan(&self, session: &Session, loan_id: &str) -> Result<Loan, ApiError> {
        self.fetch_loans(session)
            .await?
            .into_iter()
            .find(|loan| loan.id == loan_id)
            .ok_or_else(|| ApiError::server(404, Some("Loan not found")))
    }

    async fn fetch_payments(
        &self,
        session: &Session,
    ) -> Result<Vec<ContributionPayment>, ApiError> {
        let response: PaymentsResponse = self.read("payments.json").await?;
        let payments: Vec<ContributionPayment> = payments_from_records(response.into_records())
            .into_iter()
            .filter(|payment| {
                owned_by_session(session, payment.user.as_ref().map(|u| u.id.as_str()))
            })
            .collect();
        info!("Loaded {} contribution payments from snapshot", payments.len());
        Ok(payments)
    }

    async fn fetch_users(&self, _session: &Session) -> Result<Vec<UserRef>, ApiError> {
        Ok(self
            .raw_users()
            .await?
            .into_iter()
            .map(UserRef::from)
            .collect())
    }

    /// Uses `dashboard.json` when present, otherwise derives the dashboard from the ledger
    async fn fetch_dashboard(&self, session: &Session) -> Result<DashboardResponse, ApiError> {
        if let Some(dashboard) = self.read_optional("dashboard.json").await? {
            return Ok(dashboard);
        }

        let loans = self.fetch_loans(session).await?;
        let payments = self.fetch_payments(session).await?;
        let users = self.raw_users().await?;

        let mut counts = loan_counts(&loans);
        counts.total_users = users.len() as u64;
        counts.total_payments = payments.len() as u64;

        Ok(DashboardResponse {
            current_amount: self.current_amount(session).await?,
            payment_summary: monthly_totals(&payments),
            loan_summary: summarize_loans_by_status(&loans),
            pending_users: users
                .into_iter()
                .filter(|u| u.status.as_deref() == Some("pending"))
                .collect(),
            counts,
            ..Default::default()
        })
    }

    async fn current_amount(&self, _session: &Session) -> Result<Option<CurrentAmount>, ApiError> {
        self.read_optional("amount.json").await
    }
}

#[async_trait]
impl SocietyApi for SnapshotSource {
    async fn login(&self, _request: &LoginRequest) -> Result<String, ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn current_user(&self, session: &Session) -> Result<RawUser, ApiError> {
        let user_id = session.user_id().ok_or(ApiError::NotAuthenticated)?;
        self.raw_users()
            .await?
            .into_iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| ApiError::Snapshot(format!("User {} not in snapshot", user_id)))
    }

    async fn update_loan(
        &self,
        _session: &Session,
        _loan_id: &str,
        _update: &LoanUpdate,
    ) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn request_loan(
        &self,
        _session: &Session,
        _request: &CreateLoanRequest,
    ) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn update_installment_status(
        &self,
        _session: &Session,
        _loan_id: &str,
        _wire_index: u32,
        _status: InstallmentStatus,
    ) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn make_payment(
        &self,
        _session: &Session,
        _request: &CreatePaymentRequest,
    ) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn update_payment(
        &self,
        _session: &Session,
        _payment_id: &str,
        _request: &CreatePaymentRequest,
    ) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn delete_payment(&self, _session: &Session, _payment_id: &str) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn delete_loan(&self, _session: &Session, _loan_id: &str) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::{LoanStatus, Role};

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }

    fn snapshot_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "loans.json",
            json!({
                "loans": [
                    {
                        "_id": "L1",
                        "user": { "_id": "u1", "name": "Asha" },
                        "amount": 12000,
                        "reason": "Medical",
                        "status": { "status": "approved", "interestRate": 7.5, "duration": 2 },
                        "payments": [
                            { "amount": 6000, "date": "2025-01-05", "status": "paid" },
                            { "amount": 6000, "date": "2025-02-05", "status": "pending" }
                        ]
                    },
                    {
                        "_id": "L2",
                        "user": "u2",
                        "amount": "5000",
                        "reason": "Education",
                        "status": "pending"
                    },
                    { "_id": "L3", "status": "mystery" },
                    { "_id": "L4", "status": "approved", "duration": "12" },
                    { "_id": "L5", "status": "approved", "payments": [{ "amount": 500 }] }
                ],
                "total": 5
            }),
        );
        write(
            dir.path(),
            "payments.json",
            json!([
                { "_id": "p1", "user": { "_id": "u1", "name": "Asha" }, "amount": 600, "month": "2025-01", "date": "2025-01-10T00:00:00Z" },
                { "_id": "p2", "user": { "_id": "u2", "name": "Ravi" }, "amount": 600, "month": "2025-01", "date": "2025-01-11T00:00:00Z" }
            ]),
        );
        write(
            dir.path(),
            "users.json",
            json!([
                { "_id": "u1", "name": "Asha", "status": "approved" },
                { "_id": "u2", "name": "Ravi", "status": "pending" }
            ]),
        );
        dir
    }

    #[tokio::test]
    async fn test_loans_are_normalized_and_bad_records_skipped() {
        let dir = snapshot_dir();
        let source = SnapshotSource::new(dir.path()).unwrap();
        let session = Session::offline(Role::Admin, None);

        let loans = source.fetch_loans(&session).await.unwrap();
        assert_eq!(loans.len(), 2);
        assert_eq!(loans[0].status, LoanStatus::Approved);
        assert_eq!(loans[0].interest_rate, Some(7.5));
        assert_eq!(loans[0].installments[1].ordinal, 2);
        assert_eq!(loans[1].user_name(), None);
    }

    #[tokio::test]
    async fn test_member_sees_only_own_records() {
        let dir = snapshot_dir();
        let source = SnapshotSource::new(dir.path()).unwrap();
        let session = Session::offline(Role::Member, Some("u1".to_string()));

        let loans = source.fetch_loans(&session).await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].id, "L1");

        let payments = source.fetch_payments(&session).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].id, "p1");
    }

    #[tokio::test]
    async fn test_member_without_id_sees_nothing() {
        let dir = snapshot_dir();
        let source = SnapshotSource::new(dir.path()).unwrap();
        let session = Session::offline(Role::Member, None);

        assert!(source.fetch_loans(&session).await.unwrap().is_empty());
        assert!(source.fetch_payments(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_payment_keeps_the_rest() {
        let dir = snapshot_dir();
        write(
            dir.path(),
            "payments.json",
            json!({
                "payments": [
                    { "_id": "p1", "user": { "_id": "u1", "name": "Asha" }, "amount": 600, "month": "2025-01" },
                    { "amount": 600, "month": "2025-01" }
                ]
            }),
        );
        let source = SnapshotSource::new(dir.path()).unwrap();
        let session = Session::offline(Role::Admin, None);

        let payments = source.fetch_payments(&session).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].id, "p1");
    }

    #[tokio::test]
    async fn test_dashboard_is_derived_without_dashboard_file() {
        let dir = snapshot_dir();
        let source = SnapshotSource::new(dir.path()).unwrap();
        let session = Session::offline(Role::Admin, None);

        let dashboard = source.fetch_dashboard(&session).await.unwrap();
        assert_eq!(dashboard.counts.ongoing_loans, 1);
        assert_eq!(dashboard.counts.pending_loans, 1);
        assert_eq!(dashboard.counts.total_users, 2);
        assert_eq!(dashboard.payment_summary.len(), 1);
        assert_eq!(dashboard.payment_summary[0].total_amount, 1200.0);
        assert_eq!(dashboard.pending_users.len(), 1);
        assert!(dashboard.current_amount.is_none());
    }

    #[tokio::test]
    async fn test_writes_are_rejected() {
        let dir = snapshot_dir();
        let source = SnapshotSource::new(dir.path()).unwrap();
        let session = Session::offline(Role::Admin, None);

        let result = source
            .update_installment_status(&session, "L1", 1, InstallmentStatus::Paid)
            .await;
        assert!(matches!(result, Err(ApiError::ReadOnly)));
        assert!(matches!(
            source.delete_loan(&session, "L1").await,
            Err(ApiError::ReadOnly)
        ));
        assert!(matches!(
            source.delete_payment(&session, "p1").await,
            Err(ApiError::ReadOnly)
        ));
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            SnapshotSource::new("/definitely/not/here"),
            Err(ApiError::Snapshot(_))
        ));
    }
}
