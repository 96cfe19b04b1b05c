use async_trait::async_trait;
use projections::ingest::{loans_from_records, normalize_loan_details, payments_from_records};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared_types::{
    ContributionPayment, CreateLoanRequest, CreatePaymentRequest, CurrentAmount,
    DashboardResponse, ErrorResponse, InstallmentStatus, InstallmentStatusUpdate, Loan,
    LoanDetailsResponse, LoanUpdate, LoansResponse, LoginRequest, LoginResponse,
    PaymentsResponse, RawUser, UserRef, UsersResponse,
};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ApiSettings;
use crate::error::ApiError;
use crate::session::Session;

/// Read side of the society backend. Records come back already normalized.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    async fn fetch_loans(&self, session: &Session) -> Result<Vec<Loan>, ApiError>;

    async fn fetch_loan(&self, session: &Session, loan_id: &str) -> Result<Loan, ApiError>;

    async fn fetch_payments(&self, session: &Session)
        -> Result<Vec<ContributionPayment>, ApiError>;

    async fn fetch_users(&self, session: &Session) -> Result<Vec<UserRef>, ApiError>;

    async fn fetch_dashboard(&self, session: &Session) -> Result<DashboardResponse, ApiError>;

    /// Configured monthly contribution amount, if the society has one
    async fn current_amount(&self, session: &Session) -> Result<Option<CurrentAmount>, ApiError>;
}

/// Full backend surface: reads plus the mutations the console can issue.
///
/// Each mutation is exactly one request. Nothing is retried.
#[async_trait]
pub trait SocietyApi: LedgerSource {
    /// Exchanges credentials for a session token
    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError>;

    async fn current_user(&self, session: &Session) -> Result<RawUser, ApiError>;

    async fn update_loan(
        &self,
        session: &Session,
        loan_id: &str,
        update: &LoanUpdate,
    ) -> Result<(), ApiError>;

    async fn request_loan(
        &self,
        session: &Session,
        request: &CreateLoanRequest,
    ) -> Result<(), ApiError>;

    /// `wire_index` is the 0-based position of the installment in the loan's payment list
    async fn update_installment_status(
        &self,
        session: &Session,
        loan_id: &str,
        wire_index: u32,
        status: InstallmentStatus,
    ) -> Result<(), ApiError>;

    async fn make_payment(
        &self,
        session: &Session,
        request: &CreatePaymentRequest,
    ) -> Result<(), ApiError>;

    /// Admin edit of a recorded contribution
    async fn update_payment(
        &self,
        session: &Session,
        payment_id: &str,
        request: &CreatePaymentRequest,
    ) -> Result<(), ApiError>;

    async fn delete_payment(&self, session: &Session, payment_id: &str) -> Result<(), ApiError>;

    async fn delete_loan(&self, session: &Session, loan_id: &str) -> Result<(), ApiError>;
}

/// `SocietyApi` over the backend's REST endpoints
pub struct HttpSocietyApi {
    client: Client,
    base_url: String,
    page_limit: u32,
}

impl HttpSocietyApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            page_limit: settings.page_limit,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(
        &self,
        builder: RequestBuilder,
        session: &Session,
    ) -> Result<RequestBuilder, ApiError> {
        let token = session.require_token()?;
        Ok(builder.header("x-auth-token", token))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, u32)],
    ) -> Result<T, ApiError> {
        let request = self.authorized(self.client.get(self.url(path)), session)?;
        debug!("GET {}", path);
        let response = request.query(query).send().await?;
        decode(check_status(response).await?).await
    }
}

/// Turns a non-success response into `ApiError::Server`, using the body's message when present
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed: Option<ErrorResponse> = serde_json::from_str(&body).ok();
    Err(ApiError::server(
        status.as_u16(),
        parsed.as_ref().and_then(ErrorResponse::message),
    ))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl LedgerSource for HttpSocietyApi {
    async fn fetch_loans(&self, session: &Session) -> Result<Vec<Loan>, ApiError> {
        let response: LoansResponse = self
            .get_json(session, "/api/loans", &[("page", 1), ("limit", self.page_limit)])
            .await?;
        let loans = loans_from_records(response.into_records());
        info!("Fetched {} loans", loans.len());
        Ok(loans)
    }

    async fn fetch_loan(&self, session: &Session, loan_id: &str) -> Result<Loan, ApiError> {
        let response: LoanDetailsResponse = self
            .get_json(session, &format!("/api/loans/{}", loan_id), &[])
            .await?;
        normalize_loan_details(response).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_payments(
        &self,
        session: &Session,
    ) -> Result<Vec<ContributionPayment>, ApiError> {
        let response: PaymentsResponse = self.get_json(session, "/api/payments", &[]).await?;
        let payments = payments_from_records(response.into_records());
        info!("Fetched {} contribution payments", payments.len());
        Ok(payments)
    }

    async fn fetch_users(&self, session: &Session) -> Result<Vec<UserRef>, ApiError> {
        let response: UsersResponse = self
            .get_json(session, "/api/auth/all", &[("page", 1), ("limit", self.page_limit)])
            .await?;
        Ok(response.users.into_iter().map(UserRef::from).collect())
    }

    async fn fetch_dashboard(&self, session: &Session) -> Result<DashboardResponse, ApiError> {
        self.get_json(session, "/api/dashboard", &[]).await
    }

    async fn current_amount(&self, session: &Session) -> Result<Option<CurrentAmount>, ApiError> {
        let request = self.authorized(self.client.get(self.url("/api/amounts/current")), session)?;
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(check_status(response).await?).await.map(Some)
    }
}

#[async_trait]
impl SocietyApi for HttpSocietyApi {
    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(request)
            .send()
            .await?;
        let login: LoginResponse = decode(check_status(response).await?).await?;
        Ok(login.token)
    }

    async fn current_user(&self, session: &Session) -> Result<RawUser, ApiError> {
        self.get_json(session, "/api/auth/me", &[]).await
    }

    async fn update_loan(
        &self,
        session: &Session,
        loan_id: &str,
        update: &LoanUpdate,
    ) -> Result<(), ApiError> {
        let request = self.authorized(
            self.client.put(self.url(&format!("/api/loans/{}", loan_id))),
            session,
        )?;
        check_status(request.json(update).send().await?).await?;
        Ok(())
    }

    async fn request_loan(
        &self,
        session: &Session,
        request: &CreateLoanRequest,
    ) -> Result<(), ApiError> {
        let builder = self.authorized(self.client.post(self.url("/api/loans")), session)?;
        check_status(builder.json(request).send().await?).await?;
        Ok(())
    }

    async fn update_installment_status(
        &self,
        session: &Session,
        loan_id: &str,
        wire_index: u32,
        status: InstallmentStatus,
    ) -> Result<(), ApiError> {
        let path = format!("/api/loans/{}/payments/{}", loan_id, wire_index);
        let request = self.authorized(self.client.put(self.url(&path)), session)?;
        check_status(
            request
                .json(&InstallmentStatusUpdate { status })
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn make_payment(
        &self,
        session: &Session,
        request: &CreatePaymentRequest,
    ) -> Result<(), ApiError> {
        let builder = self.authorized(self.client.post(self.url("/api/payments")), session)?;
        check_status(builder.json(request).send().await?).await?;
        Ok(())
    }

    async fn update_payment(
        &self,
        session: &Session,
        payment_id: &str,
        request: &CreatePaymentRequest,
    ) -> Result<(), ApiError> {
        let builder = self.authorized(
            self.client.put(self.url(&format!("/api/payments/{}", payment_id))),
            session,
        )?;
        check_status(builder.json(request).send().await?).await?;
        Ok(())
    }

    async fn delete_payment(&self, session: &Session, payment_id: &str) -> Result<(), ApiError> {
        let builder = self.authorized(
            self.client.delete(self.url(&format!("/api/payments/{}", payment_id))),
            session,
        )?;
        check_status(builder.send().await?).await?;
        Ok(())
    }

    async fn delete_loan(&self, session: &Session, loan_id: &str) -> Result<(), ApiError> {
        let builder = self.authorized(
            self.client.delete(self.url(&format!("/api/loans/{}", loan_id))),
            session,
        )?;
        check_status(builder.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> HttpSocietyApi {
        HttpSocietyApi::new(&ApiSettings {
            base_url: "http://127.0.0.1:9/".to_string(),
            timeout_secs: 1,
            page_limit: 50,
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(api().url("/api/loans"), "http://127.0.0.1:9/api/loans");
    }

    #[tokio::test]
    async fn test_unauthenticated_calls_fail_before_network() {
        let api = api();
        let session = Session::anonymous();

        assert!(matches!(
            api.fetch_loans(&session).await,
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            api.make_payment(
                &session,
                &CreatePaymentRequest {
                    amount: 600.0,
                    month: "2025-01".to_string()
                }
            )
            .await,
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            api.delete_loan(&session, "L1").await,
            Err(ApiError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_error_body_message_is_used() {
        let parsed: ErrorResponse = serde_json::from_str(r#"{"msg":"Loan not found"}"#).unwrap();
        let err = ApiError::server(404, parsed.message());
        assert_eq!(err.to_string(), "Loan not found");

        let err = ApiError::server(500, None);
        assert_eq!(err.to_string(), "Request failed with status 500");
    }
}
