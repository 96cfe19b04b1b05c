use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::loan::MoneyValue;
use crate::user::{RawUserRef, UserRef};

/// Monthly membership contribution, distinct from loan installments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContributionPayment {
    pub id: String,
    pub user: Option<UserRef>,
    pub amount: MoneyValue,
    /// Free-text month label; canonical form is `YYYY-MM`
    pub month: String,
    pub date: Option<DateTime<Utc>>,
}

impl ContributionPayment {
    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }
}

/// Contribution payment as the backend sends it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPayment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user: Option<RawUserRef>,
    #[serde(default)]
    pub amount: Option<MoneyValue>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Payment listing; older backends return a bare array. Records are decoded one by one
/// during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentsResponse {
    Paged {
        payments: Vec<serde_json::Value>,
        #[serde(default)]
        total: u64,
    },
    Bare(Vec<serde_json::Value>),
}

impl PaymentsResponse {
    pub fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            PaymentsResponse::Paged { payments, .. } => payments,
            PaymentsResponse::Bare(payments) => payments,
        }
    }
}

/// Body for recording a contribution payment or editing an existing one
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreatePaymentRequest {
    pub amount: f64,
    pub month: String,
}

/// Currently configured monthly contribution amount
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAmount {
    pub amount: f64,
    #[serde(default)]
    pub effective_date: Option<String>,
}
