use super::ContentSummary;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Failed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
        }
    }
}

impl FromStr for PurchaseStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "completed" => Ok(PurchaseStatus::Completed),
            "failed" => Ok(PurchaseStatus::Failed),
            other => Err(AppError::Internal(format!(
                "unknown purchase status '{}'",
                other
            ))),
        }
    }
}

/// Ledger row. `amount` and `creator_id` are snapshots taken at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: String,
    pub content_id: Uuid,
    pub creator_id: String,
    pub transaction_hash: String,
    pub amount: f64,
    pub status: PurchaseStatus,
    pub purchase_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    pub user_id: String,
    pub content_id: Uuid,
    pub creator_id: String,
    pub transaction_hash: String,
    pub amount: f64,
    pub status: PurchaseStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseStatusView {
    pub has_purchased: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase: Option<Purchase>,
}

/// A buyer's purchase joined with the content it unlocks.
///
/// Renewal fields are derived at read time; free content never expires.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub purchase: Purchase,
    pub content: ContentSummary,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub days_remaining: Option<i64>,
}
