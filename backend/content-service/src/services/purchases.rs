/// Purchase service - ledger writes, purchase checks and subscriptions
use crate::db::{ContentStore, PurchaseLedger};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{
    ContentSummary, NewPurchase, Purchase, PurchaseStatus, PurchaseStatusView, Subscription,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Paid access lasts this long from the purchase date
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

const SECONDS_PER_DAY: i64 = 86_400;

pub struct PurchaseService {
    store: Arc<dyn ContentStore>,
    ledger: Arc<dyn PurchaseLedger>,
}

impl PurchaseService {
    pub fn new(store: Arc<dyn ContentStore>, ledger: Arc<dyn PurchaseLedger>) -> Self {
        Self { store, ledger }
    }

    /// Record a completed purchase, snapshotting the current price and owner.
    ///
    /// Duplicates are rejected by the ledger's unique keys, so two racing
    /// submissions yield exactly one row and one Conflict.
    pub async fn record_purchase(
        &self,
        buyer_id: &str,
        content_id: Uuid,
        transaction_hash: &str,
    ) -> Result<Purchase> {
        let transaction_hash = transaction_hash.trim();
        if transaction_hash.is_empty() {
            metrics::record_purchase_attempt("rejected");
            return Err(AppError::InvalidInput("transactionHash is required".into()));
        }

        let content = self
            .store
            .get_summaries(&[content_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                metrics::record_purchase_attempt("rejected");
                AppError::NotFound(format!("content {} not found", content_id))
            })?;

        let result = self
            .ledger
            .record(NewPurchase {
                user_id: buyer_id.to_string(),
                content_id,
                creator_id: content.owner_id,
                transaction_hash: transaction_hash.to_string(),
                amount: content.price,
                status: PurchaseStatus::Completed,
            })
            .await;

        match &result {
            Ok(purchase) => {
                metrics::record_purchase_attempt("recorded");
                tracing::info!(
                    purchase_id = %purchase.id,
                    %content_id,
                    buyer_id,
                    amount = purchase.amount,
                    "purchase recorded"
                );
            }
            Err(AppError::Conflict(reason)) => {
                metrics::record_purchase_attempt("conflict");
                tracing::info!(
                    %content_id,
                    buyer_id,
                    reason = %reason,
                    "duplicate purchase rejected"
                );
            }
            Err(_) => metrics::record_purchase_attempt("error"),
        }
        result
    }

    pub async fn check_status(
        &self,
        buyer_id: &str,
        content_id: Uuid,
    ) -> Result<PurchaseStatusView> {
        let purchase = self.ledger.find(buyer_id, content_id).await?;
        Ok(PurchaseStatusView {
            has_purchased: purchase.is_some(),
            purchase,
        })
    }

    /// The buyer's purchases with renewal metadata, newest first. Purchases
    /// of deleted content are left out.
    pub async fn list_subscriptions(
        &self,
        buyer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>> {
        let purchases = self.ledger.list_by_buyer(buyer_id).await?;
        let ids: Vec<Uuid> = purchases.iter().map(|p| p.content_id).collect();
        let mut contents: HashMap<Uuid, ContentSummary> = self
            .store
            .get_summaries(&ids)
            .await?
            .into_iter()
            .map(|summary| (summary.id, summary))
            .collect();

        Ok(purchases
            .into_iter()
            .filter_map(|purchase| {
                let content = contents.remove(&purchase.content_id)?;
                Some(subscription(purchase, content, now))
            })
            .collect())
    }
}

fn subscription(purchase: Purchase, content: ContentSummary, now: DateTime<Utc>) -> Subscription {
    if !content.subscription_tier.is_paid() {
        return Subscription {
            purchase,
            content,
            expires_at: None,
            is_active: true,
            days_remaining: None,
        };
    }

    let expires_at = purchase.purchase_date + Duration::days(SUBSCRIPTION_PERIOD_DAYS);
    let remaining = (expires_at - now).num_seconds();
    let days_remaining = if remaining <= 0 {
        0
    } else {
        (remaining + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    };

    Subscription {
        purchase,
        content,
        expires_at: Some(expires_at),
        is_active: now < expires_at,
        days_remaining: Some(days_remaining),
    }
}
