/// Creator dashboard - content stats and earnings
use super::earnings::{self, ContentEarnings, EarningsSummary, EarningsWindows};
use crate::db::{ContentStore, PurchaseLedger};
use crate::error::Result;
use crate::models::{OwnerContentStats, Purchase, PurchaseStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

const RECENT_SALES_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(flatten)]
    pub content: OwnerContentStats,
    pub total_earnings: f64,
    pub total_sales: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsReport {
    #[serde(flatten)]
    pub summary: EarningsSummary,
    pub by_content: Vec<ContentEarnings>,
    pub recent_sales: Vec<Purchase>,
}

pub struct DashboardService {
    store: Arc<dyn ContentStore>,
    ledger: Arc<dyn PurchaseLedger>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn ContentStore>, ledger: Arc<dyn PurchaseLedger>) -> Self {
        Self { store, ledger }
    }

    pub async fn stats(&self, owner_id: &str) -> Result<DashboardStats> {
        let content = self.store.owner_stats(owner_id).await?;
        let sales = self.ledger.list_by_creator(owner_id).await?;

        let (total_earnings, total_sales) = sales
            .iter()
            .filter(|p| p.status == PurchaseStatus::Completed)
            .fold((0.0, 0), |(amount, count), p| (amount + p.amount, count + 1));

        Ok(DashboardStats {
            content,
            total_earnings,
            total_sales,
        })
    }

    pub async fn earnings(&self, creator_id: &str, now: DateTime<Utc>) -> Result<EarningsReport> {
        let windows = EarningsWindows::at(now)?;
        let sales = self.ledger.list_by_creator(creator_id).await?;

        let ids: Vec<Uuid> = sales
            .iter()
            .map(|p| p.content_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let contents = self.store.get_summaries(&ids).await?;

        let summary = earnings::summarize(&sales, &windows);
        let by_content = earnings::breakdown(&sales, &contents);
        let recent_sales = sales
            .into_iter()
            .filter(|p| p.status == PurchaseStatus::Completed)
            .take(RECENT_SALES_LIMIT)
            .collect();

        tracing::debug!(
            creator_id,
            lifetime = summary.lifetime.amount,
            "earnings computed"
        );

        Ok(EarningsReport {
            summary,
            by_content,
            recent_sales,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{ContentDraft, ContentType, CreatorInfo, SubscriptionTier};

    fn draft(title: &str, content_type: ContentType, price: f64) -> ContentDraft {
        ContentDraft {
            title: title.to_string(),
            description: String::new(),
            content_type,
            content_url: "https://cdn.example.com/x".to_string(),
            thumbnail_url: None,
            creator: CreatorInfo {
                name: "Heidi".to_string(),
                ..CreatorInfo::default()
            },
            subscription_tier: SubscriptionTier::Premium,
            price,
            categories: vec![],
            is_published: true,
        }
    }

    #[tokio::test]
    async fn test_stats_and_breakdown_drop_deleted_content() {
        let store = Arc::new(MemoryStore::new());
        let service = DashboardService::new(store.clone(), store.clone());

        let kept = store
            .create_content("heidi", draft("kept", ContentType::Video, 4.0))
            .await
            .unwrap();
        let removed = store
            .create_content("heidi", draft("removed", ContentType::Article, 1.0))
            .await
            .unwrap();

        for (buyer, content, tx) in [
            ("a", &kept, "0x1"),
            ("b", &kept, "0x2"),
            ("a", &removed, "0x3"),
        ] {
            store
                .record(crate::models::NewPurchase {
                    user_id: buyer.to_string(),
                    content_id: content.id,
                    creator_id: "heidi".to_string(),
                    transaction_hash: tx.to_string(),
                    amount: content.price,
                    status: PurchaseStatus::Completed,
                })
                .await
                .unwrap();
        }
        store.delete_by_id(removed.id, "heidi").await.unwrap();

        let stats = service.stats("heidi").await.unwrap();
        assert_eq!(stats.content.total_content, 1);
        assert_eq!(stats.content.by_type.get("video"), Some(&1));
        assert_eq!(stats.total_sales, 3);
        assert_eq!(stats.total_earnings, 9.0);

        let report = service.earnings("heidi", Utc::now()).await.unwrap();
        assert_eq!(report.summary.lifetime.amount, 9.0);
        assert_eq!(report.by_content.len(), 1);
        assert_eq!(report.by_content[0].title, "kept");
        assert_eq!(report.by_content[0].sales, 2);
        assert_eq!(report.recent_sales.len(), 3);
    }
}
