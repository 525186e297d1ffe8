/// Data models for content-service
///
/// - `content`: content items, embedded likes/comments, feed projections
/// - `purchase`: purchase ledger rows
pub mod content;
pub mod purchase;

pub use content::{
    relevance_score, Comment, ContentDraft, ContentFilter, ContentItem, ContentPatch,
    ContentSummary, ContentType, ContentView, CreatorInfo, Like, LikeToggle, NewComment,
    OwnerContentStats, SearchHit, SubscriptionTier,
};
pub use purchase::{NewPurchase, Purchase, PurchaseStatus, PurchaseStatusView, Subscription};

use crate::error::{AppError, Result};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Resolve optional query values; the limit is clamped, a zero page is rejected.
    pub fn resolve(page: Option<u32>, limit: Option<u32>, max_limit: u32) -> Result<Self> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::InvalidInput("page must be >= 1".into()));
        }
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, max_limit.max(1));
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = request.limit.max(1) as i64;
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + limit - 1) / limit,
            has_more: request.page as i64 * limit < total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
