/// Feed service - listing, search and single-item reads
use crate::config::FeedConfig;
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{
    ContentFilter, ContentSummary, ContentType, ContentView, Page, PageRequest, Pagination,
    SearchHit,
};
use crate::services::InteractionService;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Which publication states a listing may include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Published,
    Draft,
    All,
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "published" => Ok(Visibility::Published),
            "draft" | "drafts" => Ok(Visibility::Draft),
            "all" => Ok(Visibility::All),
            other => Err(AppError::InvalidInput(format!("unknown filter '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedQuery {
    pub content_type: Option<ContentType>,
    pub owner_id: Option<String>,
    pub category: Option<String>,
    pub visibility: Visibility,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub struct FeedService {
    store: Arc<dyn ContentStore>,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(store: Arc<dyn ContentStore>, config: FeedConfig) -> Self {
        Self { store, config }
    }

    fn page_request(&self, page: Option<u32>, limit: Option<u32>) -> Result<PageRequest> {
        PageRequest::resolve(
            page,
            Some(limit.unwrap_or(self.config.default_page_size)),
            self.config.max_page_size,
        )
    }

    /// Newest-first page of summaries. Drafts are only listed for their
    /// owner, and only when the listing is scoped to that owner.
    pub async fn list_content(
        &self,
        query: FeedQuery,
        caller: Option<&str>,
    ) -> Result<Page<ContentSummary>> {
        let page = self.page_request(query.page, query.limit)?;

        let is_published = match query.visibility {
            Visibility::Published => Some(true),
            hidden => {
                let Some(caller) = caller else {
                    return Err(AppError::Unauthorized(
                        "sign in to list unpublished content".into(),
                    ));
                };
                if query.owner_id.as_deref() != Some(caller) {
                    return Err(AppError::Forbidden(
                        "unpublished content is only listed for its owner".into(),
                    ));
                }
                match hidden {
                    Visibility::Draft => Some(false),
                    _ => None,
                }
            }
        };

        let filter = ContentFilter {
            content_type: query.content_type,
            owner_id: query.owner_id,
            is_published,
            category: query
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        };

        let (items, total) = self.store.list_content(&filter, page).await?;
        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput("search query is required".into()));
        }

        let hits = self
            .store
            .search(query, self.config.search_result_limit)
            .await?;
        tracing::debug!(query, hits = hits.len(), "search completed");
        Ok(hits)
    }

    /// Read one item, counting the read as a view. A failed increment never
    /// fails the read.
    pub async fn get_single_content(
        &self,
        content_id: Uuid,
        viewer_id: Option<&str>,
    ) -> Result<ContentView> {
        InteractionService::new(self.store.clone())
            .increment_view(content_id)
            .await;

        let item = self
            .store
            .get_by_id(content_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("content {} not found", content_id)))?;

        let is_liked = viewer_id.is_some_and(|viewer| item.is_liked_by(viewer));
        Ok(ContentView { item, is_liked })
    }
}
