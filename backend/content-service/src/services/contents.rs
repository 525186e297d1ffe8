/// Content service - owner-side create, edit and delete
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{ContentDraft, ContentItem, ContentPatch};
use std::sync::Arc;
use uuid::Uuid;

pub struct ContentService {
    store: Arc<dyn ContentStore>,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Create a content item owned by the caller. The creator profile in the
    /// draft is stored as a snapshot and never refreshed.
    pub async fn create(&self, owner_id: &str, draft: ContentDraft) -> Result<ContentItem> {
        let draft = draft.normalized()?;
        let item = self.store.create_content(owner_id, draft).await?;

        tracing::info!(
            content_id = %item.id,
            owner_id,
            content_type = %item.content_type,
            is_published = item.is_published,
            "content created"
        );
        Ok(item)
    }

    pub async fn update(
        &self,
        content_id: Uuid,
        owner_id: &str,
        patch: ContentPatch,
    ) -> Result<ContentItem> {
        let patch = patch.normalized()?;
        if patch.is_empty() {
            return Err(AppError::InvalidInput("no fields to update".into()));
        }

        let item = self.store.update_by_id(content_id, owner_id, patch).await?;
        tracing::info!(%content_id, owner_id, "content updated");
        Ok(item)
    }

    /// Remove the item with its likes and comments. Purchases stay in the
    /// ledger.
    pub async fn delete(&self, content_id: Uuid, owner_id: &str) -> Result<()> {
        self.store.delete_by_id(content_id, owner_id).await?;
        tracing::info!(%content_id, owner_id, "content deleted");
        Ok(())
    }
}
