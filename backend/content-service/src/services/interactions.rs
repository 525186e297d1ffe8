/// Interaction service - likes, comments and view counting
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::metrics::{self, VIEW_INCREMENT_FAILURES_TOTAL};
use crate::models::content::MAX_COMMENT_LENGTH;
use crate::models::{Comment, LikeToggle, NewComment, Page, PageRequest, Pagination};
use std::sync::Arc;
use uuid::Uuid;

/// Profile fields copied onto a comment when it is written
#[derive(Debug, Clone, PartialEq)]
pub struct CommentAuthor {
    pub user_id: String,
    pub name: String,
    pub image: Option<String>,
}

pub struct InteractionService {
    store: Arc<dyn ContentStore>,
}

impl InteractionService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Like or unlike. The returned state is the post-toggle truth.
    pub async fn toggle_content_like(&self, content_id: Uuid, user_id: &str) -> Result<LikeToggle> {
        let toggle = self.store.toggle_like(content_id, user_id).await?;
        metrics::record_interaction(if toggle.is_liked { "like" } else { "unlike" });

        tracing::debug!(
            %content_id,
            user_id,
            is_liked = toggle.is_liked,
            likes_count = toggle.likes_count,
            "content like toggled"
        );
        Ok(toggle)
    }

    pub async fn toggle_comment_like(
        &self,
        content_id: Uuid,
        comment_id: Uuid,
        user_id: &str,
    ) -> Result<LikeToggle> {
        let toggle = self
            .store
            .toggle_comment_like(content_id, comment_id, user_id)
            .await?;
        metrics::record_interaction(if toggle.is_liked {
            "comment_like"
        } else {
            "comment_unlike"
        });
        Ok(toggle)
    }

    pub async fn add_comment(
        &self,
        content_id: Uuid,
        author: CommentAuthor,
        text: &str,
    ) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput("comment text is required".into()));
        }
        if text.chars().count() > MAX_COMMENT_LENGTH {
            return Err(AppError::InvalidInput(format!(
                "comment must be at most {} characters",
                MAX_COMMENT_LENGTH
            )));
        }

        let comment = self
            .store
            .add_comment(
                content_id,
                NewComment {
                    user_id: author.user_id,
                    user_name: author.name,
                    user_image: author.image,
                    text: text.to_string(),
                },
            )
            .await?;
        metrics::record_interaction("comment");

        tracing::info!(%content_id, comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        content_id: Uuid,
        comment_id: Uuid,
        requester_id: &str,
    ) -> Result<()> {
        self.store
            .delete_comment(content_id, comment_id, requester_id)
            .await?;
        metrics::record_interaction("comment_delete");

        tracing::info!(%content_id, %comment_id, requester_id, "comment deleted");
        Ok(())
    }

    pub async fn list_comments(
        &self,
        content_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Comment>> {
        let (items, total) = self.store.list_comments(content_id, page).await?;
        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// Best-effort `views + 1`. Failures are logged and counted, never returned.
    pub async fn increment_view(&self, content_id: Uuid) -> Option<i64> {
        match self.store.increment_views(content_id).await {
            Ok(views) => Some(views),
            Err(err) if err.is_not_found() => None,
            Err(err) => {
                VIEW_INCREMENT_FAILURES_TOTAL.inc();
                tracing::warn!(%content_id, error = %err, "view increment failed");
                None
            }
        }
    }
}
