/// Database access layer
///
/// Two storage contracts back every service:
/// - [`ContentStore`]: content records, their likes, comments and comment likes
/// - [`PurchaseLedger`]: append-only purchase rows
///
/// Both have a PostgreSQL implementation and an in-memory implementation used
/// for local development and tests. Every counter/list mutation is a single
/// atomic store operation; callers never read-modify-write a record.
pub mod content_repo;
pub mod memory;
pub mod purchase_repo;

pub use content_repo::PgContentStore;
pub use memory::MemoryStore;
pub use purchase_repo::PgPurchaseLedger;

use crate::error::Result;
use crate::models::{
    Comment, ContentDraft, ContentFilter, ContentItem, ContentPatch, ContentSummary, LikeToggle,
    NewComment, NewPurchase, OwnerContentStats, PageRequest, Purchase, SearchHit,
};
use sqlx::migrate::Migrator;
use uuid::Uuid;

/// Embedded schema migrations for the PostgreSQL store
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert a new content item owned by `owner_id`
    async fn create_content(&self, owner_id: &str, draft: ContentDraft) -> Result<ContentItem>;

    /// Fetch the full record with likes and comments
    async fn get_by_id(&self, id: Uuid) -> Result<Option<ContentItem>>;

    /// Apply an owner edit. The owner predicate is part of the write itself.
    /// Fails NotFound when the id does not resolve, Forbidden when it belongs
    /// to someone else.
    async fn update_by_id(&self, id: Uuid, owner_id: &str, patch: ContentPatch)
        -> Result<ContentItem>;

    /// Delete an owned item together with its likes and comments
    async fn delete_by_id(&self, id: Uuid, owner_id: &str) -> Result<()>;

    /// Arithmetic `views + 1`, returning the new count
    async fn increment_views(&self, id: Uuid) -> Result<i64>;

    /// Add or remove the caller's like and recompute `likes_count`
    async fn toggle_like(&self, id: Uuid, user_id: &str) -> Result<LikeToggle>;

    /// Same as [`ContentStore::toggle_like`] for a nested comment
    async fn toggle_comment_like(
        &self,
        id: Uuid,
        comment_id: Uuid,
        user_id: &str,
    ) -> Result<LikeToggle>;

    /// Append a comment and recompute `comments_count`
    async fn add_comment(&self, id: Uuid, comment: NewComment) -> Result<Comment>;

    /// Remove a comment when `requester_id` is its author or the content owner
    async fn delete_comment(&self, id: Uuid, comment_id: Uuid, requester_id: &str)
        -> Result<()>;

    /// Newest-first comment page plus the total comment count
    async fn list_comments(&self, id: Uuid, page: PageRequest) -> Result<(Vec<Comment>, i64)>;

    /// Newest-first feed page plus the total number of matches
    async fn list_content(
        &self,
        filter: &ContentFilter,
        page: PageRequest,
    ) -> Result<(Vec<ContentSummary>, i64)>;

    /// Published items matching `query`, best match first
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>>;

    /// Summaries for the given ids; unknown ids are skipped
    async fn get_summaries(&self, ids: &[Uuid]) -> Result<Vec<ContentSummary>>;

    /// Totals over every item owned by `owner_id`
    async fn owner_stats(&self, owner_id: &str) -> Result<OwnerContentStats>;
}

#[async_trait::async_trait]
pub trait PurchaseLedger: Send + Sync {
    /// Append a purchase. Fails Conflict when the (user, content) pair or the
    /// transaction hash already exists.
    async fn record(&self, purchase: NewPurchase) -> Result<Purchase>;

    async fn find(&self, user_id: &str, content_id: Uuid) -> Result<Option<Purchase>>;

    /// Purchases made by `user_id`, newest first
    async fn list_by_buyer(&self, user_id: &str) -> Result<Vec<Purchase>>;

    /// Purchases of content created by `creator_id`, newest first
    async fn list_by_creator(&self, creator_id: &str) -> Result<Vec<Purchase>>;
}

/// Escape LIKE/ILIKE wildcards and wrap the needle for substring matching
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("block"), "%block%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
