use super::{ContentStore, PurchaseLedger};
use crate::error::{AppError, Result};
use crate::models::content::validate_pricing;
use crate::models::{
    relevance_score, Comment, ContentDraft, ContentFilter, ContentItem, ContentPatch,
    ContentSummary, Like, LikeToggle, NewComment, NewPurchase, OwnerContentStats, PageRequest,
    Purchase, SearchHit,
};
use chrono::{DateTime, Duration, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    contents: HashMap<Uuid, ContentItem>,
    purchases: Vec<Purchase>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// Strictly increasing clock so insertion order is also time order
    fn tick(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn content_mut(&mut self, id: Uuid) -> Result<&mut ContentItem> {
        self.contents
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("content {} not found", id)))
    }

    fn owned_mut(&mut self, id: Uuid, owner_id: &str) -> Result<&mut ContentItem> {
        let item = self.content_mut(id)?;
        if item.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "only the owner can modify this content".into(),
            ));
        }
        Ok(item)
    }
}

/// In-process store backing both contracts.
///
/// A single lock guards everything, so each trait call is atomic with respect
/// to every other call. Used for local development and tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn comment_not_found(comment_id: Uuid) -> AppError {
    AppError::NotFound(format!("comment {} not found", comment_id))
}

fn newest_first(
    a: &DateTime<Utc>,
    a_id: &Uuid,
    b: &DateTime<Utc>,
    b_id: &Uuid,
) -> std::cmp::Ordering {
    b.cmp(a).then_with(|| b_id.cmp(a_id))
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    async fn create_content(&self, owner_id: &str, draft: ContentDraft) -> Result<ContentItem> {
        validate_pricing(draft.subscription_tier, draft.price)?;

        let mut inner = self.inner.write().await;
        let now = inner.tick();
        let item = ContentItem {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            title: draft.title,
            description: draft.description,
            content_type: draft.content_type,
            content_url: draft.content_url,
            thumbnail_url: draft.thumbnail_url,
            creator: draft.creator,
            subscription_tier: draft.subscription_tier,
            price: draft.price,
            categories: draft.categories,
            is_published: draft.is_published,
            views: 0,
            likes: Vec::new(),
            likes_count: 0,
            comments: Vec::new(),
            comments_count: 0,
            created_at: now,
            updated_at: now,
        };
        inner.contents.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ContentItem>> {
        Ok(self.inner.read().await.contents.get(&id).cloned())
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        owner_id: &str,
        patch: ContentPatch,
    ) -> Result<ContentItem> {
        let mut inner = self.inner.write().await;
        let now = inner.tick();
        let item = inner.owned_mut(id, owner_id)?;

        let mut updated = item.clone();
        patch.apply_to(&mut updated);
        validate_pricing(updated.subscription_tier, updated.price)?;
        updated.updated_at = now;

        *item = updated.clone();
        Ok(updated)
    }

    async fn delete_by_id(&self, id: Uuid, owner_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.owned_mut(id, owner_id)?;
        inner.contents.remove(&id);
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<i64> {
        let mut inner = self.inner.write().await;
        let item = inner.content_mut(id)?;
        item.views += 1;
        Ok(item.views)
    }

    async fn toggle_like(&self, id: Uuid, user_id: &str) -> Result<LikeToggle> {
        let mut inner = self.inner.write().await;
        let now = inner.tick();
        let item = inner.content_mut(id)?;

        let is_liked = match item.likes.iter().position(|like| like.user_id == user_id) {
            Some(index) => {
                item.likes.remove(index);
                false
            }
            None => {
                item.likes.push(Like {
                    user_id: user_id.to_string(),
                    created_at: now,
                });
                true
            }
        };
        item.likes_count = item.likes.len() as i64;

        Ok(LikeToggle {
            is_liked,
            likes_count: item.likes_count,
        })
    }

    async fn toggle_comment_like(
        &self,
        id: Uuid,
        comment_id: Uuid,
        user_id: &str,
    ) -> Result<LikeToggle> {
        let mut inner = self.inner.write().await;
        let now = inner.tick();
        let item = inner.content_mut(id)?;
        let comment = item
            .comments
            .iter_mut()
            .find(|comment| comment.id == comment_id)
            .ok_or_else(|| comment_not_found(comment_id))?;

        let is_liked = match comment.likes.iter().position(|like| like.user_id == user_id) {
            Some(index) => {
                comment.likes.remove(index);
                false
            }
            None => {
                comment.likes.push(Like {
                    user_id: user_id.to_string(),
                    created_at: now,
                });
                true
            }
        };
        comment.likes_count = comment.likes.len() as i64;

        Ok(LikeToggle {
            is_liked,
            likes_count: comment.likes_count,
        })
    }

    async fn add_comment(&self, id: Uuid, comment: NewComment) -> Result<Comment> {
        let mut inner = self.inner.write().await;
        let now = inner.tick();
        let item = inner.content_mut(id)?;

        let comment = Comment {
            id: Uuid::new_v4(),
            user_id: comment.user_id,
            user_name: comment.user_name,
            user_image: comment.user_image,
            text: comment.text,
            created_at: now,
            updated_at: now,
            likes: Vec::new(),
            likes_count: 0,
        };
        item.comments.push(comment.clone());
        item.comments_count = item.comments.len() as i64;
        Ok(comment)
    }

    async fn delete_comment(
        &self,
        id: Uuid,
        comment_id: Uuid,
        requester_id: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let item = inner.content_mut(id)?;
        let index = item
            .comments
            .iter()
            .position(|comment| comment.id == comment_id)
            .ok_or_else(|| comment_not_found(comment_id))?;

        if item.comments[index].user_id != requester_id && item.owner_id != requester_id {
            return Err(AppError::Forbidden(
                "only the comment author or the content owner can delete this comment".into(),
            ));
        }

        item.comments.remove(index);
        item.comments_count = item.comments.len() as i64;
        Ok(())
    }

    async fn list_comments(&self, id: Uuid, page: PageRequest) -> Result<(Vec<Comment>, i64)> {
        let inner = self.inner.read().await;
        let item = inner
            .contents
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("content {} not found", id)))?;

        let mut comments = item.comments.clone();
        comments.sort_by(|a, b| newest_first(&a.created_at, &a.id, &b.created_at, &b.id));
        Ok((paginate(comments, page), item.comments_count))
    }

    async fn list_content(
        &self,
        filter: &ContentFilter,
        page: PageRequest,
    ) -> Result<(Vec<ContentSummary>, i64)> {
        let inner = self.inner.read().await;
        let mut matched: Vec<&ContentItem> = inner
            .contents
            .values()
            .filter(|item| filter.matches(item))
            .collect();
        matched.sort_by(|a, b| newest_first(&a.created_at, &a.id, &b.created_at, &b.id));

        let total = matched.len() as i64;
        let items = paginate(matched, page)
            .into_iter()
            .map(ContentItem::summary)
            .collect();
        Ok((items, total))
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;

        let mut hits: Vec<SearchHit> = inner
            .contents
            .values()
            .filter(|item| item.is_published)
            .filter_map(|item| {
                let score = relevance_score(item, &needle);
                (score > 0).then(|| SearchHit {
                    id: item.id,
                    title: item.title.clone(),
                    content_type: item.content_type,
                    thumbnail_url: item.thumbnail_url.clone(),
                    creator_name: item.creator.name.clone(),
                    categories: item.categories.clone(),
                    subscription_tier: item.subscription_tier,
                    price: item.price,
                    views: item.views,
                    likes_count: item.likes_count,
                    created_at: item.created_at,
                    score,
                })
            })
            .collect();

        hits.sort_by_key(|hit| (Reverse(hit.score), Reverse(hit.created_at), Reverse(hit.id)));
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn get_summaries(&self, ids: &[Uuid]) -> Result<Vec<ContentSummary>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.contents.get(id))
            .map(ContentItem::summary)
            .collect())
    }

    async fn owner_stats(&self, owner_id: &str) -> Result<OwnerContentStats> {
        let inner = self.inner.read().await;
        let mut stats = OwnerContentStats::default();
        for item in inner.contents.values().filter(|item| item.owner_id == owner_id) {
            stats.total_content += 1;
            if item.is_published {
                stats.published_content += 1;
            }
            stats.total_views += item.views;
            stats.total_likes += item.likes_count;
            stats.total_comments += item.comments_count;
            *stats
                .by_type
                .entry(item.content_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl PurchaseLedger for MemoryStore {
    async fn record(&self, purchase: NewPurchase) -> Result<Purchase> {
        let mut inner = self.inner.write().await;

        if inner
            .purchases
            .iter()
            .any(|p| p.user_id == purchase.user_id && p.content_id == purchase.content_id)
        {
            return Err(AppError::Conflict("content already purchased".into()));
        }
        if inner
            .purchases
            .iter()
            .any(|p| p.transaction_hash == purchase.transaction_hash)
        {
            return Err(AppError::Conflict("transaction hash already recorded".into()));
        }

        let now = inner.tick();
        let purchase = Purchase {
            id: Uuid::new_v4(),
            user_id: purchase.user_id,
            content_id: purchase.content_id,
            creator_id: purchase.creator_id,
            transaction_hash: purchase.transaction_hash,
            amount: purchase.amount,
            status: purchase.status,
            purchase_date: now,
        };
        inner.purchases.push(purchase.clone());
        Ok(purchase)
    }

    async fn find(&self, user_id: &str, content_id: Uuid) -> Result<Option<Purchase>> {
        let inner = self.inner.read().await;
        Ok(inner
            .purchases
            .iter()
            .find(|p| p.user_id == user_id && p.content_id == content_id)
            .cloned())
    }

    async fn list_by_buyer(&self, user_id: &str) -> Result<Vec<Purchase>> {
        let inner = self.inner.read().await;
        // Appended in clock order, so reverse iteration is newest first.
        Ok(inner
            .purchases
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_by_creator(&self, creator_id: &str) -> Result<Vec<Purchase>> {
        let inner = self.inner.read().await;
        Ok(inner
            .purchases
            .iter()
            .rev()
            .filter(|p| p.creator_id == creator_id)
            .cloned()
            .collect())
    }
}
