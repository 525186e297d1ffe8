use super::{like_pattern, ContentStore};
use crate::error::{map_content_write_error, AppError, Result};
use crate::models::content::{CATEGORY_WEIGHT, CREATOR_WEIGHT, DESCRIPTION_WEIGHT, TITLE_WEIGHT};
use crate::models::{
    Comment, ContentDraft, ContentFilter, ContentItem, ContentPatch, ContentSummary, ContentType,
    CreatorInfo, Like, LikeToggle, NewComment, OwnerContentStats, PageRequest, SearchHit,
    SubscriptionTier,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgConnection;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use uuid::Uuid;

const CONTENT_COLUMNS: &str = r#"
    id, owner_id, title, description, content_type, content_url, thumbnail_url,
    creator_name, creator_wallet_id, creator_bio, creator_social_links,
    subscription_tier, price, categories, is_published,
    views, likes_count, comments_count, created_at, updated_at
"#;

const COMMENT_COLUMNS: &str =
    "id, user_id, user_name, user_image, text, likes_count, created_at, updated_at";

/// Raw `contents` row. Optional columns may be NULL on rows written before
/// those columns existed; conversion fills in defaults.
#[derive(Debug, sqlx::FromRow)]
struct ContentRow {
    id: Uuid,
    owner_id: String,
    title: String,
    description: Option<String>,
    content_type: String,
    content_url: String,
    thumbnail_url: Option<String>,
    creator_name: Option<String>,
    creator_wallet_id: Option<String>,
    creator_bio: Option<String>,
    creator_social_links: Option<Json<BTreeMap<String, String>>>,
    subscription_tier: Option<String>,
    price: Option<f64>,
    categories: Option<Vec<String>>,
    is_published: bool,
    views: i64,
    likes_count: i64,
    comments_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContentRow {
    fn content_type(&self) -> ContentType {
        parse_or_default(Some(self.content_type.as_str()), self.id, "content_type")
    }

    fn tier(&self) -> SubscriptionTier {
        parse_or_default(self.subscription_tier.as_deref(), self.id, "subscription_tier")
    }

    fn into_item(self, likes: Vec<Like>, comments: Vec<Comment>) -> ContentItem {
        let content_type = self.content_type();
        let subscription_tier = self.tier();

        ContentItem {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            content_type,
            content_url: self.content_url,
            thumbnail_url: self.thumbnail_url,
            creator: CreatorInfo {
                name: self.creator_name.unwrap_or_default(),
                wallet_id: self.creator_wallet_id,
                bio: self.creator_bio,
                social_links: self
                    .creator_social_links
                    .map(|links| links.0)
                    .unwrap_or_default(),
            },
            subscription_tier,
            price: self.price.unwrap_or(0.0),
            categories: self.categories.unwrap_or_default(),
            is_published: self.is_published,
            views: self.views,
            likes,
            likes_count: self.likes_count,
            comments,
            comments_count: self.comments_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn into_summary(self) -> ContentSummary {
        let content_type = self.content_type();
        let subscription_tier = self.tier();

        ContentSummary {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            content_type,
            thumbnail_url: self.thumbnail_url,
            creator_name: self.creator_name.unwrap_or_default(),
            creator_wallet_id: self.creator_wallet_id,
            subscription_tier,
            price: self.price.unwrap_or(0.0),
            categories: self.categories.unwrap_or_default(),
            is_published: self.is_published,
            views: self.views,
            likes_count: self.likes_count,
            comments_count: self.comments_count,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SearchRow {
    #[sqlx(flatten)]
    content: ContentRow,
    score: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    user_id: String,
    user_name: String,
    user_image: Option<String>,
    text: String,
    likes_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self, likes: Vec<Like>) -> Comment {
        Comment {
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            user_image: self.user_image,
            text: self.text,
            created_at: self.created_at,
            updated_at: self.updated_at,
            likes,
            likes_count: self.likes_count,
        }
    }
}

fn parse_or_default<T: FromStr + Default>(raw: Option<&str>, id: Uuid, column: &str) -> T {
    match raw {
        None => T::default(),
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(content_id = %id, column, value, "unrecognised value, using default");
            T::default()
        }),
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("content {} not found", id))
}

fn comment_not_found(comment_id: Uuid) -> AppError {
    AppError::NotFound(format!("comment {} not found", comment_id))
}

/// Lock the content row for the rest of the transaction and return its owner.
///
/// Every interaction write on a content item goes through this lock, so
/// child-row changes and the count recompute are serialized per document.
async fn lock_content(conn: &mut PgConnection, id: Uuid) -> Result<String> {
    sqlx::query_scalar::<_, String>("SELECT owner_id FROM contents WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Open a read-only REPEATABLE READ transaction so a document, its child
/// rows and its counters come from one snapshot.
async fn snapshot_tx(pool: &PgPool) -> Result<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

async fn load_likes(conn: &mut PgConnection, id: Uuid) -> Result<Vec<Like>> {
    let rows = sqlx::query_as::<_, (String, DateTime<Utc>)>(
        r#"
        SELECT user_id, created_at
        FROM content_likes
        WHERE content_id = $1
        ORDER BY created_at ASC, user_id ASC
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(user_id, created_at)| Like {
            user_id,
            created_at,
        })
        .collect())
}

async fn load_comment_likes(
    conn: &mut PgConnection,
    comment_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Like>>> {
    if comment_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
        r#"
        SELECT comment_id, user_id, created_at
        FROM comment_likes
        WHERE comment_id = ANY($1)
        ORDER BY created_at ASC, user_id ASC
        "#,
    )
    .bind(comment_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut likes: HashMap<Uuid, Vec<Like>> = HashMap::new();
    for (comment_id, user_id, created_at) in rows {
        likes.entry(comment_id).or_default().push(Like {
            user_id,
            created_at,
        });
    }
    Ok(likes)
}

async fn attach_comment_likes(
    conn: &mut PgConnection,
    rows: Vec<CommentRow>,
) -> Result<Vec<Comment>> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut likes = load_comment_likes(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let comment_likes = likes.remove(&row.id).unwrap_or_default();
            row.into_comment(comment_likes)
        })
        .collect())
}

async fn load_comments(conn: &mut PgConnection, id: Uuid) -> Result<Vec<Comment>> {
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM content_comments
        WHERE content_id = $1
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    attach_comment_likes(conn, rows).await
}

/// PostgreSQL-backed content store
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Explain why an owner-scoped write matched no row.
    async fn ownership_error(&self, id: Uuid) -> Result<AppError> {
        let owner: Option<String> =
            sqlx::query_scalar("SELECT owner_id FROM contents WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match owner {
            None => not_found(id),
            Some(_) => AppError::Forbidden("only the owner can modify this content".into()),
        })
    }
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a ContentFilter) {
    qb.push(" WHERE TRUE");
    if let Some(content_type) = filter.content_type {
        qb.push(" AND content_type = ").push_bind(content_type.as_str());
    }
    if let Some(owner_id) = filter.owner_id.as_deref() {
        qb.push(" AND owner_id = ").push_bind(owner_id);
    }
    if let Some(is_published) = filter.is_published {
        qb.push(" AND is_published = ").push_bind(is_published);
    }
    if let Some(category) = filter.category.as_deref() {
        qb.push(" AND ")
            .push_bind(category)
            .push(" = ANY(categories)");
    }
}

#[async_trait::async_trait]
impl ContentStore for PgContentStore {
    async fn create_content(&self, owner_id: &str, draft: ContentDraft) -> Result<ContentItem> {
        let row = sqlx::query_as::<_, ContentRow>(&format!(
            r#"
            INSERT INTO contents (
                id, owner_id, title, description, content_type, content_url, thumbnail_url,
                creator_name, creator_wallet_id, creator_bio, creator_social_links,
                subscription_tier, price, categories, is_published
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {CONTENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.content_type.as_str())
        .bind(&draft.content_url)
        .bind(&draft.thumbnail_url)
        .bind(&draft.creator.name)
        .bind(&draft.creator.wallet_id)
        .bind(&draft.creator.bio)
        .bind(Json(&draft.creator.social_links))
        .bind(draft.subscription_tier.as_str())
        .bind(draft.price)
        .bind(&draft.categories)
        .bind(draft.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(map_content_write_error)?;

        Ok(row.into_item(Vec::new(), Vec::new()))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ContentItem>> {
        let mut tx = snapshot_tx(&self.pool).await?;

        let row = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {CONTENT_COLUMNS} FROM contents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let likes = load_likes(&mut tx, id).await?;
        let comments = load_comments(&mut tx, id).await?;
        tx.commit().await?;

        Ok(Some(row.into_item(likes, comments)))
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        owner_id: &str,
        patch: ContentPatch,
    ) -> Result<ContentItem> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE contents
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                content_type = COALESCE($5, content_type),
                content_url = COALESCE($6, content_url),
                thumbnail_url = COALESCE($7, thumbnail_url),
                subscription_tier = COALESCE($8, subscription_tier),
                price = COALESCE($9, price),
                categories = COALESCE($10, categories),
                is_published = COALESCE($11, is_published),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.content_type.map(|t| t.as_str()))
        .bind(&patch.content_url)
        .bind(&patch.thumbnail_url)
        .bind(patch.subscription_tier.map(|t| t.as_str()))
        .bind(patch.price)
        .bind(&patch.categories)
        .bind(patch.is_published)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_content_write_error)?;

        if updated.is_none() {
            return Err(self.ownership_error(id).await?);
        }

        self.get_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    async fn delete_by_id(&self, id: Uuid, owner_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM contents WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(self.ownership_error(id).await?);
        }
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE contents SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn toggle_like(&self, id: Uuid, user_id: &str) -> Result<LikeToggle> {
        let mut tx = self.pool.begin().await?;
        lock_content(&mut tx, id).await?;

        let removed =
            sqlx::query("DELETE FROM content_likes WHERE content_id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                > 0;

        if !removed {
            sqlx::query("INSERT INTO content_likes (content_id, user_id) VALUES ($1, $2)")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let likes_count: i64 = sqlx::query_scalar(
            r#"
            UPDATE contents
            SET likes_count = (SELECT COUNT(*) FROM content_likes WHERE content_id = $1)
            WHERE id = $1
            RETURNING likes_count
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LikeToggle {
            is_liked: !removed,
            likes_count,
        })
    }

    async fn toggle_comment_like(
        &self,
        id: Uuid,
        comment_id: Uuid,
        user_id: &str,
    ) -> Result<LikeToggle> {
        let mut tx = self.pool.begin().await?;
        lock_content(&mut tx, id).await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM content_comments WHERE id = $1 AND content_id = $2)",
        )
        .bind(comment_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if !exists {
            return Err(comment_not_found(comment_id));
        }

        let removed =
            sqlx::query("DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2")
                .bind(comment_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                > 0;

        if !removed {
            sqlx::query("INSERT INTO comment_likes (comment_id, user_id) VALUES ($1, $2)")
                .bind(comment_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let likes_count: i64 = sqlx::query_scalar(
            r#"
            UPDATE content_comments
            SET likes_count = (SELECT COUNT(*) FROM comment_likes WHERE comment_id = $1)
            WHERE id = $1
            RETURNING likes_count
            "#,
        )
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LikeToggle {
            is_liked: !removed,
            likes_count,
        })
    }

    async fn add_comment(&self, id: Uuid, comment: NewComment) -> Result<Comment> {
        let mut tx = self.pool.begin().await?;
        lock_content(&mut tx, id).await?;

        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            INSERT INTO content_comments (id, content_id, user_id, user_name, user_image, text)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(&comment.user_id)
        .bind(&comment.user_name)
        .bind(&comment.user_image)
        .bind(&comment.text)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE contents
            SET comments_count = (SELECT COUNT(*) FROM content_comments WHERE content_id = $1)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into_comment(Vec::new()))
    }

    async fn delete_comment(
        &self,
        id: Uuid,
        comment_id: Uuid,
        requester_id: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        lock_content(&mut tx, id).await?;

        // Author-or-owner predicate lives in the DELETE itself.
        let deleted = sqlx::query(
            r#"
            DELETE FROM content_comments c
            USING contents p
            WHERE c.id = $1
              AND c.content_id = $2
              AND p.id = c.content_id
              AND (c.user_id = $3 OR p.owner_id = $3)
            "#,
        )
        .bind(comment_id)
        .bind(id)
        .bind(requester_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM content_comments WHERE id = $1 AND content_id = $2)",
            )
            .bind(comment_id)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(if exists {
                AppError::Forbidden(
                    "only the comment author or the content owner can delete this comment".into(),
                )
            } else {
                comment_not_found(comment_id)
            });
        }

        sqlx::query(
            r#"
            UPDATE contents
            SET comments_count = (SELECT COUNT(*) FROM content_comments WHERE content_id = $1)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_comments(&self, id: Uuid, page: PageRequest) -> Result<(Vec<Comment>, i64)> {
        let mut tx = snapshot_tx(&self.pool).await?;

        let total: i64 = sqlx::query_scalar("SELECT comments_count FROM contents WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found(id))?;

        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM content_comments
            WHERE content_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await?;

        let comments = attach_comment_likes(&mut tx, rows).await?;
        tx.commit().await?;

        Ok((comments, total))
    }

    async fn list_content(
        &self,
        filter: &ContentFilter,
        page: PageRequest,
    ) -> Result<(Vec<ContentSummary>, i64)> {
        let mut tx = snapshot_tx(&self.pool).await?;

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contents");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CONTENT_COLUMNS} FROM contents"
        ));
        push_filter(&mut page_query, filter);
        page_query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<ContentRow> = page_query.build_query_as().fetch_all(&mut *tx).await?;
        tx.commit().await?;

        Ok((rows.into_iter().map(ContentRow::into_summary).collect(), total))
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>> {
        let rows = sqlx::query_as::<_, SearchRow>(&format!(
            r#"
            SELECT * FROM (
                SELECT {CONTENT_COLUMNS},
                    (CASE WHEN title ILIKE $1 THEN {TITLE_WEIGHT} ELSE 0 END
                     + CASE WHEN creator_name ILIKE $1 THEN {CREATOR_WEIGHT} ELSE 0 END
                     + CASE WHEN EXISTS (
                           SELECT 1 FROM unnest(categories) AS category WHERE category ILIKE $1
                       ) THEN {CATEGORY_WEIGHT} ELSE 0 END
                     + CASE WHEN description ILIKE $1 THEN {DESCRIPTION_WEIGHT} ELSE 0 END
                    )::INT4 AS score
                FROM contents
                WHERE is_published
            ) ranked
            WHERE score > 0
            ORDER BY score DESC, created_at DESC, id DESC
            LIMIT $2
            "#
        ))
        .bind(like_pattern(query))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let score = row.score;
                let summary = row.content.into_summary();
                SearchHit {
                    id: summary.id,
                    title: summary.title,
                    content_type: summary.content_type,
                    thumbnail_url: summary.thumbnail_url,
                    creator_name: summary.creator_name,
                    categories: summary.categories,
                    subscription_tier: summary.subscription_tier,
                    price: summary.price,
                    views: summary.views,
                    likes_count: summary.likes_count,
                    created_at: summary.created_at,
                    score,
                }
            })
            .collect())
    }

    async fn get_summaries(&self, ids: &[Uuid]) -> Result<Vec<ContentSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {CONTENT_COLUMNS} FROM contents WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ContentRow::into_summary).collect())
    }

    async fn owner_stats(&self, owner_id: &str) -> Result<OwnerContentStats> {
        let rows = sqlx::query_as::<_, (String, i64, i64, i64, i64, i64)>(
            r#"
            SELECT content_type,
                   COUNT(*) AS items,
                   COUNT(*) FILTER (WHERE is_published) AS published,
                   COALESCE(SUM(views), 0)::BIGINT AS views,
                   COALESCE(SUM(likes_count), 0)::BIGINT AS likes,
                   COALESCE(SUM(comments_count), 0)::BIGINT AS comments
            FROM contents
            WHERE owner_id = $1
            GROUP BY content_type
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = OwnerContentStats::default();
        for (content_type, items, published, views, likes, comments) in rows {
            stats.total_content += items;
            stats.published_content += published;
            stats.total_views += views;
            stats.total_likes += likes;
            stats.total_comments += comments;
            *stats.by_type.entry(content_type).or_insert(0) += items;
        }
        Ok(stats)
    }
}
