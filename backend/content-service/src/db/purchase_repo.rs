use super::PurchaseLedger;
use crate::error::{AppError, Result};
use crate::models::{NewPurchase, Purchase, PurchaseStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const PURCHASE_COLUMNS: &str =
    "id, user_id, content_id, creator_id, transaction_hash, amount, status, purchase_date";

const TRANSACTION_HASH_CONSTRAINT: &str = "purchases_transaction_hash_key";

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    user_id: String,
    content_id: Uuid,
    creator_id: String,
    transaction_hash: String,
    amount: f64,
    status: String,
    purchase_date: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = AppError;

    fn try_from(row: PurchaseRow) -> Result<Self> {
        Ok(Purchase {
            id: row.id,
            user_id: row.user_id,
            content_id: row.content_id,
            creator_id: row.creator_id,
            transaction_hash: row.transaction_hash,
            amount: row.amount,
            status: row.status.parse::<PurchaseStatus>()?,
            purchase_date: row.purchase_date,
        })
    }
}

fn into_purchases(rows: Vec<PurchaseRow>) -> Result<Vec<Purchase>> {
    rows.into_iter().map(Purchase::try_from).collect()
}

/// Unique violations become Conflict, naming which key collided
fn map_record_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = if db_err.constraint() == Some(TRANSACTION_HASH_CONSTRAINT) {
                "transaction hash already recorded"
            } else {
                "content already purchased"
            };
            return AppError::Conflict(message.into());
        }
    }
    AppError::Database(err)
}

/// PostgreSQL-backed purchase ledger
#[derive(Clone)]
pub struct PgPurchaseLedger {
    pool: PgPool,
}

impl PgPurchaseLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PurchaseLedger for PgPurchaseLedger {
    async fn record(&self, purchase: NewPurchase) -> Result<Purchase> {
        // The unique keys are the only duplicate guard; there is no
        // check-then-insert window.
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            INSERT INTO purchases (id, user_id, content_id, creator_id, transaction_hash, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PURCHASE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&purchase.user_id)
        .bind(purchase.content_id)
        .bind(&purchase.creator_id)
        .bind(&purchase.transaction_hash)
        .bind(purchase.amount)
        .bind(purchase.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_record_error)?;

        row.try_into()
    }

    async fn find(&self, user_id: &str, content_id: Uuid) -> Result<Option<Purchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE user_id = $1 AND content_id = $2"
        ))
        .bind(user_id)
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Purchase::try_from).transpose()
    }

    async fn list_by_buyer(&self, user_id: &str) -> Result<Vec<Purchase>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS}
            FROM purchases
            WHERE user_id = $1
            ORDER BY purchase_date DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_purchases(rows)
    }

    async fn list_by_creator(&self, creator_id: &str) -> Result<Vec<Purchase>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS}
            FROM purchases
            WHERE creator_id = $1
            ORDER BY purchase_date DESC, id DESC
            "#
        ))
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        into_purchases(rows)
    }
}
