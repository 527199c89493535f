use async_trait::async_trait;
use chrono::{DateTime, Utc};
use preora_core::{CoreError, CoreResult, PreorderRepository};
use preora_shared::{
    Preorder, PreorderLineItem, PreorderStatus, PreorderStatusUpdate, PreorderTotals,
};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::db_error::{db_error, decode_error};

/// Preorders are stored one row per aggregate, line items as a JSONB
/// document, so creation is a single atomic INSERT.
pub struct StorePreorderRepository {
    pool: PgPool,
}

impl StorePreorderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PreorderRow {
    id: String,
    customer_id: String,
    offer_id: Option<String>,
    items: Json<Vec<PreorderLineItem>>,
    total_price: i64,
    total_downpayment: i64,
    currency: String,
    status: String,
    payment_status: String,
    shipping_status: String,
    expected_release: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PreorderRow> for Preorder {
    type Error = CoreError;

    fn try_from(row: PreorderRow) -> Result<Self, Self::Error> {
        let mut preorder = Preorder::new(
            row.id,
            row.customer_id,
            row.offer_id,
            row.items.0,
            PreorderTotals {
                price: row.total_price,
                downpayment: row.total_downpayment,
            },
            row.currency,
        );
        preorder.status = row.status.parse().map_err(|e| decode_error("preorder", e))?;
        preorder.payment_status = row
            .payment_status
            .parse()
            .map_err(|e| decode_error("preorder", e))?;
        preorder.shipping_status = row
            .shipping_status
            .parse()
            .map_err(|e| decode_error("preorder", e))?;
        preorder.expected_release = row.expected_release;
        preorder.created_at = row.created_at;
        preorder.updated_at = row.updated_at;
        Ok(preorder)
    }
}

const PREORDER_COLUMNS: &str = "id, customer_id, offer_id, items, total_price, total_downpayment, currency, \
     status, payment_status, shipping_status, expected_release, created_at, updated_at";

#[async_trait]
impl PreorderRepository for StorePreorderRepository {
    async fn create(&self, preorder: &Preorder) -> CoreResult<()> {
        let totals = preorder.totals();

        sqlx::query(
            r#"
            INSERT INTO preorders (id, customer_id, offer_id, items, total_price, total_downpayment, currency,
                                   status, payment_status, shipping_status, expected_release, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&preorder.id)
        .bind(&preorder.customer_id)
        .bind(&preorder.offer_id)
        .bind(Json(preorder.items()))
        .bind(totals.price)
        .bind(totals.downpayment)
        .bind(&preorder.currency)
        .bind(preorder.status.as_str())
        .bind(preorder.payment_status.as_str())
        .bind(preorder.shipping_status.as_str())
        .bind(preorder.expected_release)
        .bind(preorder.created_at)
        .bind(preorder.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn get(&self, id: &str) -> CoreResult<Preorder> {
        let row = sqlx::query_as::<_, PreorderRow>(&format!(
            "SELECT {} FROM preorders WHERE id = $1",
            PREORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.ok_or_else(|| CoreError::NotFound(format!("preorder {}", id)))?
            .try_into()
    }

    async fn list(&self, owner_id: Option<&str>) -> CoreResult<Vec<Preorder>> {
        let rows = sqlx::query_as::<_, PreorderRow>(&format!(
            "SELECT {} FROM preorders WHERE ($1::TEXT IS NULL OR customer_id = $1) ORDER BY created_at DESC, id DESC",
            PREORDER_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Preorder::try_from).collect()
    }

    async fn update_status(
        &self,
        id: &str,
        expected: PreorderStatus,
        update: &PreorderStatusUpdate,
    ) -> CoreResult<Option<Preorder>> {
        let row = sqlx::query_as::<_, PreorderRow>(&format!(
            r#"
            UPDATE preorders SET
                status = COALESCE($3, status),
                payment_status = COALESCE($4, payment_status),
                shipping_status = COALESCE($5, shipping_status),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            PREORDER_COLUMNS
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.payment_status.map(|s| s.as_str()))
        .bind(update.shipping_status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None => {
                // Zero rows: either the id is unknown or the status moved on.
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM preorders WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(db_error)?;
                if exists {
                    Ok(None)
                } else {
                    Err(CoreError::NotFound(format!("preorder {}", id)))
                }
            }
        }
    }
}
