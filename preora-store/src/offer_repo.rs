use async_trait::async_trait;
use chrono::{DateTime, Utc};
use preora_core::{CoreResult, OfferLinkStore, OfferRepository};
use preora_shared::{OfferItemLink, OfferPatch, PreorderOffer};
use sqlx::PgPool;

use crate::db_error::db_error;

/// Offers and their item links. Each method issues a single statement;
/// link batches are not wrapped in a transaction.
pub struct StoreOfferRepository {
    pool: PgPool,
}

impl StoreOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: String,
    title: String,
    description: Option<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    active: bool,
    banner: Option<String>,
    logo: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OfferRow> for PreorderOffer {
    fn from(row: OfferRow) -> Self {
        PreorderOffer {
            id: row.id,
            title: row.title,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            active: row.active,
            banner: row.banner,
            logo: row.logo,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    offer_id: String,
    item_id: String,
    sort: i32,
}

impl From<LinkRow> for OfferItemLink {
    fn from(row: LinkRow) -> Self {
        OfferItemLink {
            offer_id: row.offer_id,
            item_id: row.item_id,
            sort: row.sort,
        }
    }
}

#[async_trait]
impl OfferRepository for StoreOfferRepository {
    async fn create_offer(&self, offer: &PreorderOffer) -> CoreResult<()> {
        // unique violation on id surfaces as Conflict
        sqlx::query(
            r#"
            INSERT INTO preorder_offers (id, title, description, start_date, end_date, active, banner, logo, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&offer.id)
        .bind(&offer.title)
        .bind(&offer.description)
        .bind(offer.start_date)
        .bind(offer.end_date)
        .bind(offer.active)
        .bind(&offer.banner)
        .bind(&offer.logo)
        .bind(offer.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn get_offer(&self, id: &str) -> CoreResult<Option<PreorderOffer>> {
        let row = sqlx::query_as::<_, OfferRow>(
            r#"
            SELECT id, title, description, start_date, end_date, active, banner, logo, created_at
            FROM preorder_offers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(PreorderOffer::from))
    }

    async fn list_offers(&self) -> CoreResult<Vec<PreorderOffer>> {
        let rows = sqlx::query_as::<_, OfferRow>(
            r#"
            SELECT id, title, description, start_date, end_date, active, banner, logo, created_at
            FROM preorder_offers
            ORDER BY start_date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(PreorderOffer::from).collect())
    }

    async fn update_offer(&self, id: &str, patch: &OfferPatch) -> CoreResult<Option<PreorderOffer>> {
        let row = sqlx::query_as::<_, OfferRow>(
            r#"
            UPDATE preorder_offers SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                active = COALESCE($6, active),
                banner = COALESCE($7, banner),
                logo = COALESCE($8, logo)
            WHERE id = $1
            RETURNING id, title, description, start_date, end_date, active, banner, logo, created_at
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.start_date)
        .bind(patch.end_date)
        .bind(patch.active)
        .bind(&patch.banner)
        .bind(&patch.logo)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(PreorderOffer::from))
    }

    async fn delete_offer(&self, id: &str) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM preorder_offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OfferLinkStore for StoreOfferRepository {
    async fn list_links(&self, offer_id: &str) -> CoreResult<Vec<OfferItemLink>> {
        let rows = sqlx::query_as::<_, LinkRow>(
            "SELECT offer_id, item_id, sort FROM preorder_offer_items WHERE offer_id = $1 ORDER BY sort, item_id",
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(OfferItemLink::from).collect())
    }

    async fn list_links_for_offers(&self, offer_ids: &[String]) -> CoreResult<Vec<OfferItemLink>> {
        if offer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, LinkRow>(
            "SELECT offer_id, item_id, sort FROM preorder_offer_items WHERE offer_id = ANY($1) ORDER BY offer_id, sort, item_id",
        )
        .bind(offer_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(OfferItemLink::from).collect())
    }

    async fn insert_link_if_absent(&self, link: &OfferItemLink) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO preorder_offer_items (offer_id, item_id, sort)
            VALUES ($1, $2, $3)
            ON CONFLICT (offer_id, item_id) DO NOTHING
            "#,
        )
        .bind(&link.offer_id)
        .bind(&link.item_id)
        .bind(link.sort)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_link_sort(&self, offer_id: &str, item_id: &str, sort: i32) -> CoreResult<bool> {
        let result = sqlx::query(
            "UPDATE preorder_offer_items SET sort = $3 WHERE offer_id = $1 AND item_id = $2",
        )
        .bind(offer_id)
        .bind(item_id)
        .bind(sort)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_link(&self, offer_id: &str, item_id: &str) -> CoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM preorder_offer_items WHERE offer_id = $1 AND item_id = $2",
        )
        .bind(offer_id)
        .bind(item_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_links_for_offer(&self, offer_id: &str) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM preorder_offer_items WHERE offer_id = $1")
            .bind(offer_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
