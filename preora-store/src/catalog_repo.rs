use async_trait::async_trait;
use chrono::{DateTime, Utc};
use preora_core::{CatalogStore, CatalogWriter, CoreResult};
use preora_shared::{Game, GameSnapshot, Item};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::db_error::db_error;

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    name: String,
    title: Option<String>,
    description: Option<String>,
    price: i64,
    dp: i64,
    discount: i32,
    category: Option<String>,
    release_date: Option<DateTime<Utc>>,
    image: Option<String>,
    images: Vec<String>,
    game: Option<Json<GameSnapshot>>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            name: row.name,
            title: row.title,
            description: row.description,
            price: row.price,
            dp: row.dp,
            discount: row.discount,
            category: row.category,
            release_date: row.release_date,
            image: row.image,
            images: row.images,
            game: row.game.map(|g| g.0),
        }
    }
}

const ITEM_COLUMNS: &str =
    "id, name, title, description, price, dp, discount, category, release_date, image, images, game";

#[async_trait]
impl CatalogStore for StoreCatalogRepository {
    async fn get_item(&self, id: &str) -> CoreResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Item::from))
    }

    async fn get_items(&self, ids: &[String]) -> CoreResult<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE id = ANY($1)",
            ITEM_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn get_game(&self, id: &str) -> CoreResult<Option<Game>> {
        let row: Option<(String, String, Option<String>)> =
            sqlx::query_as("SELECT id, title, image FROM games WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(row.map(|(id, title, image)| Game { id, title, image }))
    }
}

#[async_trait]
impl CatalogWriter for StoreCatalogRepository {
    async fn upsert_item(&self, item: &Item) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, title, description, price, dp, discount, category, release_date, image, images, game)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name, title = EXCLUDED.title, description = EXCLUDED.description,
                price = EXCLUDED.price, dp = EXCLUDED.dp, discount = EXCLUDED.discount,
                category = EXCLUDED.category, release_date = EXCLUDED.release_date,
                image = EXCLUDED.image, images = EXCLUDED.images, game = EXCLUDED.game
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.dp)
        .bind(item.discount)
        .bind(&item.category)
        .bind(item.release_date)
        .bind(&item.image)
        .bind(&item.images)
        .bind(item.game.clone().map(Json))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }
}
