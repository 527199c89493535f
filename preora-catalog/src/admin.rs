use std::sync::Arc;

use chrono::{DateTime, Utc};
use preora_core::{CatalogWriter, CoreResult};
use preora_shared::Item;
use serde::Deserialize;
use tracing::info;

use crate::lookup::{validate_item, CatalogLookup};

/// Body of an item upsert; the id comes from the path
#[derive(Debug, Clone, Deserialize)]
pub struct ItemInput {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    pub dp: i64,
    #[serde(default)]
    pub discount: i32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "releaseDate")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Game to stamp onto the item; must already exist
    #[serde(default, alias = "gameId")]
    pub game_id: Option<String>,
}

/// Item maintenance for admin tooling and seeding
#[derive(Clone)]
pub struct CatalogAdmin {
    lookup: CatalogLookup,
    writer: Arc<dyn CatalogWriter>,
}

impl CatalogAdmin {
    pub fn new(lookup: CatalogLookup, writer: Arc<dyn CatalogWriter>) -> Self {
        Self { lookup, writer }
    }

    pub async fn get_item(&self, id: &str) -> CoreResult<Item> {
        self.lookup.get_item(id).await
    }

    /// Insert or replace an item.
    ///
    /// The game's title and image are copied onto the item now, so later game
    /// edits do not show through. Nothing is written if validation fails.
    pub async fn save_item(&self, id: &str, input: ItemInput) -> CoreResult<Item> {
        let game = match input.game_id.as_deref() {
            Some(game_id) => Some(self.lookup.capture_game(game_id).await?),
            None => None,
        };

        let item = Item {
            id: id.to_string(),
            name: input.name,
            title: input.title,
            description: input.description,
            price: input.price,
            dp: input.dp,
            discount: input.discount,
            category: input.category,
            release_date: input.release_date,
            image: input.image,
            images: input.images,
            game,
        };
        validate_item(&item)?;

        self.writer.upsert_item(&item).await?;
        info!(item_id = %item.id, price = item.price, discount = item.discount, "Catalog item saved");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preora_core::{CatalogStore, CoreError};
    use preora_shared::Game;
    use preora_store::InMemoryStore;

    fn input(name: &str, price: i64, dp: i64) -> ItemInput {
        ItemInput {
            name: name.to_string(),
            title: None,
            description: None,
            price,
            dp,
            discount: 0,
            category: None,
            release_date: None,
            image: None,
            images: Vec::new(),
            game_id: None,
        }
    }

    async fn setup() -> (Arc<InMemoryStore>, CatalogAdmin) {
        let store = Arc::new(InMemoryStore::new());
        store
            .put_game(Game {
                id: "GAME-1".to_string(),
                title: "Starfall".to_string(),
                image: Some("games/starfall.png".to_string()),
            })
            .await;
        let admin = CatalogAdmin::new(CatalogLookup::new(store.clone()), store.clone());
        (store, admin)
    }

    #[tokio::test]
    async fn test_save_item_stamps_game_snapshot() {
        let (store, admin) = setup().await;

        let saved = admin
            .save_item(
                "ITEM-A",
                ItemInput {
                    game_id: Some("GAME-1".to_string()),
                    discount: 10,
                    ..input("Figure", 1000, 300)
                },
            )
            .await
            .unwrap();

        let game = saved.game.as_ref().unwrap();
        assert_eq!(game.game_title, "Starfall");
        assert_eq!(game.game_image.as_deref(), Some("games/starfall.png"));
        assert_eq!(store.get_item("ITEM-A").await.unwrap(), Some(saved));

        // renaming the game later leaves the stored snapshot alone
        store
            .put_game(Game {
                id: "GAME-1".to_string(),
                title: "Starfall Remastered".to_string(),
                image: None,
            })
            .await;
        let stored = store.get_item("ITEM-A").await.unwrap().unwrap();
        assert_eq!(stored.game.map(|g| g.game_title).as_deref(), Some("Starfall"));
    }

    #[tokio::test]
    async fn test_save_item_unknown_game_writes_nothing() {
        let (store, admin) = setup().await;

        let err = admin
            .save_item(
                "ITEM-A",
                ItemInput {
                    game_id: Some("GAME-404".to_string()),
                    ..input("Figure", 1000, 300)
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err, CoreError::NotFound("game GAME-404".to_string()));
        assert!(store.get_item("ITEM-A").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_item_rejects_unpriceable_record() {
        let (store, admin) = setup().await;

        let err = admin
            .save_item(
                "ITEM-A",
                ItemInput {
                    discount: 150,
                    ..input("Figure", 1000, 300)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let err = admin.save_item("  ", input("Figure", 1000, 300)).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(store.get_item("ITEM-A").await.unwrap().is_none());
    }

    #[test]
    fn test_item_input_accepts_camel_case() {
        let input: ItemInput = serde_json::from_str(
            r#"{"name":"Figure","price":1000,"dp":300,"releaseDate":"2026-03-01T00:00:00Z","gameId":"GAME-1"}"#,
        )
        .unwrap();

        assert_eq!(input.game_id.as_deref(), Some("GAME-1"));
        assert!(input.release_date.is_some());
        assert_eq!(input.discount, 0);
    }
}
