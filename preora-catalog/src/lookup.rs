use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use preora_core::{CatalogStore, CoreError, CoreResult};
use preora_shared::{GameSnapshot, Item};
use tracing::debug;

use crate::pricing::MAX_DISCOUNT_PERCENT;

/// Reject catalog records that cannot be priced or displayed
pub fn validate_item(item: &Item) -> CoreResult<()> {
    if item.id.trim().is_empty() {
        return Err(CoreError::ValidationError("item id is required".to_string()));
    }
    if item.name.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("item {} has no name", item.id)));
    }
    if item.price < 0 {
        return Err(CoreError::ValidationError(format!(
            "item {} has a negative price",
            item.id
        )));
    }
    if item.dp < 0 {
        return Err(CoreError::ValidationError(format!(
            "item {} has a negative down-payment",
            item.id
        )));
    }
    if !(0..=MAX_DISCOUNT_PERCENT).contains(&item.discount) {
        return Err(CoreError::ValidationError(format!(
            "item {} has discount {} outside 0..=100",
            item.id, item.discount
        )));
    }
    Ok(())
}

/// Batch lookups on top of a [`CatalogStore`]
#[derive(Clone)]
pub struct CatalogLookup {
    store: Arc<dyn CatalogStore>,
}

impl CatalogLookup {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn get_item(&self, id: &str) -> CoreResult<Item> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("item {}", id)))
    }

    /// Resolve ids to items in one store call. Unknown ids are left out.
    pub async fn resolve(&self, ids: &[String]) -> CoreResult<HashMap<String, Item>> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let items = self.store.get_items(&unique).await?;
        debug!(requested = unique.len(), found = items.len(), "Resolved catalog items");

        Ok(items.into_iter().map(|item| (item.id.clone(), item)).collect())
    }

    /// Resolve every id or fail with `NotFound` naming all missing ones
    pub async fn require_items(&self, ids: &[String]) -> CoreResult<HashMap<String, Item>> {
        let found = self.resolve(ids).await?;

        let mut seen = HashSet::new();
        let missing: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found.contains_key(*id) && seen.insert(*id))
            .collect();

        if !missing.is_empty() {
            return Err(CoreError::NotFound(format!("items: {}", missing.join(", "))));
        }

        Ok(found)
    }

    /// Snapshot of a game for stamping onto an item at write time
    pub async fn capture_game(&self, game_id: &str) -> CoreResult<GameSnapshot> {
        self.store
            .get_game(game_id)
            .await?
            .map(|game| GameSnapshot::capture(&game))
            .ok_or_else(|| CoreError::NotFound(format!("game {}", game_id)))
    }
}
