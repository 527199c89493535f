use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use preora_core::{
    CatalogStore, CatalogWriter, CoreError, CoreResult, OfferLinkStore, OfferRepository,
    PreorderRepository,
};
use preora_shared::{
    Game, Item, OfferItemLink, OfferPatch, Preorder, PreorderOffer, PreorderStatus,
    PreorderStatusUpdate,
};
use tokio::sync::RwLock;

/// In-process implementation of every storage trait.
///
/// Each table sits behind its own lock and every trait method takes exactly
/// one lock once, so a method call is atomic per record the same way a single
/// SQL statement is. Nothing spans tables.
#[derive(Default)]
pub struct InMemoryStore {
    items: RwLock<HashMap<String, Item>>,
    games: RwLock<HashMap<String, Game>>,
    offers: RwLock<BTreeMap<String, PreorderOffer>>,
    links: RwLock<BTreeMap<(String, String), i32>>,
    preorders: RwLock<HashMap<String, Preorder>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a catalog item
    pub async fn put_item(&self, item: Item) {
        self.items.write().await.insert(item.id.clone(), item);
    }

    pub async fn remove_item(&self, id: &str) -> bool {
        self.items.write().await.remove(id).is_some()
    }

    pub async fn put_game(&self, game: Game) {
        self.games.write().await.insert(game.id.clone(), game);
    }

    pub async fn preorder_count(&self) -> usize {
        self.preorders.read().await.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_item(&self, id: &str) -> CoreResult<Option<Item>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn get_items(&self, ids: &[String]) -> CoreResult<Vec<Item>> {
        let items = self.items.read().await;
        Ok(ids.iter().filter_map(|id| items.get(id).cloned()).collect())
    }

    async fn get_game(&self, id: &str) -> CoreResult<Option<Game>> {
        Ok(self.games.read().await.get(id).cloned())
    }
}

#[async_trait]
impl CatalogWriter for InMemoryStore {
    async fn upsert_item(&self, item: &Item) -> CoreResult<()> {
        self.put_item(item.clone()).await;
        Ok(())
    }
}

#[async_trait]
impl OfferRepository for InMemoryStore {
    async fn create_offer(&self, offer: &PreorderOffer) -> CoreResult<()> {
        let mut offers = self.offers.write().await;
        if offers.contains_key(&offer.id) {
            return Err(CoreError::Conflict(format!("offer {} already exists", offer.id)));
        }
        offers.insert(offer.id.clone(), offer.clone());
        Ok(())
    }

    async fn get_offer(&self, id: &str) -> CoreResult<Option<PreorderOffer>> {
        Ok(self.offers.read().await.get(id).cloned())
    }

    async fn list_offers(&self) -> CoreResult<Vec<PreorderOffer>> {
        let mut list: Vec<PreorderOffer> = self.offers.read().await.values().cloned().collect();
        list.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn update_offer(&self, id: &str, patch: &OfferPatch) -> CoreResult<Option<PreorderOffer>> {
        let mut offers = self.offers.write().await;
        Ok(offers.get_mut(id).map(|offer| {
            patch.apply_to(offer);
            offer.clone()
        }))
    }

    async fn delete_offer(&self, id: &str) -> CoreResult<bool> {
        Ok(self.offers.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl OfferLinkStore for InMemoryStore {
    async fn list_links(&self, offer_id: &str) -> CoreResult<Vec<OfferItemLink>> {
        let links = self.links.read().await;
        Ok(links
            .iter()
            .filter(|((offer, _), _)| offer == offer_id)
            .map(|((offer, item), sort)| OfferItemLink::new(offer.as_str(), item.as_str(), *sort))
            .collect())
    }

    async fn list_links_for_offers(&self, offer_ids: &[String]) -> CoreResult<Vec<OfferItemLink>> {
        let links = self.links.read().await;
        Ok(links
            .iter()
            .filter(|((offer, _), _)| offer_ids.contains(offer))
            .map(|((offer, item), sort)| OfferItemLink::new(offer.as_str(), item.as_str(), *sort))
            .collect())
    }

    async fn insert_link_if_absent(&self, link: &OfferItemLink) -> CoreResult<bool> {
        let mut links = self.links.write().await;
        let key = (link.offer_id.clone(), link.item_id.clone());
        if links.contains_key(&key) {
            return Ok(false);
        }
        links.insert(key, link.sort);
        Ok(true)
    }

    async fn update_link_sort(&self, offer_id: &str, item_id: &str, sort: i32) -> CoreResult<bool> {
        let mut links = self.links.write().await;
        match links.get_mut(&(offer_id.to_string(), item_id.to_string())) {
            Some(current) => {
                *current = sort;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_link(&self, offer_id: &str, item_id: &str) -> CoreResult<bool> {
        let mut links = self.links.write().await;
        Ok(links
            .remove(&(offer_id.to_string(), item_id.to_string()))
            .is_some())
    }

    async fn delete_links_for_offer(&self, offer_id: &str) -> CoreResult<u64> {
        let mut links = self.links.write().await;
        let before = links.len();
        links.retain(|(offer, _), _| offer != offer_id);
        Ok((before - links.len()) as u64)
    }
}

#[async_trait]
impl PreorderRepository for InMemoryStore {
    async fn create(&self, preorder: &Preorder) -> CoreResult<()> {
        let mut preorders = self.preorders.write().await;
        if preorders.contains_key(&preorder.id) {
            return Err(CoreError::Conflict(format!(
                "preorder {} already exists",
                preorder.id
            )));
        }
        preorders.insert(preorder.id.clone(), preorder.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> CoreResult<Preorder> {
        self.preorders
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("preorder {}", id)))
    }

    async fn list(&self, owner_id: Option<&str>) -> CoreResult<Vec<Preorder>> {
        let preorders = self.preorders.read().await;
        let mut list: Vec<Preorder> = preorders
            .values()
            .filter(|p| owner_id.map_or(true, |owner| p.customer_id == owner))
            .cloned()
            .collect();
        list.sort_by_key(|p| (Reverse(p.created_at), Reverse(p.id.clone())));
        Ok(list)
    }

    async fn update_status(
        &self,
        id: &str,
        expected: PreorderStatus,
        update: &PreorderStatusUpdate,
    ) -> CoreResult<Option<Preorder>> {
        let mut preorders = self.preorders.write().await;
        let preorder = preorders
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("preorder {}", id)))?;
        if preorder.status != expected {
            return Ok(None);
        }
        preorder.apply_status(update);
        Ok(Some(preorder.clone()))
    }
}
