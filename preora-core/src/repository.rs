use async_trait::async_trait;
use preora_shared::{
    Game, Item, OfferItemLink, OfferPatch, Preorder, PreorderOffer, PreorderStatus,
    PreorderStatusUpdate,
};

use crate::CoreResult;

/// Read-only access to catalog records by business id
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_item(&self, id: &str) -> CoreResult<Option<Item>>;

    /// Ids without a matching record are left out of the result
    async fn get_items(&self, ids: &[String]) -> CoreResult<Vec<Item>>;

    async fn get_game(&self, id: &str) -> CoreResult<Option<Game>>;
}

/// Catalog writes used by admin tooling and seeding
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Insert or replace by id
    async fn upsert_item(&self, item: &Item) -> CoreResult<()>;
}

/// Repository trait for offer records
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Fails with `Conflict` when the id is taken
    async fn create_offer(&self, offer: &PreorderOffer) -> CoreResult<()>;

    async fn get_offer(&self, id: &str) -> CoreResult<Option<PreorderOffer>>;

    async fn list_offers(&self) -> CoreResult<Vec<PreorderOffer>>;

    /// Applies the patch in one write; `None` when the offer does not exist
    async fn update_offer(&self, id: &str, patch: &OfferPatch) -> CoreResult<Option<PreorderOffer>>;

    /// Returns whether the offer existed
    async fn delete_offer(&self, id: &str) -> CoreResult<bool>;
}

/// Offer/item link table.
///
/// Every write is keyed on `(offer_id, item_id)` and is idempotent on its
/// own, so a batch interrupted halfway can simply be replayed.
#[async_trait]
pub trait OfferLinkStore: Send + Sync {
    async fn list_links(&self, offer_id: &str) -> CoreResult<Vec<OfferItemLink>>;

    async fn list_links_for_offers(&self, offer_ids: &[String]) -> CoreResult<Vec<OfferItemLink>>;

    /// Insert-or-ignore. `Ok(false)` when the pair already existed.
    async fn insert_link_if_absent(&self, link: &OfferItemLink) -> CoreResult<bool>;

    async fn update_link_sort(&self, offer_id: &str, item_id: &str, sort: i32) -> CoreResult<bool>;

    /// Delete-if-present. `Ok(false)` when there was nothing to delete.
    async fn delete_link(&self, offer_id: &str, item_id: &str) -> CoreResult<bool>;

    async fn delete_links_for_offer(&self, offer_id: &str) -> CoreResult<u64>;
}

/// Repository trait for preorder aggregates
#[async_trait]
pub trait PreorderRepository: Send + Sync {
    /// Fails with `Conflict` when the id already exists
    async fn create(&self, preorder: &Preorder) -> CoreResult<()>;

    /// Fails with `NotFound` when absent
    async fn get(&self, id: &str) -> CoreResult<Preorder>;

    /// Newest first, optionally restricted to one customer
    async fn list(&self, owner_id: Option<&str>) -> CoreResult<Vec<Preorder>>;

    /// Touches only the status fields, and only while the stored order status
    /// still equals `expected`. Returns `Ok(None)` when another writer moved
    /// the status first; fails with `NotFound` when absent.
    async fn update_status(
        &self,
        id: &str,
        expected: PreorderStatus,
        update: &PreorderStatusUpdate,
    ) -> CoreResult<Option<Preorder>>;
}
