use std::sync::Arc;

use chrono::{DateTime, Utc};
use preora_catalog::CatalogLookup;
use preora_core::{CoreError, CoreResult, OfferLinkStore, OfferRepository};
use preora_shared::{HydratedOffer, OfferPatch, PreorderOffer};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::hydrator::OfferItemHydrator;
use crate::sync::{dedupe_item_ids, LinkSynchronizer, SyncReport};

fn default_active() -> bool {
    true
}

/// Admin input for a new offer and its initial item list
#[derive(Debug, Clone, Deserialize)]
pub struct NewOffer {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub item_ids: Vec<String>,
}

/// An offer as returned to callers, with or without its items
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OfferView {
    Plain(PreorderOffer),
    Hydrated(HydratedOffer),
}

impl OfferView {
    pub fn offer(&self) -> &PreorderOffer {
        match self {
            OfferView::Plain(offer) => offer,
            OfferView::Hydrated(hydrated) => &hydrated.offer,
        }
    }
}

fn validate_window(offer: &PreorderOffer) -> CoreResult<()> {
    if offer.end_date < offer.start_date {
        return Err(CoreError::ValidationError(format!(
            "offer {} ends before it starts",
            offer.id
        )));
    }
    Ok(())
}

/// Offer administration and storefront reads
#[derive(Clone)]
pub struct OfferService {
    offers: Arc<dyn OfferRepository>,
    links: Arc<dyn OfferLinkStore>,
    synchronizer: LinkSynchronizer,
    hydrator: OfferItemHydrator,
}

impl OfferService {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        links: Arc<dyn OfferLinkStore>,
        catalog: CatalogLookup,
    ) -> Self {
        Self {
            synchronizer: LinkSynchronizer::new(offers.clone(), links.clone()),
            hydrator: OfferItemHydrator::new(links.clone(), catalog),
            offers,
            links,
        }
    }

    pub async fn create_offer(&self, input: NewOffer) -> CoreResult<HydratedOffer> {
        let id = input.id.trim().to_string();
        if id.is_empty() {
            return Err(CoreError::ValidationError("offer id is required".to_string()));
        }
        if input.title.trim().is_empty() {
            return Err(CoreError::ValidationError("offer title is required".to_string()));
        }
        // reject bad item lists before anything is written
        let target = dedupe_item_ids(&input.item_ids)?;

        let offer = PreorderOffer {
            id,
            title: input.title,
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            active: input.active,
            banner: input.banner,
            logo: input.logo,
            created_at: Utc::now(),
        };
        validate_window(&offer)?;

        self.offers.create_offer(&offer).await?;
        let report = self.synchronizer.reconcile(&offer.id, &target).await?;
        info!(offer_id = %offer.id, items = report.inserted + report.already_present, "Offer created");

        self.hydrator.hydrate(offer).await
    }

    /// Patch the offer's own fields, then replace its item list when one is given
    pub async fn update_offer(
        &self,
        id: &str,
        patch: &OfferPatch,
        item_ids: Option<&[String]>,
        include_items: bool,
    ) -> CoreResult<(OfferView, Option<SyncReport>)> {
        let mut offer = self
            .offers
            .get_offer(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("offer {}", id)))?;

        if !patch.is_empty() {
            let mut preview = offer.clone();
            patch.apply_to(&mut preview);
            validate_window(&preview)?;

            offer = self
                .offers
                .update_offer(id, patch)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("offer {}", id)))?;
        }

        let report = match item_ids {
            Some(ids) => Some(self.synchronizer.synchronize(id, ids).await?),
            None => None,
        };

        Ok((self.view(offer, include_items).await?, report))
    }

    /// Remove the offer and every link it owns.
    ///
    /// Links are purged even when the offer row is already gone, so a retry
    /// after a partial failure finishes the job.
    pub async fn delete_offer(&self, id: &str) -> CoreResult<()> {
        let existed = self.offers.delete_offer(id).await?;
        let purged = self.links.delete_links_for_offer(id).await?;

        if !existed && purged == 0 {
            return Err(CoreError::NotFound(format!("offer {}", id)));
        }

        info!(offer_id = id, links = purged, "Offer deleted");
        Ok(())
    }

    pub async fn get_offer(&self, id: &str, include_items: bool) -> CoreResult<OfferView> {
        let offer = self
            .offers
            .get_offer(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("offer {}", id)))?;

        self.view(offer, include_items).await
    }

    pub async fn list_offers(&self, include_items: bool) -> CoreResult<Vec<OfferView>> {
        let offers = self.offers.list_offers().await?;

        if !include_items {
            return Ok(offers.into_iter().map(OfferView::Plain).collect());
        }

        Ok(self
            .hydrator
            .hydrate_many(offers)
            .await?
            .into_iter()
            .map(OfferView::Hydrated)
            .collect())
    }

    async fn view(&self, offer: PreorderOffer, include_items: bool) -> CoreResult<OfferView> {
        if include_items {
            Ok(OfferView::Hydrated(self.hydrator.hydrate(offer).await?))
        } else {
            Ok(OfferView::Plain(offer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use preora_shared::Item;
    use preora_store::InMemoryStore;

    async fn setup() -> (Arc<InMemoryStore>, OfferService) {
        let store = Arc::new(InMemoryStore::new());
        for (id, name) in [("ITEM-1", "Figure"), ("ITEM-2", "Artbook"), ("ITEM-3", "Vinyl")] {
            store.put_item(Item::new(id, name, 1000, 300)).await;
        }
        let service = OfferService::new(store.clone(), store.clone(), CatalogLookup::new(store.clone()));
        (store, service)
    }

    fn new_offer(id: &str, item_ids: &[&str]) -> NewOffer {
        let start = Utc::now();
        NewOffer {
            id: id.to_string(),
            title: "Autumn preorders".to_string(),
            description: Some("Limited run".to_string()),
            start_date: start,
            end_date: start + Duration::days(30),
            active: true,
            banner: None,
            logo: None,
            item_ids: item_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn item_ids(view: &OfferView) -> Vec<String> {
        match view {
            OfferView::Hydrated(h) => h.items.iter().map(|i| i.id.clone()).collect(),
            OfferView::Plain(_) => panic!("expected hydrated view"),
        }
    }

    #[tokio::test]
    async fn test_create_offer_links_initial_items() {
        let (_store, service) = setup().await;

        let created = service
            .create_offer(new_offer("OFFER-1", &["ITEM-2", "ITEM-1", "ITEM-2"]))
            .await
            .unwrap();

        let ids: Vec<&str> = created.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["ITEM-2", "ITEM-1"]);
    }

    #[tokio::test]
    async fn test_create_offer_validation() {
        let (store, service) = setup().await;

        let mut bad_window = new_offer("OFFER-1", &[]);
        bad_window.end_date = bad_window.start_date - Duration::days(1);
        assert!(matches!(
            service.create_offer(bad_window).await,
            Err(CoreError::ValidationError(_))
        ));

        let mut untitled = new_offer("OFFER-1", &[]);
        untitled.title = "  ".to_string();
        assert!(matches!(
            service.create_offer(untitled).await,
            Err(CoreError::ValidationError(_))
        ));

        assert!(matches!(
            service.create_offer(new_offer("OFFER-1", &["ITEM-1", ""])).await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(store.get_offer("OFFER-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_offer_conflicts() {
        let (_store, service) = setup().await;
        service.create_offer(new_offer("OFFER-1", &[])).await.unwrap();

        let err = service.create_offer(new_offer("OFFER-1", &[])).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_offer_patches_and_resyncs() {
        let (_store, service) = setup().await;
        service
            .create_offer(new_offer("OFFER-1", &["ITEM-1", "ITEM-2"]))
            .await
            .unwrap();

        let patch = OfferPatch {
            title: Some("Winter preorders".to_string()),
            ..Default::default()
        };
        let desired = vec!["ITEM-3".to_string(), "ITEM-1".to_string()];
        let (view, report) = service
            .update_offer("OFFER-1", &patch, Some(desired.as_slice()), true)
            .await
            .unwrap();

        assert_eq!(view.offer().title, "Winter preorders");
        assert_eq!(item_ids(&view), vec!["ITEM-3", "ITEM-1"]);
        let report = report.unwrap();
        assert_eq!((report.inserted, report.removed, report.reordered), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_update_without_item_ids_keeps_links() {
        let (_store, service) = setup().await;
        service
            .create_offer(new_offer("OFFER-1", &["ITEM-1", "ITEM-2"]))
            .await
            .unwrap();

        let (view, report) = service
            .update_offer("OFFER-1", &OfferPatch::default(), None, true)
            .await
            .unwrap();

        assert!(report.is_none());
        assert_eq!(item_ids(&view), vec!["ITEM-1", "ITEM-2"]);
    }

    #[tokio::test]
    async fn test_update_rejects_inverted_window() {
        let (store, service) = setup().await;
        let created = service.create_offer(new_offer("OFFER-1", &[])).await.unwrap();

        let patch = OfferPatch {
            end_date: Some(created.offer.start_date - Duration::hours(1)),
            ..Default::default()
        };
        let err = service
            .update_offer("OFFER-1", &patch, None, false)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ValidationError(_)));
        let stored = store.get_offer("OFFER-1").await.unwrap().unwrap();
        assert_eq!(stored.end_date, created.offer.end_date);
    }

    #[tokio::test]
    async fn test_update_unknown_offer() {
        let (_store, service) = setup().await;

        let none: Vec<String> = Vec::new();
        let err = service
            .update_offer("OFFER-404", &OfferPatch::default(), Some(none.as_slice()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_offer_removes_links() {
        let (store, service) = setup().await;
        service
            .create_offer(new_offer("OFFER-1", &["ITEM-1", "ITEM-2"]))
            .await
            .unwrap();

        service.delete_offer("OFFER-1").await.unwrap();

        assert!(store.list_links("OFFER-1").await.unwrap().is_empty());
        assert!(matches!(
            service.delete_offer("OFFER-1").await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_offers_plain_and_hydrated() {
        let (_store, service) = setup().await;
        service.create_offer(new_offer("OFFER-A", &["ITEM-1"])).await.unwrap();
        service
            .create_offer(new_offer("OFFER-B", &["ITEM-3", "ITEM-2"]))
            .await
            .unwrap();

        let plain = service.list_offers(false).await.unwrap();
        assert!(plain.iter().all(|v| matches!(v, OfferView::Plain(_))));

        let hydrated = service.list_offers(true).await.unwrap();
        let by_id: Vec<(String, Vec<String>)> = hydrated
            .iter()
            .map(|v| (v.offer().id.clone(), item_ids(v)))
            .collect();
        assert!(by_id.contains(&("OFFER-A".to_string(), vec!["ITEM-1".to_string()])));
        assert!(by_id.contains(&(
            "OFFER-B".to_string(),
            vec!["ITEM-3".to_string(), "ITEM-2".to_string()]
        )));
    }

    #[tokio::test]
    async fn test_get_offer_hides_deleted_items() {
        let (store, service) = setup().await;
        service
            .create_offer(new_offer("OFFER-1", &["ITEM-1", "ITEM-2"]))
            .await
            .unwrap();
        store.remove_item("ITEM-1").await;

        let view = service.get_offer("OFFER-1", true).await.unwrap();

        assert_eq!(item_ids(&view), vec!["ITEM-2"]);
    }
}
