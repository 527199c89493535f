use std::collections::HashMap;
use std::sync::Arc;

use preora_catalog::CatalogLookup;
use preora_core::{CoreResult, OfferLinkStore};
use preora_shared::{HydratedOffer, Item, OfferItemLink, PreorderOffer};
use tracing::debug;

/// Attaches linked catalog items to offers, in link sort order
#[derive(Clone)]
pub struct OfferItemHydrator {
    links: Arc<dyn OfferLinkStore>,
    catalog: CatalogLookup,
}

impl OfferItemHydrator {
    pub fn new(links: Arc<dyn OfferLinkStore>, catalog: CatalogLookup) -> Self {
        Self { links, catalog }
    }

    pub async fn hydrate(&self, offer: PreorderOffer) -> CoreResult<HydratedOffer> {
        let links = self.links.list_links(&offer.id).await?;
        let item_ids: Vec<String> = links.iter().map(|l| l.item_id.clone()).collect();
        let items = self.catalog.resolve(&item_ids).await?;

        Ok(HydratedOffer {
            items: ordered_items(&offer.id, links, &items),
            offer,
        })
    }

    /// Hydrate a page of offers with one link query and one catalog query
    pub async fn hydrate_many(&self, offers: Vec<PreorderOffer>) -> CoreResult<Vec<HydratedOffer>> {
        if offers.is_empty() {
            return Ok(Vec::new());
        }

        let offer_ids: Vec<String> = offers.iter().map(|o| o.id.clone()).collect();
        let links = self.links.list_links_for_offers(&offer_ids).await?;
        let item_ids: Vec<String> = links.iter().map(|l| l.item_id.clone()).collect();
        let items = self.catalog.resolve(&item_ids).await?;

        let mut by_offer: HashMap<String, Vec<OfferItemLink>> = HashMap::new();
        for link in links {
            by_offer.entry(link.offer_id.clone()).or_default().push(link);
        }

        Ok(offers
            .into_iter()
            .map(|offer| {
                let links = by_offer.remove(&offer.id).unwrap_or_default();
                HydratedOffer {
                    items: ordered_items(&offer.id, links, &items),
                    offer,
                }
            })
            .collect())
    }
}

/// Order by (sort, item_id) and skip links whose item no longer exists
fn ordered_items(offer_id: &str, mut links: Vec<OfferItemLink>, items: &HashMap<String, Item>) -> Vec<Item> {
    links.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.item_id.cmp(&b.item_id)));

    let total = links.len();
    let resolved: Vec<Item> = links
        .iter()
        .filter_map(|link| items.get(&link.item_id).cloned())
        .collect();

    if resolved.len() < total {
        debug!(offer_id, dangling = total - resolved.len(), "Skipped links to missing items");
    }

    resolved
}
