use std::sync::Arc;

use chrono::{DateTime, Utc};
use preora_catalog::{validate_item, CatalogLookup, PricingEngine};
use preora_core::{CoreError, CoreResult, OfferRepository};
use preora_shared::ids::new_preorder_id;
use preora_shared::{ItemSnapshot, Preorder, PreorderLineItem};
use serde::Deserialize;
use tracing::debug;

/// One requested line: an item id and how many of it
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LineRequest {
    #[serde(alias = "itemId")]
    pub item_id: String,
    pub quantity: i32,
}

impl LineRequest {
    pub fn new(item_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreorderRequest {
    pub offer_id: Option<String>,
    pub customer_id: String,
    pub items: Vec<LineRequest>,
    pub expected_release: Option<DateTime<Utc>>,
}

/// Turns an order request into a priced, self-contained [`Preorder`].
///
/// Current catalog state is read once per request and copied into each
/// line; nothing here writes to storage.
#[derive(Clone)]
pub struct PreorderSnapshotBuilder {
    catalog: CatalogLookup,
    offers: Arc<dyn OfferRepository>,
    pricing: PricingEngine,
    currency: String,
    id_prefix: String,
}

impl PreorderSnapshotBuilder {
    pub fn new(
        catalog: CatalogLookup,
        offers: Arc<dyn OfferRepository>,
        currency: impl Into<String>,
        id_prefix: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            offers,
            pricing: PricingEngine::new(),
            currency: currency.into(),
            id_prefix: id_prefix.into(),
        }
    }

    pub async fn build(&self, request: &PreorderRequest) -> CoreResult<Preorder> {
        let customer_id = request.customer_id.trim();
        if customer_id.is_empty() {
            return Err(CoreError::ValidationError("customer id is required".to_string()));
        }

        let lines = merge_lines(&request.items)?;

        if let Some(offer_id) = &request.offer_id {
            if self.offers.get_offer(offer_id).await?.is_none() {
                return Err(CoreError::NotFound(format!("offer {}", offer_id)));
            }
        }

        // every referenced id must resolve, zero-quantity lines included
        let referenced: Vec<String> = lines.iter().map(|l| l.item_id.clone()).collect();
        let items = self.catalog.require_items(&referenced).await?;

        let mut line_items = Vec::new();
        for line in lines.iter().filter(|l| l.quantity > 0) {
            let item = items
                .get(&line.item_id)
                .ok_or_else(|| CoreError::NotFound(format!("items: {}", line.item_id)))?;
            validate_item(item)?;

            let pricing = self
                .pricing
                .price_line(item.price, item.discount, item.dp, line.quantity)?;
            line_items.push(PreorderLineItem::new(
                line.item_id.clone(),
                line.quantity,
                ItemSnapshot::capture(item),
                pricing,
            ));
        }

        if line_items.is_empty() {
            return Err(CoreError::ValidationError(
                "preorder needs at least one item with a positive quantity".to_string(),
            ));
        }

        let totals = self
            .pricing
            .aggregate(line_items.iter().map(PreorderLineItem::pricing))?;

        let mut preorder = Preorder::new(
            new_preorder_id(&self.id_prefix),
            customer_id.to_string(),
            request.offer_id.clone(),
            line_items,
            totals,
            self.currency.clone(),
        );
        preorder.expected_release = request.expected_release;

        debug!(
            preorder_id = %preorder.id,
            lines = preorder.items().len(),
            total = totals.price,
            downpayment = totals.downpayment,
            "Preorder snapshot built"
        );

        Ok(preorder)
    }
}

/// Collapse repeated item ids into one line each, in first-occurrence order
fn merge_lines(requested: &[LineRequest]) -> CoreResult<Vec<LineRequest>> {
    let mut merged: Vec<LineRequest> = Vec::with_capacity(requested.len());

    for line in requested {
        let item_id = line.item_id.as_str();
        if item_id.trim().is_empty() {
            return Err(CoreError::ValidationError("item id is required".to_string()));
        }
        if line.quantity < 0 {
            return Err(CoreError::ValidationError(format!(
                "quantity for {} must not be negative",
                item_id
            )));
        }

        match merged.iter_mut().find(|m| m.item_id == item_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(line.quantity).ok_or_else(|| {
                    CoreError::ValidationError(format!("quantity for {} is too large", item_id))
                })?;
            }
            None => merged.push(LineRequest::new(item_id, line.quantity)),
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use preora_shared::{Game, Item, PreorderOffer, PreorderStatus};
    use preora_store::InMemoryStore;

    async fn setup() -> (Arc<InMemoryStore>, PreorderSnapshotBuilder) {
        let store = Arc::new(InMemoryStore::new());
        let game = Game {
            id: "GAME-1".to_string(),
            title: "Starfall".to_string(),
            image: None,
        };
        store
            .put_item(Item::new("A", "Figure", 1000, 300).with_discount(10).with_game(&game))
            .await;
        store.put_item(Item::new("B", "Artbook", 999, 100).with_discount(33)).await;
        let builder = PreorderSnapshotBuilder::new(CatalogLookup::new(store.clone()), store.clone(), "PHP", "PO");
        (store, builder)
    }

    fn request(lines: &[(&str, i32)]) -> PreorderRequest {
        PreorderRequest {
            offer_id: None,
            customer_id: "user-1".to_string(),
            items: lines.iter().map(|(id, q)| LineRequest::new(*id, *q)).collect(),
            expected_release: None,
        }
    }

    #[tokio::test]
    async fn test_build_prices_and_snapshots_lines() {
        let (_store, builder) = setup().await;

        let preorder = builder.build(&request(&[("A", 2), ("B", 1)])).await.unwrap();

        assert!(preorder.id.starts_with("PO-"));
        assert_eq!(preorder.status, PreorderStatus::Pending);
        assert_eq!(preorder.currency, "PHP");
        assert_eq!(preorder.items().len(), 2);

        let a = &preorder.items()[0];
        assert_eq!(a.item_id(), "A");
        assert_eq!(a.pricing().unit_final_price, 900);
        assert_eq!(a.pricing().line_total_price, 1800);
        assert_eq!(a.pricing().line_total_dp, 600);
        assert_eq!(a.snapshot().game.as_ref().map(|g| g.game_title.as_str()), Some("Starfall"));

        assert_eq!(preorder.items()[1].pricing().unit_final_price, 669);
        assert_eq!(preorder.totals().price, 1800 + 669);
        assert_eq!(preorder.totals().downpayment, 600 + 100);
    }

    #[tokio::test]
    async fn test_zero_quantity_lines_are_dropped() {
        let (_store, builder) = setup().await;

        let preorder = builder.build(&request(&[("A", 2), ("B", 0)])).await.unwrap();

        assert_eq!(preorder.items().len(), 1);
        assert_eq!(preorder.items()[0].item_id(), "A");
        assert_eq!(preorder.items()[0].quantity(), 2);
    }

    #[tokio::test]
    async fn test_all_zero_quantities_rejected() {
        let (_store, builder) = setup().await;

        let err = builder.build(&request(&[("A", 0)])).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let err = builder.build(&request(&[])).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_unknown_item_fails_even_with_zero_quantity() {
        let (_store, builder) = setup().await;

        let err = builder
            .build(&request(&[("A", 1), ("GHOST", 0)]))
            .await
            .unwrap_err();

        assert_eq!(err, CoreError::NotFound("items: GHOST".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_merged() {
        let (_store, builder) = setup().await;

        let preorder = builder
            .build(&request(&[("B", 1), ("A", 1), ("B", 2)]))
            .await
            .unwrap();

        let lines: Vec<(&str, i32)> = preorder
            .items()
            .iter()
            .map(|l| (l.item_id(), l.quantity()))
            .collect();
        assert_eq!(lines, vec![("B", 3), ("A", 1)]);
    }

    #[tokio::test]
    async fn test_padded_item_id_is_a_different_item() {
        let (_store, builder) = setup().await;

        let err = builder
            .build(&request(&[("A", 1), (" A", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::NotFound("items:  A".to_string()));

        let err = builder.build(&request(&[("  ", 1)])).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected() {
        let (_store, builder) = setup().await;

        let err = builder.build(&request(&[("A", -1)])).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_blank_customer_rejected() {
        let (_store, builder) = setup().await;
        let mut req = request(&[("A", 1)]);
        req.customer_id = " ".to_string();

        assert!(matches!(
            builder.build(&req).await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_originating_offer_must_exist() {
        let (store, builder) = setup().await;
        let mut req = request(&[("A", 1)]);
        req.offer_id = Some("OFFER-1".to_string());

        assert!(matches!(builder.build(&req).await, Err(CoreError::NotFound(_))));

        let now = Utc::now();
        store
            .create_offer(&PreorderOffer {
                id: "OFFER-1".to_string(),
                title: "Launch".to_string(),
                description: None,
                start_date: now,
                end_date: now + Duration::days(7),
                active: true,
                banner: None,
                logo: None,
                created_at: now,
            })
            .await
            .unwrap();
        req.expected_release = Some(now + Duration::days(90));

        let preorder = builder.build(&req).await.unwrap();
        assert_eq!(preorder.offer_id.as_deref(), Some("OFFER-1"));
        assert_eq!(preorder.expected_release, req.expected_release);
    }

    #[tokio::test]
    async fn test_invalid_catalog_record_rejected() {
        let (store, builder) = setup().await;
        store.put_item(Item::new("BAD", "Broken", 500, 0).with_discount(150)).await;

        let err = builder.build(&request(&[("BAD", 1)])).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_line_request_accepts_camel_case() {
        let line: LineRequest = serde_json::from_str(r#"{"itemId":"A","quantity":2}"#).unwrap();
        assert_eq!(line, LineRequest::new("A", 2));
    }
}
