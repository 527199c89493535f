use std::sync::Arc;

use preora_core::{CoreError, CoreResult, PreorderRepository};
use preora_shared::{Preorder, PreorderStatusUpdate};
use tracing::{info, warn};

use crate::snapshot::{PreorderRequest, PreorderSnapshotBuilder};

const TRANSITION_ATTEMPTS: u32 = 3;

/// Manages preorder creation, reads and status transitions
#[derive(Clone)]
pub struct PreorderManager {
    builder: PreorderSnapshotBuilder,
    repository: Arc<dyn PreorderRepository>,
}

impl PreorderManager {
    pub fn new(builder: PreorderSnapshotBuilder, repository: Arc<dyn PreorderRepository>) -> Self {
        Self { builder, repository }
    }

    /// Build the snapshot and persist it in one write
    pub async fn build_and_store(&self, request: &PreorderRequest) -> CoreResult<Preorder> {
        let preorder = self.builder.build(request).await?;
        self.repository.create(&preorder).await?;

        info!(
            preorder_id = %preorder.id,
            customer_id = %preorder.customer_id,
            total = preorder.totals().price,
            "Preorder created"
        );
        Ok(preorder)
    }

    pub async fn get(&self, id: &str) -> CoreResult<Preorder> {
        self.repository.get(id).await
    }

    /// Newest first, optionally limited to one customer
    pub async fn list(&self, owner_id: Option<&str>) -> CoreResult<Vec<Preorder>> {
        self.repository.list(owner_id).await
    }

    /// Change status fields.
    ///
    /// Order status follows pending → confirmed → fulfilled, with cancellation
    /// allowed before fulfilment. Re-sending the current status is a no-op.
    /// Payment and shipping status are set as given.
    ///
    /// The write only lands while the order still has the status the check
    /// ran against; if another writer got there first the check reruns on
    /// the fresh record.
    pub async fn transition(&self, id: &str, update: &PreorderStatusUpdate) -> CoreResult<Preorder> {
        if update.is_empty() {
            return Err(CoreError::ValidationError("no status fields to update".to_string()));
        }

        for attempt in 1..=TRANSITION_ATTEMPTS {
            let current = self.repository.get(id).await?;

            if let Some(next) = update.status {
                if next != current.status && !current.status.can_transition_to(next) {
                    return Err(CoreError::ValidationError(format!(
                        "preorder {} cannot move from {} to {}",
                        id, current.status, next
                    )));
                }
            }

            match self.repository.update_status(id, current.status, update).await? {
                Some(updated) => {
                    info!(
                        preorder_id = id,
                        status = %updated.status,
                        payment_status = %updated.payment_status,
                        shipping_status = %updated.shipping_status,
                        "Preorder status updated"
                    );
                    return Ok(updated);
                }
                None => warn!(preorder_id = id, attempt, "Preorder status changed concurrently, retrying"),
            }
        }

        Err(CoreError::Conflict(format!(
            "preorder {} kept changing status, try again",
            id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::LineRequest;
    use preora_catalog::CatalogLookup;
    use preora_shared::{Item, PaymentStatus, PreorderStatus};
    use preora_store::InMemoryStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    async fn setup() -> (Arc<InMemoryStore>, PreorderManager) {
        let store = Arc::new(InMemoryStore::new());
        store.put_item(Item::new("A", "Figure", 1000, 300).with_discount(10)).await;
        store.put_item(Item::new("B", "Artbook", 400, 50)).await;
        let builder = PreorderSnapshotBuilder::new(CatalogLookup::new(store.clone()), store.clone(), "PHP", "PO");
        let manager = PreorderManager::new(builder, store.clone());
        (store, manager)
    }

    fn request(customer: &str, lines: &[(&str, i32)]) -> PreorderRequest {
        PreorderRequest {
            offer_id: None,
            customer_id: customer.to_string(),
            items: lines.iter().map(|(id, q)| LineRequest::new(*id, *q)).collect(),
            expected_release: None,
        }
    }

    #[tokio::test]
    async fn test_build_and_store_persists_single_line() {
        let (_store, manager) = setup().await;

        let created = manager
            .build_and_store(&request("user-1", &[("A", 2), ("B", 0)]))
            .await
            .unwrap();
        let stored = manager.get(&created.id).await.unwrap();

        assert_eq!(stored, created);
        assert_eq!(stored.items().len(), 1);
        assert_eq!(stored.items()[0].item_id(), "A");
        assert_eq!(stored.items()[0].quantity(), 2);
    }

    #[tokio::test]
    async fn test_missing_item_leaves_repository_untouched() {
        let (store, manager) = setup().await;
        let before = store.preorder_count().await;

        let err = manager
            .build_and_store(&request("user-1", &[("A", 1), ("MISSING", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(store.preorder_count().await, before);
    }

    #[tokio::test]
    async fn test_stored_pricing_survives_catalog_edit() {
        let (store, manager) = setup().await;
        let created = manager
            .build_and_store(&request("user-1", &[("A", 2)]))
            .await
            .unwrap();

        store.put_item(Item::new("A", "Figure (reissue)", 5000, 900)).await;
        let stored = manager.get(&created.id).await.unwrap();

        let line = &stored.items()[0];
        assert_eq!(line.pricing().unit_price, 1000);
        assert_eq!(line.pricing().unit_final_price, 900);
        assert_eq!(line.snapshot().name, "Figure");
        assert_eq!(stored.totals().price, 1800);
        assert_eq!(stored.totals().downpayment, 600);
    }

    #[tokio::test]
    async fn test_concurrent_orders_get_distinct_ids() {
        let (store, manager) = setup().await;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    let qty = i % 3 + 1;
                    let created = manager
                        .build_and_store(&request(&format!("user-{}", i), &[("A", qty)]))
                        .await
                        .unwrap();
                    (created, qty)
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let (created, qty) = handle.await.unwrap();
            assert_eq!(created.totals().price, 900 * i64::from(qty));
            assert_eq!(created.totals().downpayment, 300 * i64::from(qty));
            ids.insert(created.id);
        }

        assert_eq!(ids.len(), 16);
        assert_eq!(store.preorder_count().await, 16);
    }

    #[tokio::test]
    async fn test_list_filters_by_owner() {
        let (_store, manager) = setup().await;
        manager.build_and_store(&request("alice", &[("A", 1)])).await.unwrap();
        manager.build_and_store(&request("bob", &[("B", 1)])).await.unwrap();
        manager.build_and_store(&request("alice", &[("B", 2)])).await.unwrap();

        let mine = manager.list(Some("alice")).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p.customer_id == "alice"));

        assert_eq!(manager.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let (_store, manager) = setup().await;
        let created = manager.build_and_store(&request("user-1", &[("A", 1)])).await.unwrap();

        let skip = PreorderStatusUpdate {
            status: Some(PreorderStatus::Fulfilled),
            ..Default::default()
        };
        assert!(matches!(
            manager.transition(&created.id, &skip).await,
            Err(CoreError::ValidationError(_))
        ));

        let confirm = PreorderStatusUpdate {
            status: Some(PreorderStatus::Confirmed),
            payment_status: Some(PaymentStatus::PartiallyPaid),
            ..Default::default()
        };
        let confirmed = manager.transition(&created.id, &confirm).await.unwrap();
        assert_eq!(confirmed.status, PreorderStatus::Confirmed);
        assert_eq!(confirmed.payment_status, PaymentStatus::PartiallyPaid);
        assert_eq!(confirmed.items(), created.items());
        assert_eq!(confirmed.totals(), created.totals());

        let cancel = PreorderStatusUpdate {
            status: Some(PreorderStatus::Cancelled),
            ..Default::default()
        };
        manager.transition(&created.id, &cancel).await.unwrap();
        assert!(matches!(
            manager.transition(&created.id, &confirm).await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_transition_unknown_or_empty() {
        let (_store, manager) = setup().await;

        let update = PreorderStatusUpdate {
            status: Some(PreorderStatus::Confirmed),
            ..Default::default()
        };
        assert!(matches!(
            manager.transition("PO-404", &update).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            manager.transition("PO-404", &PreorderStatusUpdate::default()).await,
            Err(CoreError::ValidationError(_))
        ));
    }

    /// Holds the first two reads at a barrier so both callers validate
    /// against the same status before either writes.
    struct LockstepReads {
        inner: Arc<InMemoryStore>,
        barrier: Barrier,
        held: AtomicUsize,
    }

    #[async_trait]
    impl PreorderRepository for LockstepReads {
        async fn create(&self, preorder: &Preorder) -> CoreResult<()> {
            self.inner.create(preorder).await
        }

        async fn get(&self, id: &str) -> CoreResult<Preorder> {
            let current = self.inner.get(id).await?;
            if self.held.fetch_add(1, Ordering::SeqCst) < 2 {
                self.barrier.wait().await;
            }
            Ok(current)
        }

        async fn list(&self, owner_id: Option<&str>) -> CoreResult<Vec<Preorder>> {
            self.inner.list(owner_id).await
        }

        async fn update_status(
            &self,
            id: &str,
            expected: PreorderStatus,
            update: &PreorderStatusUpdate,
        ) -> CoreResult<Option<Preorder>> {
            self.inner.update_status(id, expected, update).await
        }
    }

    #[tokio::test]
    async fn test_racing_transitions_cannot_both_apply() {
        let (store, manager) = setup().await;
        let created = manager.build_and_store(&request("user-1", &[("A", 1)])).await.unwrap();
        let confirm = PreorderStatusUpdate {
            status: Some(PreorderStatus::Confirmed),
            ..Default::default()
        };
        manager.transition(&created.id, &confirm).await.unwrap();

        let lockstep = Arc::new(LockstepReads {
            inner: store.clone(),
            barrier: Barrier::new(2),
            held: AtomicUsize::new(0),
        });
        let builder = PreorderSnapshotBuilder::new(CatalogLookup::new(store.clone()), store.clone(), "PHP", "PO");
        let racing = PreorderManager::new(builder, lockstep);

        let fulfil = PreorderStatusUpdate {
            status: Some(PreorderStatus::Fulfilled),
            ..Default::default()
        };
        let cancel = PreorderStatusUpdate {
            status: Some(PreorderStatus::Cancelled),
            ..Default::default()
        };
        let (fulfilled, cancelled) = tokio::join!(
            racing.transition(&created.id, &fulfil),
            racing.transition(&created.id, &cancel)
        );

        let winner = match (fulfilled, cancelled) {
            (Ok(won), Err(CoreError::ValidationError(_))) => won.status,
            (Err(CoreError::ValidationError(_)), Ok(won)) => won.status,
            other => panic!("expected exactly one transition to apply, got {:?}", other),
        };
        assert_eq!(store.get(&created.id).await.unwrap().status, winner);
    }
}
