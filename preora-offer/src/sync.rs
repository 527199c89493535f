use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use preora_core::{CoreError, CoreResult, OfferLinkStore, OfferRepository};
use preora_shared::OfferItemLink;
use serde::Serialize;
use tracing::{debug, info};

/// Link writes needed to move an offer from its current links to a target list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSyncPlan {
    pub to_add: Vec<OfferItemLink>,
    pub to_remove: Vec<String>,
    pub to_reorder: Vec<OfferItemLink>,
}

impl LinkSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_reorder.is_empty()
    }
}

/// Outcome counts of one synchronization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub inserted: usize,
    /// Inserts that found the link already created by another writer
    pub already_present: usize,
    pub removed: usize,
    pub reordered: usize,
}

/// Drop repeated ids, keeping the first occurrence. Ids are compared verbatim.
pub fn dedupe_item_ids(desired: &[String]) -> CoreResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut target = Vec::with_capacity(desired.len());

    for raw in desired {
        if raw.trim().is_empty() {
            return Err(CoreError::ValidationError("item ids must not be blank".to_string()));
        }
        if seen.insert(raw.as_str()) {
            target.push(raw.clone());
        }
    }

    Ok(target)
}

/// Diff current links against a de-duplicated target list.
///
/// Each target item's rank is its index in `target`; items already linked at
/// that rank need no write.
pub fn plan_link_sync(offer_id: &str, current: &[OfferItemLink], target: &[String]) -> LinkSyncPlan {
    let current_sort: HashMap<&str, i32> = current
        .iter()
        .map(|link| (link.item_id.as_str(), link.sort))
        .collect();
    let target_set: HashSet<&str> = target.iter().map(String::as_str).collect();

    let mut plan = LinkSyncPlan::default();

    for (idx, item_id) in target.iter().enumerate() {
        let sort = i32::try_from(idx).unwrap_or(i32::MAX);
        match current_sort.get(item_id.as_str()) {
            None => plan.to_add.push(OfferItemLink::new(offer_id, item_id.as_str(), sort)),
            Some(existing) if *existing != sort => {
                plan.to_reorder.push(OfferItemLink::new(offer_id, item_id.as_str(), sort))
            }
            Some(_) => {}
        }
    }

    plan.to_remove = current
        .iter()
        .filter(|link| !target_set.contains(link.item_id.as_str()))
        .map(|link| link.item_id.clone())
        .collect();

    plan
}

/// Reconciles an offer's persisted links with a desired ordered item list.
///
/// Writes are issued one by one without a transaction. Every write is
/// idempotent, so a failed or cancelled run is repaired by calling again
/// with the same list.
#[derive(Clone)]
pub struct LinkSynchronizer {
    offers: Arc<dyn OfferRepository>,
    links: Arc<dyn OfferLinkStore>,
}

impl LinkSynchronizer {
    pub fn new(offers: Arc<dyn OfferRepository>, links: Arc<dyn OfferLinkStore>) -> Self {
        Self { offers, links }
    }

    /// Make the offer's links equal `item_ids` (duplicates collapsed, first
    /// occurrence wins) with sort rank = first-occurrence index.
    pub async fn synchronize(&self, offer_id: &str, item_ids: &[String]) -> CoreResult<SyncReport> {
        let target = dedupe_item_ids(item_ids)?;

        if self.offers.get_offer(offer_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("offer {}", offer_id)));
        }

        self.reconcile(offer_id, &target).await
    }

    /// Apply a target list that is already de-duplicated, for an offer known to exist
    pub(crate) async fn reconcile(&self, offer_id: &str, target: &[String]) -> CoreResult<SyncReport> {
        let current = self.links.list_links(offer_id).await?;
        let plan = plan_link_sync(offer_id, &current, target);

        let mut report = SyncReport::default();
        if plan.is_empty() {
            debug!(offer_id, links = current.len(), "Offer links already in sync");
            return Ok(report);
        }

        for link in &plan.to_add {
            match self.links.insert_link_if_absent(link).await {
                Ok(true) => report.inserted += 1,
                Ok(false) | Err(CoreError::Conflict(_)) => {
                    // a concurrent writer got there first; the pair exists, so
                    // only the rank is ours to set
                    debug!(offer_id, item_id = %link.item_id, "Link already present");
                    report.already_present += 1;
                    self.links
                        .update_link_sort(offer_id, &link.item_id, link.sort)
                        .await?;
                }
                Err(e) => return Err(e),
            }
        }

        for item_id in &plan.to_remove {
            if self.links.delete_link(offer_id, item_id).await? {
                report.removed += 1;
            }
        }

        for link in &plan.to_reorder {
            if self
                .links
                .update_link_sort(offer_id, &link.item_id, link.sort)
                .await?
            {
                report.reordered += 1;
            }
        }

        info!(
            offer_id,
            inserted = report.inserted,
            already_present = report.already_present,
            removed = report.removed,
            reordered = report.reordered,
            "Offer links synchronized"
        );

        Ok(report)
    }
}
