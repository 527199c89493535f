use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::Item;

/// A preorder campaign that groups catalog items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreorderOffer {
    /// Business id (e.g. `OFFER-...`)
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Membership of one item in one offer.
///
/// At most one link exists per `(offer_id, item_id)`; `sort` orders the
/// offer's items and does not have to be contiguous.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferItemLink {
    pub offer_id: String,
    pub item_id: String,
    pub sort: i32,
}

impl OfferItemLink {
    pub fn new(offer_id: impl Into<String>, item_id: impl Into<String>, sort: i32) -> Self {
        Self {
            offer_id: offer_id.into(),
            item_id: item_id.into(),
            sort,
        }
    }
}

/// Partial update of an offer's own fields. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl OfferPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.active.is_none()
            && self.banner.is_none()
            && self.logo.is_none()
    }

    pub fn apply_to(&self, offer: &mut PreorderOffer) {
        if let Some(title) = &self.title {
            offer.title = title.clone();
        }
        if let Some(description) = &self.description {
            offer.description = Some(description.clone());
        }
        if let Some(start_date) = self.start_date {
            offer.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            offer.end_date = end_date;
        }
        if let Some(active) = self.active {
            offer.active = active;
        }
        if let Some(banner) = &self.banner {
            offer.banner = Some(banner.clone());
        }
        if let Some(logo) = &self.logo {
            offer.logo = Some(logo.clone());
        }
    }
}

/// An offer together with its linked items in sort order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HydratedOffer {
    #[serde(flatten)]
    pub offer: PreorderOffer,
    pub items: Vec<Item>,
}
