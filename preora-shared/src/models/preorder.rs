use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::catalog::{GameSnapshot, Item};

/// Preorder lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreorderStatus {
    #[default]
    Pending,
    Confirmed,
    Fulfilled,
    Cancelled,
}

impl PreorderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }

    /// Pending → Confirmed → Fulfilled, and Pending/Confirmed → Cancelled.
    /// Re-applying the current status is accepted.
    pub fn can_transition_to(&self, next: PreorderStatus) -> bool {
        use PreorderStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Confirmed)
                | (Confirmed, Fulfilled)
                | (Confirmed, Cancelled)
                | (Fulfilled, Fulfilled)
                | (Cancelled, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    #[default]
    NotShipped,
    Shipped,
    Delivered,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotShipped => "not_shipped",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }
}

macro_rules! status_text {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(format!("unknown {}: {}", stringify!($ty), s))
            }
        }
    };
}

status_text!(PreorderStatus { Pending, Confirmed, Fulfilled, Cancelled });
status_text!(PaymentStatus { Unpaid, PartiallyPaid, Paid });
status_text!(ShippingStatus { NotShipped, Shipped, Delivered });

/// Verbatim copy of an item's descriptive fields at order time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "releaseDate", default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameSnapshot>,
    pub price: i64,
    pub discount: i32,
    pub dp: i64,
}

impl ItemSnapshot {
    pub fn capture(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            release_date: item.release_date,
            image: item.image.clone(),
            images: item.images.clone(),
            game: item.game.clone(),
            price: item.price,
            discount: item.discount,
            dp: item.dp,
        }
    }
}

/// Monetary figures computed for one line at order time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pricing {
    pub unit_price: i64,
    pub unit_discount_pct: i32,
    pub unit_final_price: i64,
    pub unit_dp: i64,
    pub line_total_price: i64,
    pub line_total_dp: i64,
}

/// One ordered item. Snapshot and pricing are fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreorderLineItem {
    item_id: String,
    quantity: i32,
    snapshot: ItemSnapshot,
    pricing: Pricing,
}

impl PreorderLineItem {
    pub fn new(item_id: String, quantity: i32, snapshot: ItemSnapshot, pricing: Pricing) -> Self {
        Self {
            item_id,
            quantity,
            snapshot,
            pricing,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn snapshot(&self) -> &ItemSnapshot {
        &self.snapshot
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreorderTotals {
    pub price: i64,
    pub downpayment: i64,
}

/// A customer's preorder.
///
/// Line items and totals are frozen once built; only the status fields
/// change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preorder {
    pub id: String,
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    items: Vec<PreorderLineItem>,
    totals: PreorderTotals,
    pub currency: String,
    pub status: PreorderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_release: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Preorder {
    /// A new pending, unpaid preorder stamped with the current time
    pub fn new(
        id: String,
        customer_id: String,
        offer_id: Option<String>,
        items: Vec<PreorderLineItem>,
        totals: PreorderTotals,
        currency: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            customer_id,
            offer_id,
            items,
            totals,
            currency,
            status: PreorderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            shipping_status: ShippingStatus::NotShipped,
            expected_release: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn items(&self) -> &[PreorderLineItem] {
        &self.items
    }

    pub fn totals(&self) -> PreorderTotals {
        self.totals
    }

    pub fn apply_status(&mut self, update: &PreorderStatusUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(payment_status) = update.payment_status {
            self.payment_status = payment_status;
        }
        if let Some(shipping_status) = update.shipping_status {
            self.shipping_status = shipping_status;
        }
        self.updated_at = Utc::now();
    }
}

/// Status fields that may change after creation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreorderStatusUpdate {
    #[serde(default)]
    pub status: Option<PreorderStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub shipping_status: Option<ShippingStatus>,
}

impl PreorderStatusUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none() && self.shipping_status.is_none()
    }
}
