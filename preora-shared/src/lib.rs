pub mod ids;
pub mod models;

pub use models::catalog::{Game, GameSnapshot, Item};
pub use models::offer::{HydratedOffer, OfferItemLink, OfferPatch, PreorderOffer};
pub use models::preorder::{
    ItemSnapshot, PaymentStatus, Preorder, PreorderLineItem, PreorderStatus,
    PreorderStatusUpdate, PreorderTotals, Pricing, ShippingStatus,
};
