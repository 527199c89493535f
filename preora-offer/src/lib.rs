pub mod hydrator;
pub mod service;
pub mod sync;

pub use hydrator::OfferItemHydrator;
pub use service::{NewOffer, OfferService, OfferView};
pub use sync::{LinkSyncPlan, LinkSynchronizer, SyncReport};
