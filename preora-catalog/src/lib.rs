pub mod admin;
pub mod lookup;
pub mod pricing;

pub use admin::{CatalogAdmin, ItemInput};
pub use lookup::{validate_item, CatalogLookup};
pub use pricing::{PricingEngine, PricingError};
