pub mod repository;

pub use repository::{
    CatalogStore, CatalogWriter, OfferLinkStore, OfferRepository, PreorderRepository,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Persistence failure: {0}")]
    PersistenceError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
