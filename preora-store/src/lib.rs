pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod memory;
pub mod offer_repo;
pub mod preorder_repo;
pub mod redis_repo;

mod db_error;

pub use catalog_repo::StoreCatalogRepository;
pub use database::DbClient;
pub use memory::InMemoryStore;
pub use offer_repo::StoreOfferRepository;
pub use preorder_repo::StorePreorderRepository;
pub use redis_repo::RedisClient;
