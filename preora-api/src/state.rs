use std::sync::Arc;

use preora_catalog::{CatalogAdmin, CatalogLookup};
use preora_core::{
    CatalogStore, CatalogWriter, OfferLinkStore, OfferRepository, PreorderRepository,
};
use preora_offer::OfferService;
use preora_order::{PreorderManager, PreorderSnapshotBuilder};
use preora_store::app_config::{RateLimitConfig, StorefrontConfig};
use preora_store::{
    DbClient, InMemoryStore, RedisClient, StoreCatalogRepository, StoreOfferRepository,
    StorePreorderRepository,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

/// Storage backends behind the services
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogStore>,
    pub catalog_writer: Arc<dyn CatalogWriter>,
    pub offers: Arc<dyn OfferRepository>,
    pub links: Arc<dyn OfferLinkStore>,
    pub preorders: Arc<dyn PreorderRepository>,
}

impl Repositories {
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            catalog: store.clone(),
            catalog_writer: store.clone(),
            offers: store.clone(),
            links: store.clone(),
            preorders: store,
        }
    }

    pub fn postgres(db: &DbClient) -> Self {
        let catalog = Arc::new(StoreCatalogRepository::new(db.pool.clone()));
        let offers = Arc::new(StoreOfferRepository::new(db.pool.clone()));
        Self {
            catalog: catalog.clone(),
            catalog_writer: catalog,
            offers: offers.clone(),
            links: offers,
            preorders: Arc::new(StorePreorderRepository::new(db.pool.clone())),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogAdmin>,
    pub offers: Arc<OfferService>,
    pub preorders: Arc<PreorderManager>,
    pub redis: Option<Arc<RedisClient>>,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(repos: Repositories, storefront: &StorefrontConfig, auth: AuthConfig) -> Self {
        let catalog = CatalogLookup::new(repos.catalog);
        let admin = CatalogAdmin::new(catalog.clone(), repos.catalog_writer);
        let offers = OfferService::new(repos.offers.clone(), repos.links, catalog.clone());
        let builder = PreorderSnapshotBuilder::new(
            catalog,
            repos.offers,
            storefront.currency.clone(),
            storefront.preorder_id_prefix.clone(),
        );

        Self {
            catalog: Arc::new(admin),
            offers: Arc::new(offers),
            preorders: Arc::new(PreorderManager::new(builder, repos.preorders)),
            redis: None,
            rate_limit: RateLimitConfig::default(),
            auth,
        }
    }

    /// Enable per-client rate limiting backed by Redis
    pub fn with_redis(mut self, redis: Arc<RedisClient>, limits: RateLimitConfig) -> Self {
        self.redis = Some(redis);
        self.rate_limit = limits;
        self
    }
}
