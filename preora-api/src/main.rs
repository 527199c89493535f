use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use preora_api::{app, AppState, AuthConfig, Repositories};
use preora_store::app_config::Config;
use preora_store::{DbClient, InMemoryStore, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "preora_api=debug,preora_offer=debug,preora_order=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Preora API on port {}", config.server.port);

    let repos = if config.database.url.trim().is_empty() {
        tracing::warn!("No database url configured; data lives in memory and is lost on restart");
        Repositories::in_memory(Arc::new(InMemoryStore::new()))
    } else {
        let db = DbClient::new(&config.database)
            .await
            .context("Failed to connect to Postgres")?;
        if config.database.run_migrations {
            db.migrate().await.context("Failed to run migrations")?;
        }
        Repositories::postgres(&db)
    };

    let mut app_state = AppState::new(
        repos,
        &config.storefront,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    );

    if let Some(url) = config.redis.url.as_deref() {
        match RedisClient::new(url) {
            Ok(client) => {
                app_state = app_state.with_redis(Arc::new(client), config.rate_limit.clone());
            }
            Err(e) => tracing::warn!("Rate limiting disabled, bad Redis url: {}", e),
        }
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
