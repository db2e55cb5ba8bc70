use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use salon_bookings::config::AppConfig;
use salon_bookings::db;
use salon_bookings::handlers;
use salon_bookings::services::booking::BookingService;
use salon_bookings::services::store::offline::OfflineStore;
use salon_bookings::services::store::sqlite::SqliteStore;
use salon_bookings::services::store::BookingStore;
use salon_bookings::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let store: Arc<dyn BookingStore> = match db::init_db(&config.database_url) {
        Ok(conn) => {
            tracing::info!("connected to booking database at {}", config.database_url);
            Arc::new(SqliteStore::new(conn))
        }
        Err(e) if config.degraded_mode() => {
            tracing::error!(error = %e, "database unavailable, serving non-durable responses");
            Arc::new(OfflineStore)
        }
        Err(e) => return Err(e),
    };

    if config.degraded_mode() {
        tracing::warn!("DEV_FALLBACK enabled: bookings may be accepted without being stored");
    }
    tracing::info!(
        environment = %config.environment,
        delete_mode = ?config.delete_mode,
        wildcard_policy = ?config.wildcard_policy,
        "booking service configured"
    );

    let state = Arc::new(AppState {
        bookings: BookingService::new(store, config.wildcard_policy, config.degraded_mode()),
        config: config.clone(),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
