use anyhow::Result;
use dataset_fetch::DatasetClient;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod routes;
mod session_routes;
mod state;
#[cfg(test)]
mod test_support;

use config::GatewayConfig;
use state::{AppState, GeometryStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "atlas_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();

    let client = DatasetClient::new(config.client.clone())?;
    tracing::info!(
        "   Dataset client: timeout {}s, cache TTL {}s",
        config.client.timeout_sec,
        config.client.cache_ttl_sec
    );

    let geometry = GeometryStore::load(&client, &config.geometry).await;
    let state = AppState::new(
        client,
        geometry,
        &config.sequence_base_url,
        config.session_idle_sec,
    );

    let mut app = routes::app(state);

    // Static file serving for a built UI
    match &config.static_dir {
        Some(dir) if dir.exists() => {
            tracing::info!("   Serving UI from {}", dir.display());
            app = app.fallback_service(ServeDir::new(dir));
        }
        Some(dir) => tracing::warn!("   Static dir {} not found, serving API only", dir.display()),
        None => {}
    }

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Sample atlas gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
