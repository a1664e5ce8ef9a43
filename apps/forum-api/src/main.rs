use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use forum_api::auth::jwks::JwksClient;
use forum_api::config::Config;
use forum_api::db::kv::{KeyValueStore, MemoryStore};
use forum_api::routes::ApiDoc;
use forum_api::AppState;
use forum_common::SnowflakeGenerator;

#[tokio::main]
async fn main() {
    // Env vars may be set externally, so a missing .env is not an error.
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let db = forum_api::db::pool::connect(&config.database_url).await;

    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let jwks = JwksClient::new(&config.hub_url);

    tracing::info!(
        forum_id = %config.forum_id,
        hub_url = %config.hub_url,
        reading_position_min_interval_ms = config.reading_position_min_interval.as_millis() as u64,
        "forum-api configured"
    );

    let state = AppState {
        db,
        kv,
        jwks,
        config: Arc::new(config),
        snowflake: Arc::new(SnowflakeGenerator::new(0)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(forum_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "forum-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
