mod adapter;
mod adapter_news;
mod adapter_vision;
mod config;
mod pg_ledger;
mod pipeline;
mod results_store;
mod routes_analyze;
mod routes_registry;
mod routes_results;
mod routes_status;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    let pg_pool = PgPool::connect(&cfg.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to run migrations")?;

    startup_checks(&cfg, &pg_pool).await?;

    let max_upload_bytes = cfg.max_upload_bytes;
    let app_state = Arc::new(AppState::new(cfg.clone(), pg_pool)?);

    let app = Router::new()
        .route("/api/analyze", post(routes_analyze::analyze))
        .route("/api/results/:id", get(routes_results::get_result))
        .route("/api/history", get(routes_results::get_history))
        .route("/api/registry/:hash", get(routes_registry::get_registration))
        .route("/api/status", get(routes_status::status))
        .route("/api/health", get(routes_status::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes + 64 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = &cfg.bind_addr;
    info!("gateway listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server exited")?;

    Ok(())
}

async fn startup_checks(cfg: &AppConfig, pg_pool: &PgPool) -> Result<()> {
    check_postgres(pg_pool).await?;
    info!("postgres: ok");

    match &cfg.vision {
        Some(v) => info!(endpoint = %v.endpoint, "cloud vision adapter: enabled"),
        None => info!("cloud vision adapter: disabled (no credentials)"),
    }
    match &cfg.news {
        Some(n) => info!(endpoint = %n.endpoint, "news search adapter: enabled"),
        None => info!("news search adapter: disabled (no credentials)"),
    }

    Ok(())
}

async fn check_postgres(pg_pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pg_pool)
        .await
        .context("Postgres ping failed")?;
    Ok(())
}
