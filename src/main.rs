/*****************************************************************************************
 *
 *  Banana Index – CRUD Microservice in Rust
 *  ----------------------------------------
 *
 *  Banana prices and ripeness per country, over an in-memory list or SQLite.
 *
 *****************************************************************************************/

mod app;
mod config;
mod errors;
mod persistence;
mod routes;
mod services;
mod state;

use std::error::Error;
use std::path::PathBuf;

use axum::serve;
use tokio::net::TcpListener;
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;
use crate::persistence::{open_backend, seed_if_empty};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    //
    // ────────────────────────────────────────────────────────
    //  Locate and load config.json
    // ────────────────────────────────────────────────────────
    //
    let config_path = locate_config()?;
    let cfg = AppConfig::load_from_file(&config_path)?;

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cfg.level_filter())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("Starting Banana Index…");
    tracing::info!("Loaded {} : {:?}", config_path.display(), cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Open backend and seed demo data
    // ────────────────────────────────────────────────────────
    //
    let store = open_backend(&cfg)?;
    tracing::info!("Backend ready: {}", store.describe().await?);

    if cfg.seed_demo_data {
        seed_if_empty(store.as_ref()).await?;
    }

    //
    // ────────────────────────────────────────────────────────
    //  Build Axum app and start listening
    // ────────────────────────────────────────────────────────
    //
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let app = app::build_app(store, cfg);

    let listener = TcpListener::bind(addr).await?;

    tracing::info!("🍌 Banana Index listening on http://{}", addr);
    tracing::info!("📊 API available at http://{}/api/bananas", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .await?;

    Ok(())
}

/// config.json sits next to the executable (copied there by build.rs),
/// one level above it, or in the working directory.
fn locate_config() -> Result<PathBuf, Box<dyn Error>> {
    let exe_path = std::env::current_exe()?;
    let exe_dir = exe_path
        .parent()
        .ok_or("Cannot get executable directory")?;

    let candidates = [
        exe_dir.join("config.json"),
        exe_dir.join("..").join("config.json"),
        PathBuf::from("config.json"),
    ];

    if let Some(found) = candidates.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let searched: Vec<String> = candidates
        .iter()
        .map(|p| format!("  {}", p.display()))
        .collect();

    Err(format!(
        "config.json not found in:\n{}\nCopy config.json to one of these paths.",
        searched.join("\n")
    )
    .into())
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }

    tracing::warn!("CTRL+C received, shutting down. Goodbye.");
}
