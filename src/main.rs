// Main entry point - Dependency injection and runtime setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::dashboard_runtime::DashboardRuntime;
use crate::application::query_coordinator::QueryCoordinator;
use crate::application::session::DashboardSession;
use crate::application::stream_ingestor::StreamIngestor;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_bulk_fetch::HttpBulkFetch;
use crate::infrastructure::push_channel::{spawn_http_reader, spawn_stdin_reader};
use crate::presentation::console_surface::ConsoleSurface;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_dashboard_config()?;
    let settings = &config.dashboard;
    let deployment = settings.deployment;

    // Bulk fetch adapter (infrastructure layer)
    let fetcher = Arc::new(HttpBulkFetch::new(&config.backend, deployment)?);

    // Session and use cases (application layer)
    let console = Arc::new(ConsoleSurface::new(settings.fraction_digits()));
    let session = DashboardSession::new(deployment, settings.window(), console.clone(), console);
    let ingestor = StreamIngestor::new(deployment, settings.implicit_sensor.clone());
    let coordinator = QueryCoordinator::new(
        fetcher,
        deployment,
        settings.implicit_sensor.clone(),
        settings.filter_limit(),
    );
    let runtime = DashboardRuntime::new(session, ingestor, coordinator, settings.preload_limit());

    // Inbound channel
    let (tx, rx) = mpsc::channel(256);
    if let Some(url) = config.push.url.clone() {
        spawn_http_reader(reqwest::Client::new(), url, tx.clone());
    }
    spawn_stdin_reader(tx);

    tracing::info!(
        "Starting sensor dashboard ({:?}) against {}",
        deployment,
        config.backend.base_url
    );

    let session = runtime.run(rx).await;
    tracing::info!(
        "Inbound channel closed, {} sensors tracked, final mode {}",
        session.registry().len(),
        session.mode().mode().label()
    );

    Ok(())
}
