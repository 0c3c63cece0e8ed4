// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! paisa-steps API Server
//!
//! Ingests step syncs, converts them into coins under the phase schedule and
//! serves progress, earnings and leaderboard views.

use paisa_steps::{
    config::Config, db::FirestoreDb, engine::RewardSchedule, services::StepService, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting paisa-steps API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    // Load reward schedule (built-in unless overridden)
    let schedule = match &config.phase_table_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading reward schedule");
            RewardSchedule::load_from_file(path)?
        }
        None => RewardSchedule::default(),
    };
    tracing::info!(
        phases = schedule.phases.len(),
        expiry_days = config.earning_expiry_days,
        "Reward schedule ready"
    );

    // Per-user sync locks, shared by every request on this instance
    let sync_locks = Arc::new(dashmap::DashMap::new());

    let step_service = StepService::new(
        db.clone(),
        Arc::new(schedule),
        sync_locks,
        config.earning_expiry_days,
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        step_service,
    });

    // Build router
    let app = paisa_steps::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("paisa_steps=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
