// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! paisa-steps: walk, earn, level up.
//!
//! This crate provides the phase accrual engine that converts walked steps
//! into currency across nine escalating phases, and the backend API that
//! ingests step syncs and serves progress, earnings and leaderboards.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::StepService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub step_service: StepService,
}
