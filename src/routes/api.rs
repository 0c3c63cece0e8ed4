// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::engine::{PhaseChange, PhaseDeadlineExceeded, PhaseProgress};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{rank_entries, DailyEarningRecord, EarningStatus, LeaderboardEntry};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const DEFAULT_EARNINGS_LIMIT: u32 = 30;
const MAX_EARNINGS_LIMIT: u32 = 90;
const DEFAULT_LEADERBOARD_LIMIT: u32 = 20;
const MAX_LEADERBOARD_LIMIT: u32 = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/steps", post(sync_steps))
        .route("/api/progress", get(get_progress))
        .route("/api/earnings", get(get_earnings))
        .route("/api/earnings/{date}/redeem", post(redeem_earning))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/account", delete(delete_account))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(format!("Invalid date '{}': expected YYYY-MM-DD", raw))
    })
}

// ─── Step Sync ───────────────────────────────────────────────

/// Cumulative step count for one day.
#[derive(Debug, Deserialize, Validate)]
pub struct StepSyncRequest {
    /// Whole, non-negative count; the daily cap bounds what it earns
    #[validate(range(min = 0.0))]
    pub steps: f64,
    /// Day the steps belong to (YYYY-MM-DD); defaults to today (UTC)
    #[validate(length(equal = 10))]
    pub date: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StepSyncResponse {
    pub date: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub raw_steps: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub steps: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub steps_over_cap: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub coins_earned: u64,
    pub rate: u32,
    pub status: EarningStatus,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub new_steps: u64,
    pub current_phase: u8,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_lifetime_steps: u64,
    pub phase_changes: Vec<PhaseChange>,
    pub deadlines_exceeded: Vec<PhaseDeadlineExceeded>,
}

/// Record the day's cumulative step count.
async fn sync_steps(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StepSyncRequest>,
) -> Result<Json<StepSyncResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let date = payload.date.as_deref().map(parse_date).transpose()?;

    tracing::debug!(
        user_id = %user.user_id,
        steps = payload.steps,
        date = ?date,
        "Step sync"
    );

    let outcome = state
        .step_service
        .sync_steps(&user.user_id, date, payload.steps)
        .await?;

    let record = outcome.record;
    Ok(Json(StepSyncResponse {
        date: record.date.to_string(),
        raw_steps: record.raw_steps,
        steps: record.steps,
        steps_over_cap: record.raw_steps.saturating_sub(record.steps),
        coins_earned: record.coins_earned,
        rate: record.rate,
        status: record.status,
        new_steps: outcome.new_steps,
        current_phase: outcome.state.current_phase,
        total_lifetime_steps: outcome.state.total_lifetime_steps,
        phase_changes: outcome.phase_changes,
        deadlines_exceeded: outcome.deadlines_exceeded,
    }))
}

// ─── Progress ────────────────────────────────────────────────

/// Phase progress for rings, countdowns and badges.
async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PhaseProgress>> {
    let progress = state.step_service.progress(&user.user_id).await?;
    Ok(Json(progress))
}

// ─── Earnings ────────────────────────────────────────────────

#[derive(Deserialize)]
struct EarningsQuery {
    #[serde(default = "default_earnings_limit")]
    limit: u32,
}

fn default_earnings_limit() -> u32 {
    DEFAULT_EARNINGS_LIMIT
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EarningsResponse {
    pub earnings: Vec<DailyEarningRecord>,
    /// Coins waiting to be redeemed across the returned days
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub pending_coins: u64,
}

/// Recent daily earnings, newest first.
async fn get_earnings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<EarningsQuery>,
) -> Result<Json<EarningsResponse>> {
    let limit = params.limit.clamp(1, MAX_EARNINGS_LIMIT);
    let earnings = state
        .step_service
        .earnings_history(&user.user_id, limit)
        .await?;

    let pending_coins = earnings
        .iter()
        .filter(|e| e.status == EarningStatus::Pending)
        .map(|e| e.coins_earned)
        .sum();

    Ok(Json(EarningsResponse {
        earnings,
        pending_coins,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RedeemResponse {
    pub date: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub coins_redeemed: u64,
    pub status: EarningStatus,
}

/// Redeem one day's pending coins.
async fn redeem_earning(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Json<RedeemResponse>> {
    let date = parse_date(&date)?;
    let record = state.step_service.redeem(&user.user_id, date).await?;

    Ok(Json(RedeemResponse {
        date: record.date.to_string(),
        coins_redeemed: record.coins_earned,
        status: record.status,
    }))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LeaderboardQuery {
    #[serde(default = "default_leaderboard_limit")]
    limit: u32,
}

fn default_leaderboard_limit() -> u32 {
    DEFAULT_LEADERBOARD_LIMIT
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

/// Top users by lifetime steps.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let limit = params.limit.clamp(1, MAX_LEADERBOARD_LIMIT);
    tracing::debug!(user_id = %user.user_id, limit, "Fetching leaderboard");

    let states = state.db.get_top_phase_states(limit).await?;
    let user_ids: Vec<String> = states.iter().map(|s| s.user_id.clone()).collect();
    let profiles = state.db.get_users_by_ids(&user_ids).await?;

    let entries = rank_entries(states, &profiles, &state.step_service.schedule().phases);
    Ok(Json(LeaderboardResponse { entries }))
}

// ─── Account Deletion ────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub deleted_documents: usize,
}

/// Delete the user's progression, earnings and profile.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(user_id = %user.user_id, "User-initiated account deletion");

    let deleted = state.db.delete_user_data(&user.user_id).await?;

    Ok(Json(DeleteAccountResponse {
        success: true,
        deleted_documents: deleted,
    }))
}
