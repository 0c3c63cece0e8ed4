// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step ingestion service.
//!
//! Handles the core workflow:
//! 1. Validate the reported step count and sync date
//! 2. Serialise syncs per user with an in-process lock
//! 3. Apply accrual and phase transitions atomically in Firestore
//! 4. Log phase changes and missed deadlines

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::FirestoreDb;
use crate::engine::{parse_raw_steps, PhaseProgress, RewardSchedule};
use crate::error::{AppError, Result};
use crate::models::{DailyEarningRecord, SyncOutcome, UserPhaseState};

/// Shared per-user sync locks for use in AppState.
pub type SyncLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Step ingestion and earnings service.
#[derive(Clone)]
pub struct StepService {
    db: FirestoreDb,
    schedule: Arc<RewardSchedule>,
    /// Per-user mutex so two syncs for the same user never interleave.
    sync_locks: SyncLocks,
    earning_expiry_days: i64,
}

impl StepService {
    pub fn new(
        db: FirestoreDb,
        schedule: Arc<RewardSchedule>,
        sync_locks: SyncLocks,
        earning_expiry_days: i64,
    ) -> Self {
        Self {
            db,
            schedule,
            sync_locks,
            earning_expiry_days,
        }
    }

    pub fn schedule(&self) -> &RewardSchedule {
        &self.schedule
    }

    /// Reject dates in the future or already outside the redemption window.
    pub fn validate_sync_date(&self, date: NaiveDate, today: NaiveDate) -> Result<()> {
        if date > today {
            return Err(AppError::BadRequest(format!(
                "Cannot record steps for a future date: {}",
                date
            )));
        }
        let window_start = DailyEarningRecord::window_start(today, self.earning_expiry_days);
        if window_start.is_some_and(|start| date < start) {
            return Err(AppError::BadRequest(format!(
                "Cannot record steps for {}: outside the {}-day window",
                date, self.earning_expiry_days
            )));
        }
        Ok(())
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.sync_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Record the cumulative step count for a day (today when `date` is None).
    pub async fn sync_steps(
        &self,
        user_id: &str,
        date: Option<NaiveDate>,
        raw_steps: f64,
    ) -> Result<SyncOutcome> {
        let now = Utc::now();
        let reported_steps = parse_raw_steps(raw_steps)?;
        let date = date.unwrap_or_else(|| now.date_naive());
        self.validate_sync_date(date, now.date_naive())?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let outcome = self
            .db
            .record_steps_atomic(user_id, date, reported_steps, &self.schedule, now)
            .await?;

        for change in &outcome.phase_changes {
            tracing::info!(
                user_id,
                from = change.from,
                to = change.to,
                lifetime_steps = outcome.state.total_lifetime_steps,
                "Phase advanced"
            );
        }
        for missed in &outcome.deadlines_exceeded {
            tracing::warn!(
                user_id,
                phase = missed.phase_id,
                elapsed_days = missed.elapsed_days,
                time_limit_days = missed.time_limit_days,
                "Phase completed after its deadline"
            );
        }

        Ok(outcome)
    }

    /// Current progress view. Users without any sync see a fresh phase-1 state.
    pub async fn progress(&self, user_id: &str) -> Result<PhaseProgress> {
        let now = Utc::now();
        let state = self
            .db
            .get_phase_state(user_id)
            .await?
            .unwrap_or_else(|| UserPhaseState::new(user_id, now));

        Ok(PhaseProgress::compute(&state, &self.schedule.phases, now)?)
    }

    /// Recent daily records, expiring stale pending days on the way out.
    pub async fn earnings_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<DailyEarningRecord>> {
        let now = Utc::now();
        let mut records = self.db.get_earnings_for_user(user_id, limit).await?;

        let expired = expire_stale(&mut records, now, self.earning_expiry_days);
        if !expired.is_empty() {
            tracing::info!(user_id, count = expired.len(), "Expiring stale earnings");
            self.db.batch_set_daily_earnings(&expired).await?;
        }

        Ok(records)
    }

    /// Redeem a pending day's coins.
    pub async fn redeem(&self, user_id: &str, date: NaiveDate) -> Result<DailyEarningRecord> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        self.db
            .redeem_earning_atomic(user_id, date, self.earning_expiry_days, Utc::now())
            .await
    }
}

/// Expire stale pending records in place, returning copies of those changed.
fn expire_stale(
    records: &mut [DailyEarningRecord],
    now: DateTime<Utc>,
    expiry_days: i64,
) -> Vec<DailyEarningRecord> {
    let today = now.date_naive();
    records
        .iter_mut()
        .filter_map(|record| {
            record
                .expire_if_stale(today, expiry_days, now)
                .then(|| record.clone())
        })
        .collect()
}
