// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily earning records and their redemption lifecycle.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::engine::{compute_daily_earnings, AccrualError, AccrualRules, PhaseDefinition};

/// Lifecycle of a day's earnings: `pending` until redeemed or expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum EarningStatus {
    Pending,
    Redeemed,
    Expired,
}

impl fmt::Display for EarningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EarningStatus::Pending => "pending",
            EarningStatus::Redeemed => "redeemed",
            EarningStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// One user's steps and earnings for one day.
///
/// Stored at: `daily_earnings/{user_id}_{date}`
///
/// The phase is fixed when the record is created; a phase change during the
/// day applies from the next day's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyEarningRecord {
    pub user_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub date: NaiveDate,
    /// Highest cumulative count reported for the day (uncapped)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub raw_steps: u64,
    /// Steps counted toward earnings (capped)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub steps: u64,
    pub phase_id: u8,
    pub rate: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub coins_earned: u64,
    pub status: EarningStatus,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub redeemed_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl DailyEarningRecord {
    /// Empty pending record priced at `phase`.
    pub fn new(
        user_id: impl Into<String>,
        date: NaiveDate,
        phase: &PhaseDefinition,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            raw_steps: 0,
            steps: 0,
            phase_id: phase.id,
            rate: phase.rate,
            coins_earned: 0,
            status: EarningStatus::Pending,
            redeemed_at: None,
            updated_at: now,
        }
    }

    /// Firestore document ID for a user's day.
    pub fn document_id(user_id: &str, date: NaiveDate) -> String {
        format!("{}_{}", user_id, date.format("%Y-%m-%d"))
    }

    /// Apply a step sync reporting the day's cumulative count.
    ///
    /// `phase` must be the phase the record was created under. Returns the
    /// number of newly walked steps; a report at or below the stored count
    /// returns 0 and leaves the record untouched.
    pub fn apply_sync(
        &mut self,
        reported_steps: i64,
        phase: &PhaseDefinition,
        rules: &AccrualRules,
        now: DateTime<Utc>,
    ) -> Result<u64, AccrualError> {
        if self.status != EarningStatus::Pending {
            return Err(self.closed_error());
        }
        if phase.id != self.phase_id {
            return Err(AccrualError::InvalidInput(format!(
                "record for {} is priced at phase {}, not {}",
                self.date, self.phase_id, phase.id
            )));
        }

        let earnings = compute_daily_earnings(reported_steps, phase, rules)?;
        let reported = reported_steps as u64;
        if reported <= self.raw_steps {
            return Ok(0);
        }

        let delta = reported - self.raw_steps;
        self.raw_steps = reported;
        self.steps = earnings.capped_steps;
        self.rate = phase.rate;
        self.coins_earned = earnings.units_earned;
        self.updated_at = now;

        Ok(delta)
    }

    /// Oldest date still inside the redemption window ending `today`.
    ///
    /// `None` when the window reaches past the start of the calendar, in
    /// which case nothing is stale.
    pub fn window_start(today: NaiveDate, expiry_days: i64) -> Option<NaiveDate> {
        Duration::try_days(expiry_days).and_then(|window| today.checked_sub_signed(window))
    }

    /// Whether this day falls outside the redemption window ending `today`.
    pub fn is_past_window(&self, today: NaiveDate, expiry_days: i64) -> bool {
        Self::window_start(today, expiry_days).is_some_and(|start| self.date < start)
    }

    /// Mark a stale pending record as expired. Returns `true` if it changed.
    pub fn expire_if_stale(
        &mut self,
        today: NaiveDate,
        expiry_days: i64,
        now: DateTime<Utc>,
    ) -> bool {
        if self.status == EarningStatus::Pending && self.is_past_window(today, expiry_days) {
            self.status = EarningStatus::Expired;
            self.updated_at = now;
            return true;
        }
        false
    }

    /// Redeem a pending record, returning the coins credited.
    pub fn redeem(&mut self, now: DateTime<Utc>) -> Result<u64, AccrualError> {
        if self.status != EarningStatus::Pending {
            return Err(self.closed_error());
        }
        if self.coins_earned == 0 {
            return Err(AccrualError::NothingToRedeem(self.date.to_string()));
        }

        self.status = EarningStatus::Redeemed;
        self.redeemed_at = Some(now);
        self.updated_at = now;
        Ok(self.coins_earned)
    }

    fn closed_error(&self) -> AccrualError {
        AccrualError::EarningClosed {
            date: self.date.to_string(),
            status: self.status.to_string(),
        }
    }
}
