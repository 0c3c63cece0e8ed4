// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user phase progression state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase progression for one user.
///
/// Stored at: `phase_states/{user_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPhaseState {
    /// Auth subject (also used as document ID)
    pub user_id: String,
    /// 1-based phase id; never decreases
    pub current_phase: u8,
    /// All steps ever recorded, uncapped
    pub total_lifetime_steps: u64,
    /// When the current phase began (deadline reference point)
    pub phase_start_date: DateTime<Utc>,
    /// Last write to this document
    pub updated_at: DateTime<Utc>,
}

impl UserPhaseState {
    /// Fresh state for a user's first recorded sync.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            current_phase: 1,
            total_lifetime_steps: 0,
            phase_start_date: now,
            updated_at: now,
        }
    }

    /// Add newly walked steps to the lifetime total.
    pub fn record_steps(&mut self, delta: u64, now: DateTime<Utc>) {
        self.total_lifetime_steps = self.total_lifetime_steps.saturating_add(delta);
        self.updated_at = now;
    }

    /// Whole days since the current phase started. Negative clock skew reads as 0.
    pub fn days_in_phase(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.phase_start_date)
            .num_days()
            .max(0)
    }
}
