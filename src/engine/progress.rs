// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only progress view for progress rings, countdowns and badges.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::{AccrualError, PhaseDefinition, PhaseTable};
use crate::models::UserPhaseState;

/// Snapshot of where a user stands within their current phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhaseProgress {
    pub current_phase: PhaseDefinition,
    pub next_phase: Option<PhaseDefinition>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_lifetime_steps: u64,
    /// Steps walked since the previous phase's requirement
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub steps_into_phase: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub steps_remaining: u64,
    /// 0..=100
    pub percent_complete: u8,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub days_elapsed: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub days_remaining: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub deadline: DateTime<Utc>,
    /// Deadline passed with the requirement still unmet
    pub overdue: bool,
    /// Final phase requirement met
    pub completed: bool,
}

impl PhaseProgress {
    pub fn compute(
        state: &UserPhaseState,
        table: &PhaseTable,
        now: DateTime<Utc>,
    ) -> Result<Self, AccrualError> {
        let phase = table.require(state.current_phase)?;
        let floor = phase
            .id
            .checked_sub(1)
            .and_then(|prev| table.get(prev))
            .map(|p| p.step_requirement)
            .unwrap_or(0);

        let lifetime = state.total_lifetime_steps;
        let span = phase.step_requirement.saturating_sub(floor).max(1);
        let steps_into_phase = lifetime.saturating_sub(floor);
        let steps_remaining = phase.step_requirement.saturating_sub(lifetime);
        let percent_complete = (steps_into_phase.saturating_mul(100) / span).min(100) as u8;

        let requirement_met = steps_remaining == 0;
        let days_elapsed = state.days_in_phase(now);
        let time_limit = i64::from(phase.time_limit_days);
        let deadline = state
            .phase_start_date
            .checked_add_signed(Duration::days(time_limit))
            .ok_or_else(|| {
                AccrualError::InvalidInput(format!(
                    "phase {} deadline is outside the calendar range",
                    phase.id
                ))
            })?;

        Ok(Self {
            current_phase: phase.clone(),
            next_phase: table.next(phase.id).cloned(),
            total_lifetime_steps: lifetime,
            steps_into_phase,
            steps_remaining,
            percent_complete,
            days_elapsed,
            days_remaining: (time_limit - days_elapsed).max(0),
            deadline,
            overdue: !requirement_met && days_elapsed > time_limit,
            completed: requirement_met && table.is_terminal(phase.id),
        })
    }
}
