// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Phase advancement.
//!
//! [`evaluate_phase_transition`] moves a user forward at most one phase per
//! call. Callers that may have crossed several thresholds at once (bulk step
//! imports) loop with [`catch_up_phases`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::{AccrualError, PhaseTable};
use crate::models::UserPhaseState;

/// Advisory raised when a phase requirement was met after its time limit.
///
/// Missing a deadline has no punitive effect: the transition still happens.
/// The advisory exists so callers can notify or display it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhaseDeadlineExceeded {
    pub phase_id: u8,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub elapsed_days: i64,
    pub time_limit_days: u32,
}

/// Outcome of a single transition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    pub new_state: UserPhaseState,
    pub transitioned: bool,
    pub deadline_exceeded: Option<PhaseDeadlineExceeded>,
}

/// A single forward move recorded during catch-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhaseChange {
    pub from: u8,
    pub to: u8,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub at: DateTime<Utc>,
}

/// Result of repeatedly applying transitions until none apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchUp {
    pub state: UserPhaseState,
    pub changes: Vec<PhaseChange>,
    pub deadlines_exceeded: Vec<PhaseDeadlineExceeded>,
}

/// Check whether `user_state` has completed its current phase and, if so,
/// advance it by exactly one phase.
///
/// Pure: the same inputs always produce the same output.
pub fn evaluate_phase_transition(
    user_state: &UserPhaseState,
    phase_table: &PhaseTable,
    now: DateTime<Utc>,
) -> Result<PhaseTransition, AccrualError> {
    let phase = phase_table.require(user_state.current_phase)?;

    let unchanged = || PhaseTransition {
        new_state: user_state.clone(),
        transitioned: false,
        deadline_exceeded: None,
    };

    if phase_table.is_terminal(phase.id) {
        return Ok(unchanged());
    }

    if user_state.total_lifetime_steps < phase.step_requirement {
        return Ok(unchanged());
    }

    let elapsed_days = user_state.days_in_phase(now);
    let deadline_exceeded =
        (elapsed_days > i64::from(phase.time_limit_days)).then_some(PhaseDeadlineExceeded {
            phase_id: phase.id,
            elapsed_days,
            time_limit_days: phase.time_limit_days,
        });

    let mut new_state = user_state.clone();
    new_state.current_phase = phase.id + 1;
    new_state.phase_start_date = now;
    new_state.updated_at = now;

    Ok(PhaseTransition {
        new_state,
        transitioned: true,
        deadline_exceeded,
    })
}

/// Apply [`evaluate_phase_transition`] until it stops advancing.
///
/// Bounded by the table length since every iteration moves strictly forward.
pub fn catch_up_phases(
    user_state: &UserPhaseState,
    phase_table: &PhaseTable,
    now: DateTime<Utc>,
) -> Result<CatchUp, AccrualError> {
    let mut state = user_state.clone();
    let mut changes = Vec::new();
    let mut deadlines_exceeded = Vec::new();

    for _ in 0..phase_table.len() {
        let step = evaluate_phase_transition(&state, phase_table, now)?;
        if !step.transitioned {
            break;
        }

        changes.push(PhaseChange {
            from: state.current_phase,
            to: step.new_state.current_phase,
            at: now,
        });
        deadlines_exceeded.extend(step.deadline_exceeded);
        state = step.new_state;
    }

    Ok(CatchUp {
        state,
        changes,
        deadlines_exceeded,
    })
}
