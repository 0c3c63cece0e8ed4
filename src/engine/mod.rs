// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Phase accrual engine.
//!
//! Pure, synchronous, table-driven:
//! - [`compute_daily_earnings`] turns a day's steps into currency units
//! - [`evaluate_phase_transition`] advances a user by at most one phase
//! - [`catch_up_phases`] loops the transition for bulk imports
//! - [`PhaseProgress`] summarises state for display
//!
//! Nothing here performs I/O or holds shared state; callers own persistence
//! and must serialise concurrent updates to the same user.

pub mod accrual;
pub mod error;
pub mod phase;
pub mod progress;
pub mod schedule;
pub mod transition;

pub use accrual::{compute_daily_earnings, parse_raw_steps, DailyEarnings};
pub use error::AccrualError;
pub use phase::{PhaseDefinition, PhaseTable, MAX_TIME_LIMIT_DAYS};
pub use progress::PhaseProgress;
pub use schedule::{AccrualRules, RewardSchedule, ScheduleError, MAX_DAILY_STEPS, STEPS_PER_UNIT};
pub use transition::{
    catch_up_phases, evaluate_phase_transition, CatchUp, PhaseChange, PhaseDeadlineExceeded,
    PhaseTransition,
};
