// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod earning;
pub mod leaderboard;
pub mod phase_state;
pub mod sync;
pub mod user;

pub use earning::{DailyEarningRecord, EarningStatus};
pub use leaderboard::{rank_entries, LeaderboardEntry};
pub use phase_state::UserPhaseState;
pub use sync::{apply_step_sync, SyncOutcome};
pub use user::User;
