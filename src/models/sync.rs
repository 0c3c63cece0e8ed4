// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Applying one step sync to a user's state and day record.
//!
//! Pure and storage-agnostic: the database layer reads the two documents,
//! calls [`apply_step_sync`] and writes the results back atomically.

use chrono::{DateTime, NaiveDate, Utc};

use crate::engine::{
    catch_up_phases, AccrualError, PhaseChange, PhaseDeadlineExceeded, RewardSchedule,
};
use crate::models::{DailyEarningRecord, UserPhaseState};

/// Everything a sync changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub state: UserPhaseState,
    pub record: DailyEarningRecord,
    /// Steps added to the lifetime total by this sync
    pub new_steps: u64,
    pub phase_changes: Vec<PhaseChange>,
    pub deadlines_exceeded: Vec<PhaseDeadlineExceeded>,
}

/// Fold a cumulative daily step report into the stored documents.
///
/// Missing documents are created: the state at phase 1, the day record
/// priced at the user's phase at the time of creation.
pub fn apply_step_sync(
    user_id: &str,
    date: NaiveDate,
    reported_steps: i64,
    existing_state: Option<UserPhaseState>,
    existing_record: Option<DailyEarningRecord>,
    schedule: &RewardSchedule,
    now: DateTime<Utc>,
) -> Result<SyncOutcome, AccrualError> {
    let mut state = existing_state.unwrap_or_else(|| UserPhaseState::new(user_id, now));

    let mut record = match existing_record {
        Some(record) => record,
        None => {
            let phase = schedule.phases.require(state.current_phase)?;
            DailyEarningRecord::new(user_id, date, phase, now)
        }
    };

    let phase = schedule.phases.require(record.phase_id)?;
    let new_steps = record.apply_sync(reported_steps, phase, &schedule.rules, now)?;
    state.record_steps(new_steps, now);

    let catch_up = catch_up_phases(&state, &schedule.phases, now)?;

    Ok(SyncOutcome {
        state: catch_up.state,
        record,
        new_steps,
        phase_changes: catch_up.changes,
        deadlines_exceeded: catch_up.deadlines_exceeded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EarningStatus;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 20, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    #[test]
    fn test_first_sync_creates_documents() {
        let schedule = RewardSchedule::default();
        let outcome =
            apply_step_sync("walker", today(), 10_000, None, None, &schedule, now()).unwrap();

        assert_eq!(outcome.state.current_phase, 1);
        assert_eq!(outcome.state.total_lifetime_steps, 10_000);
        assert_eq!(outcome.state.phase_start_date, now());
        assert_eq!(outcome.record.coins_earned, 400);
        assert_eq!(outcome.record.status, EarningStatus::Pending);
        assert_eq!(outcome.new_steps, 10_000);
        assert!(outcome.phase_changes.is_empty());
    }

    #[test]
    fn test_resync_only_adds_delta_to_lifetime() {
        let schedule = RewardSchedule::default();
        let first =
            apply_step_sync("walker", today(), 3_000, None, None, &schedule, now()).unwrap();
        let second = apply_step_sync(
            "walker",
            today(),
            5_000,
            Some(first.state),
            Some(first.record),
            &schedule,
            now(),
        )
        .unwrap();

        assert_eq!(second.new_steps, 2_000);
        assert_eq!(second.state.total_lifetime_steps, 5_000);
        assert_eq!(second.record.coins_earned, 200);
    }

    #[test]
    fn test_lifetime_counts_steps_over_cap() {
        let schedule = RewardSchedule::default();
        let outcome =
            apply_step_sync("walker", today(), 20_000, None, None, &schedule, now()).unwrap();

        assert_eq!(outcome.state.total_lifetime_steps, 20_000);
        assert_eq!(outcome.record.steps, 12_000);
        assert_eq!(outcome.record.coins_earned, 480);
    }

    #[test]
    fn test_crossing_threshold_keeps_day_rate() {
        let schedule = RewardSchedule::default();
        let mut state = UserPhaseState::new("walker", now() - Duration::days(30));
        state.total_lifetime_steps = 195_000;

        let outcome = apply_step_sync(
            "walker",
            today(),
            10_000,
            Some(state),
            None,
            &schedule,
            now(),
        )
        .unwrap();

        assert_eq!(outcome.state.current_phase, 2);
        assert_eq!(outcome.phase_changes.len(), 1);
        assert_eq!(outcome.phase_changes[0].from, 1);
        assert_eq!(outcome.phase_changes[0].to, 2);
        // The day record stays priced at phase 1.
        assert_eq!(outcome.record.phase_id, 1);
        assert_eq!(outcome.record.coins_earned, 400);
    }

    #[test]
    fn test_late_completion_reports_deadline() {
        let schedule = RewardSchedule::default();
        let mut state = UserPhaseState::new("walker", now() - Duration::days(90));
        state.total_lifetime_steps = 199_000;

        let outcome = apply_step_sync(
            "walker",
            today(),
            2_000,
            Some(state),
            None,
            &schedule,
            now(),
        )
        .unwrap();

        assert_eq!(outcome.state.current_phase, 2);
        assert_eq!(outcome.deadlines_exceeded.len(), 1);
        assert_eq!(outcome.deadlines_exceeded[0].elapsed_days, 90);
    }

    #[test]
    fn test_invalid_steps_rejected() {
        let schedule = RewardSchedule::default();
        let result = apply_step_sync("walker", today(), -1, None, None, &schedule, now());
        assert!(matches!(result, Err(AccrualError::InvalidInput(_))));
    }
}
