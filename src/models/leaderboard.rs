// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard ranking by lifetime steps.

use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::engine::PhaseTable;
use crate::models::{User, UserPhaseState};

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    /// 1-based
    pub rank: u32,
    pub user_id: String,
    pub display_name: Option<String>,
    pub phase_id: u8,
    pub phase_name: String,
    pub phase_symbol: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_lifetime_steps: u64,
}

/// Rank states (already ordered by lifetime steps, descending) into entries.
///
/// States whose phase is missing from `table` still rank, with an empty
/// phase name.
pub fn rank_entries(
    states: Vec<UserPhaseState>,
    profiles: &HashMap<String, User>,
    table: &PhaseTable,
) -> Vec<LeaderboardEntry> {
    states
        .into_iter()
        .enumerate()
        .map(|(idx, state)| {
            let (phase_name, phase_symbol) = table
                .get(state.current_phase)
                .map(|p| (p.name.clone(), p.symbol.clone()))
                .unwrap_or_default();

            LeaderboardEntry {
                rank: idx as u32 + 1,
                display_name: profiles
                    .get(&state.user_id)
                    .and_then(|u| u.display_name.clone()),
                user_id: state.user_id,
                phase_id: state.current_phase,
                phase_name,
                phase_symbol,
                total_lifetime_steps: state.total_lifetime_steps,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state(user_id: &str, phase: u8, steps: u64) -> UserPhaseState {
        let mut s = UserPhaseState::new(user_id, Utc::now());
        s.current_phase = phase;
        s.total_lifetime_steps = steps;
        s
    }

    #[test]
    fn test_rank_entries_in_order() {
        let mut profiles = HashMap::new();
        let mut alice = User::new("alice", Utc::now());
        alice.display_name = Some("Alice".to_string());
        profiles.insert("alice".to_string(), alice);

        let entries = rank_entries(
            vec![state("alice", 3, 950_000), state("bob", 1, 12_000)],
            &profiles,
            &PhaseTable::default(),
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].display_name.as_deref(), Some("Alice"));
        assert_eq!(entries[0].phase_name, "Bronze");
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[1].user_id, "bob");
        assert!(entries[1].display_name.is_none());
        assert_eq!(entries[1].phase_name, "Paisa");
    }

    #[test]
    fn test_unknown_phase_still_ranked() {
        let entries = rank_entries(
            vec![state("carol", 42, 1)],
            &HashMap::new(),
            &PhaseTable::default(),
        );
        assert_eq!(entries[0].phase_id, 42);
        assert!(entries[0].phase_name.is_empty());
    }
}
