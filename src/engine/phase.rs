// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Phase definitions and the validated phase table.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::AccrualError;

/// Days allowed to complete each phase in the default table.
pub const DEFAULT_TIME_LIMIT_DAYS: u32 = 60;

/// Longest time limit a phase may carry (about a century).
pub const MAX_TIME_LIMIT_DAYS: u32 = 36_500;

/// One tier of the progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhaseDefinition {
    /// 1-based position in the progression
    pub id: u8,
    pub name: String,
    pub symbol: String,
    /// Units earned per completed block of steps while in this phase
    pub rate: u32,
    /// Cumulative lifetime steps needed to complete this phase
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub step_requirement: u64,
    pub time_limit_days: u32,
}

/// Ordered, validated list of phases.
///
/// Construction goes through [`PhaseTable::new`], so every table in the
/// process satisfies: ids are `1..=n` in order, `step_requirement` strictly
/// increases and `rate` never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhaseTable {
    phases: Vec<PhaseDefinition>,
}

impl PhaseTable {
    /// Build a table, rejecting rows that break the progression invariants.
    pub fn new(phases: Vec<PhaseDefinition>) -> Result<Self, AccrualError> {
        if phases.is_empty() {
            return Err(AccrualError::InvalidPhaseTable(
                "table must contain at least one phase".to_string(),
            ));
        }
        if phases.len() > u8::MAX as usize {
            return Err(AccrualError::InvalidPhaseTable(format!(
                "table has {} phases, at most {} are supported",
                phases.len(),
                u8::MAX
            )));
        }

        for (idx, phase) in phases.iter().enumerate() {
            let expected_id = idx + 1;
            if phase.id as usize != expected_id {
                return Err(AccrualError::InvalidPhaseTable(format!(
                    "phase at position {} has id {}, expected {}",
                    idx, phase.id, expected_id
                )));
            }
            if phase.time_limit_days == 0 {
                return Err(AccrualError::InvalidPhaseTable(format!(
                    "phase {} has a zero time limit",
                    phase.id
                )));
            }
            if phase.time_limit_days > MAX_TIME_LIMIT_DAYS {
                return Err(AccrualError::InvalidPhaseTable(format!(
                    "phase {} time limit of {} days exceeds {}",
                    phase.id, phase.time_limit_days, MAX_TIME_LIMIT_DAYS
                )));
            }
        }

        for pair in phases.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.step_requirement <= prev.step_requirement {
                return Err(AccrualError::InvalidPhaseTable(format!(
                    "step requirement of phase {} ({}) must exceed phase {} ({})",
                    next.id, next.step_requirement, prev.id, prev.step_requirement
                )));
            }
            if next.rate < prev.rate {
                return Err(AccrualError::InvalidPhaseTable(format!(
                    "rate of phase {} ({}) is lower than phase {} ({})",
                    next.id, next.rate, prev.id, prev.rate
                )));
            }
        }

        Ok(Self { phases })
    }

    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Look up a phase by id.
    pub fn get(&self, id: u8) -> Option<&PhaseDefinition> {
        if id == 0 {
            return None;
        }
        self.phases.get(id as usize - 1)
    }

    /// Like [`get`](Self::get), but an unknown id is an error.
    pub fn require(&self, id: u8) -> Result<&PhaseDefinition, AccrualError> {
        self.get(id).ok_or(AccrualError::UnknownPhase(id))
    }

    pub fn first(&self) -> &PhaseDefinition {
        &self.phases[0]
    }

    /// The last phase. Users never progress past it.
    pub fn terminal(&self) -> &PhaseDefinition {
        &self.phases[self.phases.len() - 1]
    }

    pub fn is_terminal(&self, id: u8) -> bool {
        id as usize == self.phases.len()
    }

    /// The phase after `id`, if any.
    pub fn next(&self, id: u8) -> Option<&PhaseDefinition> {
        self.get(id.checked_add(1)?)
    }
}

impl Default for PhaseTable {
    /// The nine-phase Paisa to Immortal schedule.
    fn default() -> Self {
        let rows: [(&str, &str, u32, u64); 9] = [
            ("Paisa", "🪙", 1, 200_000),
            ("Rupee", "💵", 2, 500_000),
            ("Bronze", "🥉", 3, 900_000),
            ("Silver", "🥈", 4, 1_400_000),
            ("Gold", "🥇", 5, 2_000_000),
            ("Platinum", "💠", 6, 2_700_000),
            ("Diamond", "💎", 7, 3_500_000),
            ("Legend", "👑", 8, 4_400_000),
            ("Immortal", "🔱", 10, 5_400_000),
        ];

        let phases = rows
            .iter()
            .enumerate()
            .map(|(idx, (name, symbol, rate, step_requirement))| PhaseDefinition {
                id: (idx + 1) as u8,
                name: name.to_string(),
                symbol: symbol.to_string(),
                rate: *rate,
                step_requirement: *step_requirement,
                time_limit_days: DEFAULT_TIME_LIMIT_DAYS,
            })
            .collect();

        Self { phases }
    }
}

impl<'de> Deserialize<'de> for PhaseTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let phases = Vec::<PhaseDefinition>::deserialize(deserializer)?;
        PhaseTable::new(phases).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn phase(id: u8, rate: u32, step_requirement: u64) -> PhaseDefinition {
        PhaseDefinition {
            id,
            name: format!("Phase {}", id),
            symbol: "*".to_string(),
            rate,
            step_requirement,
            time_limit_days: DEFAULT_TIME_LIMIT_DAYS,
        }
    }

    #[test]
    fn test_default_table_is_valid() {
        let table = PhaseTable::default();
        assert_eq!(table.len(), 9);
        assert!(PhaseTable::new(table.phases().to_vec()).is_ok());
        assert_eq!(table.first().name, "Paisa");
        assert_eq!(table.terminal().name, "Immortal");
    }

    #[test]
    fn test_default_table_adjacent_invariants() {
        let table = PhaseTable::default();
        for pair in table.phases().windows(2) {
            assert!(pair[0].step_requirement < pair[1].step_requirement);
            assert!(pair[0].rate <= pair[1].rate);
        }
    }

    #[test]
    fn test_first_two_phases_match_published_rates() {
        let table = PhaseTable::default();
        assert_eq!(table.require(1).unwrap().rate, 1);
        assert_eq!(table.require(1).unwrap().step_requirement, 200_000);
        assert_eq!(table.require(2).unwrap().rate, 2);
    }

    #[test]
    fn test_lookup() {
        let table = PhaseTable::default();
        assert!(table.get(0).is_none());
        assert!(table.get(10).is_none());
        assert_eq!(table.next(1).map(|p| p.id), Some(2));
        assert!(table.next(9).is_none());
        assert!(table.is_terminal(9));
        assert!(!table.is_terminal(8));
        assert!(matches!(
            table.require(42),
            Err(AccrualError::UnknownPhase(42))
        ));
    }

    #[test]
    fn test_rejects_empty_table() {
        assert!(matches!(
            PhaseTable::new(vec![]),
            Err(AccrualError::InvalidPhaseTable(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_order_ids() {
        let result = PhaseTable::new(vec![phase(1, 1, 100), phase(3, 2, 200)]);
        assert!(matches!(result, Err(AccrualError::InvalidPhaseTable(_))));
    }

    #[test]
    fn test_rejects_non_increasing_requirement() {
        let result = PhaseTable::new(vec![phase(1, 1, 100), phase(2, 2, 100)]);
        assert!(matches!(result, Err(AccrualError::InvalidPhaseTable(_))));
    }

    #[test]
    fn test_rejects_decreasing_rate() {
        let result = PhaseTable::new(vec![phase(1, 3, 100), phase(2, 2, 200)]);
        assert!(matches!(result, Err(AccrualError::InvalidPhaseTable(_))));
    }

    #[test]
    fn test_rejects_zero_time_limit() {
        let mut p = phase(1, 1, 100);
        p.time_limit_days = 0;
        assert!(matches!(
            PhaseTable::new(vec![p]),
            Err(AccrualError::InvalidPhaseTable(_))
        ));
    }

    #[test]
    fn test_rejects_time_limit_beyond_calendar_range() {
        let mut p = phase(1, 1, 100);
        p.time_limit_days = 100_000_000;
        assert!(matches!(
            PhaseTable::new(vec![p.clone()]),
            Err(AccrualError::InvalidPhaseTable(_))
        ));

        p.time_limit_days = MAX_TIME_LIMIT_DAYS;
        assert!(PhaseTable::new(vec![p]).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let bad = r#"[
            {"id":1,"name":"A","symbol":"a","rate":2,"step_requirement":100,"time_limit_days":30},
            {"id":2,"name":"B","symbol":"b","rate":1,"step_requirement":200,"time_limit_days":30}
        ]"#;
        assert!(serde_json::from_str::<PhaseTable>(bad).is_err());

        let good = r#"[
            {"id":1,"name":"A","symbol":"a","rate":1,"step_requirement":100,"time_limit_days":30}
        ]"#;
        let table: PhaseTable = serde_json::from_str(good).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.is_terminal(1));
    }
}
