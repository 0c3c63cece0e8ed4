// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Accrual rules and the reward schedule loaded at startup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::{AccrualError, PhaseTable};

/// Maximum steps per day that count toward earnings.
pub const MAX_DAILY_STEPS: u64 = 12_000;

/// Steps per earning block.
pub const STEPS_PER_UNIT: u64 = 25;

/// Daily conversion limits shared by every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccrualRules {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub max_daily_steps: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub steps_per_unit: u64,
}

impl Default for AccrualRules {
    fn default() -> Self {
        Self {
            max_daily_steps: MAX_DAILY_STEPS,
            steps_per_unit: STEPS_PER_UNIT,
        }
    }
}

impl AccrualRules {
    pub fn validate(&self) -> Result<(), AccrualError> {
        if self.max_daily_steps == 0 {
            return Err(AccrualError::InvalidPhaseTable(
                "max_daily_steps must be positive".to_string(),
            ));
        }
        if self.steps_per_unit == 0 {
            return Err(AccrualError::InvalidPhaseTable(
                "steps_per_unit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Phase table plus accrual rules, injected wherever earnings are computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewardSchedule {
    pub rules: AccrualRules,
    pub phases: PhaseTable,
}

/// On-disk layout of a schedule file. Omitted sections fall back to defaults.
#[derive(Deserialize)]
struct ScheduleFile {
    #[serde(default)]
    rules: AccrualRules,
    #[serde(default)]
    phases: PhaseTable,
}

impl RewardSchedule {
    pub fn new(rules: AccrualRules, phases: PhaseTable) -> Result<Self, AccrualError> {
        rules.validate()?;
        Ok(Self { rules, phases })
    }

    /// Load a schedule from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScheduleError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| ScheduleError::Io(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load a schedule from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, ScheduleError> {
        let file: ScheduleFile =
            serde_json::from_str(json_data).map_err(|e| ScheduleError::Parse(e.to_string()))?;
        let schedule = Self::new(file.rules, file.phases)?;

        tracing::info!(
            phases = schedule.phases.len(),
            max_daily_steps = schedule.rules.max_daily_steps,
            steps_per_unit = schedule.rules.steps_per_unit,
            "Loaded reward schedule"
        );
        Ok(schedule)
    }
}

/// Errors from loading a schedule.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Failed to read file: {0}")]
    Io(String),

    #[error("Failed to parse schedule: {0}")]
    Parse(String),

    #[error(transparent)]
    Invalid(#[from] AccrualError),
}
