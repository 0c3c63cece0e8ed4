// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step to currency conversion for a single day.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::{AccrualError, AccrualRules, PhaseDefinition};

/// Result of converting one day's steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyEarnings {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub units_earned: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub capped_steps: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub steps_over_cap: u64,
}

/// Validate a step count that arrived as a JSON number.
///
/// Rejects NaN, infinities, negatives and fractional values.
pub fn parse_raw_steps(raw: f64) -> Result<i64, AccrualError> {
    if !raw.is_finite() {
        return Err(AccrualError::InvalidInput(format!(
            "step count must be finite, got {}",
            raw
        )));
    }
    if raw < 0.0 {
        return Err(AccrualError::InvalidInput(format!(
            "step count must not be negative, got {}",
            raw
        )));
    }
    if raw.fract() != 0.0 {
        return Err(AccrualError::InvalidInput(format!(
            "step count must be a whole number, got {}",
            raw
        )));
    }
    if raw > i64::MAX as f64 {
        return Err(AccrualError::InvalidInput(format!(
            "step count out of range: {}",
            raw
        )));
    }
    Ok(raw as i64)
}

/// Convert a day's raw steps into earned units at `active_phase`'s rate.
///
/// Steps are clamped to `rules.max_daily_steps`; only completed blocks of
/// `rules.steps_per_unit` steps earn anything.
pub fn compute_daily_earnings(
    raw_steps: i64,
    active_phase: &PhaseDefinition,
    rules: &AccrualRules,
) -> Result<DailyEarnings, AccrualError> {
    if raw_steps < 0 {
        return Err(AccrualError::InvalidInput(format!(
            "step count must not be negative, got {}",
            raw_steps
        )));
    }

    let raw_steps = raw_steps as u64;
    let capped_steps = raw_steps.min(rules.max_daily_steps);
    let blocks = capped_steps / rules.steps_per_unit;

    Ok(DailyEarnings {
        units_earned: blocks * u64::from(active_phase.rate),
        capped_steps,
        steps_over_cap: raw_steps - capped_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PhaseTable;

    fn earnings(raw_steps: i64, phase_id: u8) -> DailyEarnings {
        let table = PhaseTable::default();
        compute_daily_earnings(
            raw_steps,
            table.require(phase_id).unwrap(),
            &AccrualRules::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_phase_one_ten_thousand_steps() {
        let result = earnings(10_000, 1);
        assert_eq!(result.units_earned, 400);
        assert_eq!(result.capped_steps, 10_000);
        assert_eq!(result.steps_over_cap, 0);
    }

    #[test]
    fn test_cap_applies_above_daily_maximum() {
        let result = earnings(15_000, 1);
        assert_eq!(result.units_earned, 480);
        assert_eq!(result.capped_steps, 12_000);
        assert_eq!(result.steps_over_cap, 3_000);
        assert_eq!(result.units_earned, earnings(12_000, 1).units_earned);
    }

    #[test]
    fn test_partial_block_earns_nothing() {
        assert_eq!(earnings(24, 1).units_earned, 0);
        assert_eq!(earnings(25, 1).units_earned, 1);
        assert_eq!(earnings(49, 1).units_earned, 1);
    }

    #[test]
    fn test_zero_steps_is_valid() {
        let result = earnings(0, 3);
        assert_eq!(result.units_earned, 0);
        assert_eq!(result.capped_steps, 0);
    }

    #[test]
    fn test_rate_scales_units() {
        assert_eq!(earnings(10_000, 2).units_earned, 800);
        assert_eq!(earnings(12_000, 9).units_earned, 4_800);
    }

    #[test]
    fn test_negative_steps_rejected() {
        let table = PhaseTable::default();
        let result = compute_daily_earnings(-1, table.first(), &AccrualRules::default());
        assert!(matches!(result, Err(AccrualError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_raw_steps() {
        assert_eq!(parse_raw_steps(0.0), Ok(0));
        assert_eq!(parse_raw_steps(12_345.0), Ok(12_345));
        assert!(parse_raw_steps(f64::NAN).is_err());
        assert!(parse_raw_steps(f64::INFINITY).is_err());
        assert!(parse_raw_steps(f64::NEG_INFINITY).is_err());
        assert!(parse_raw_steps(-5.0).is_err());
        assert!(parse_raw_steps(10.5).is_err());
        assert!(parse_raw_steps(1e300).is_err());
    }
}
