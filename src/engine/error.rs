// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Errors raised by the accrual engine.

/// Accrual engine errors.
///
/// A missed phase deadline is deliberately absent here: it is reported as
/// [`PhaseDeadlineExceeded`](super::PhaseDeadlineExceeded) alongside a
/// successful result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccrualError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown phase: {0}")]
    UnknownPhase(u8),

    #[error("Invalid phase table: {0}")]
    InvalidPhaseTable(String),

    #[error("Earning for {date} is already {status}")]
    EarningClosed { date: String, status: String },

    #[error("Nothing to redeem for {0}")]
    NothingToRedeem(String),
}
