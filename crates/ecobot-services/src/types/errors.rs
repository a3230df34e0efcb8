// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Period lifecycle error types.
*/

use ecobot_ledger::LedgerError;
use thiserror::Error;

use super::PeriodPhase;

/// Errors surfaced by the period lifecycle manager
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PeriodError {
    /// Operation needs an open period but the manager is elsewhere
    #[error("Invalid state: {operation} requires an open period (phase: {phase})")]
    InvalidState {
        operation: &'static str,
        phase: PeriodPhase,
    },

    /// `initialize` was already run
    #[error("Already initialized (phase: {0})")]
    AlreadyInitialized(PeriodPhase),

    /// Disposal recorded before waste counters were opened
    #[error("Waste counters are not open")]
    CountersNotOpen,

    /// A ledger call failed (after retries, where they apply)
    #[error("Ledger call '{operation}' failed: {source}")]
    Ledger {
        operation: &'static str,
        #[source]
        source: LedgerError,
    },
}

impl PeriodError {
    pub(crate) fn ledger(operation: &'static str) -> impl FnOnce(LedgerError) -> Self {
        move |source| PeriodError::Ledger { operation, source }
    }
}

/// Result type for lifecycle operations
pub type PeriodResult<T> = Result<T, PeriodError>;
