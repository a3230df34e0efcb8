// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ecobot-ledger
//!
//! Client side of the remote accounting service that owns work periods,
//! readings and waste collection counters.
//!
//! - [`RemoteLedger`]: async trait over every ledger call
//! - [`HttpLedgerClient`]: REST implementation (reqwest)
//! - [`InMemoryLedger`]: in-process implementation for offline runs and tests
//! - [`retry_with_backoff`]: bounded retries for transient failures
//! - [`run_startup_backup`]: connectivity probe plus backup request

pub mod backup;
pub mod error;
pub mod http;
pub mod memory;
pub mod retry;
pub mod traits;
mod wire;

pub use backup::{probe_connectivity, run_startup_backup, BackupOutcome};
pub use error::{LedgerError, LedgerResult};
pub use http::HttpLedgerClient;
pub use memory::{InMemoryLedger, LedgerCall, LedgerOp};
pub use retry::{retry_with_backoff, BackoffSchedule, RetryPolicy};
pub use traits::RemoteLedger;
