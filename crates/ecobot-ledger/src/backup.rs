// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Startup backup trigger
//!
//! Best-effort: the outcome is only logged, a failed backup never blocks startup.

use crate::traits::RemoteLedger;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// The service accepted the request
    Requested,
    /// No network, nothing was sent
    Unreachable,
    /// The service refused or the call failed
    Failed(String),
}

/// True when a TCP connection to `addr` opens within `timeout`
pub async fn probe_connectivity(addr: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("[LEDGER] Connectivity probe to {} failed: {}", addr, e);
            false
        }
        Err(_) => {
            debug!("[LEDGER] Connectivity probe to {} timed out after {:?}", addr, timeout);
            false
        }
    }
}

/// Probe the network, then ask the ledger for a backup
pub async fn run_startup_backup(
    ledger: &dyn RemoteLedger,
    probe_addr: &str,
    probe_timeout: Duration,
) -> BackupOutcome {
    if !probe_connectivity(probe_addr, probe_timeout).await {
        warn!("[LEDGER] No connectivity ({}), skipping backup", probe_addr);
        return BackupOutcome::Unreachable;
    }

    match ledger.request_backup().await {
        Ok(()) => {
            info!("[LEDGER] Backup requested");
            BackupOutcome::Requested
        }
        Err(e) => {
            warn!("[LEDGER] Backup request failed: {}", e);
            BackupOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::memory::{InMemoryLedger, LedgerOp};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        assert!(probe_connectivity(&addr, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_probe_closed_port() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };
        assert!(!probe_connectivity(&addr, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_backup_requested_when_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let ledger = InMemoryLedger::new();

        let outcome = run_startup_backup(&ledger, &addr, Duration::from_secs(1)).await;
        assert_eq!(outcome, BackupOutcome::Requested);
        assert_eq!(ledger.calls_of(LedgerOp::RequestBackup).len(), 1);
    }

    #[tokio::test]
    async fn test_backup_skipped_without_network() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let ledger = InMemoryLedger::new();

        let outcome = run_startup_backup(&ledger, &addr, Duration::from_secs(1)).await;
        assert_eq!(outcome, BackupOutcome::Unreachable);
        assert_eq!(ledger.attempts(LedgerOp::RequestBackup), 0);
    }

    #[tokio::test]
    async fn test_backup_failure_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let ledger = InMemoryLedger::new();
        ledger.fail_next(
            LedgerOp::RequestBackup,
            LedgerError::Status {
                status: 503,
                body: "busy".to_string(),
            },
        );

        let outcome = run_startup_backup(&ledger, &addr, Duration::from_secs(1)).await;
        assert!(matches!(outcome, BackupOutcome::Failed(_)));
    }
}
