// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Operator reopen trigger
//!
//! The collector is recharged between shifts; a `recharge` line on the control
//! input closes the running period and opens the next one.
//!
//! The control input is read on its own OS thread, never on the runtime's
//! blocking pool: a pending terminal read must not hold up runtime shutdown.

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use ecobot_services::PeriodLifecycleManager;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const CONTROL_LINE_CAPACITY: usize = 8;

/// Command understood on the control input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Recharge,
}

impl OperatorCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "recharge" => Some(OperatorCommand::Recharge),
            _ => None,
        }
    }
}

/// Forward lines of a blocking reader from a detached thread
///
/// The thread stops at end of input, on a read error, or once the receiver is
/// dropped and the next line arrives.
pub fn spawn_line_reader<R>(input: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CONTROL_LINE_CAPACITY);
    let spawned = thread::Builder::new()
        .name("ecobot-control-input".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("[PERIODS] Control input error: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        error!("[PERIODS] Could not start control input reader: {}", e);
    }
    rx
}

/// Handle commands until the line channel closes
pub fn spawn_recharge_listener(
    mut lines: mpsc::Receiver<String>,
    periods: Arc<PeriodLifecycleManager>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut reopened = 0;
        while let Some(line) = lines.recv().await {
            if line.trim().is_empty() {
                continue;
            }

            match OperatorCommand::parse(&line) {
                Some(OperatorCommand::Recharge) => {
                    info!("[PERIODS] Recharge requested, rotating period");
                    match periods.close_period_and_reopen().await {
                        Ok(period_id) => {
                            reopened += 1;
                            info!("[PERIODS] Now collecting into period {}", period_id);
                        }
                        Err(e) => error!("[PERIODS] Recharge rotation failed: {}", e),
                    }
                }
                None => debug!("[PERIODS] Ignoring control input '{}'", line.trim()),
            }
        }
        reopened
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecobot_ledger::{InMemoryLedger, LedgerOp, RetryPolicy};
    use std::io::{BufReader, Cursor, Read};
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    /// Reader that blocks like an idle terminal until its sender goes away
    struct IdleTerminal(std_mpsc::Receiver<()>);

    impl Read for IdleTerminal {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(OperatorCommand::parse("recharge"), Some(OperatorCommand::Recharge));
        assert_eq!(OperatorCommand::parse("  RECHARGE \r"), Some(OperatorCommand::Recharge));
        assert_eq!(OperatorCommand::parse("shutdown"), None);
    }

    #[tokio::test]
    async fn test_recharge_rotates_period() {
        let ledger = Arc::new(InMemoryLedger::new());
        let periods = Arc::new(PeriodLifecycleManager::new(ledger.clone(), RetryPolicy::none()));
        let first = periods.initialize().await.unwrap();
        periods.open_waste_counters().await.unwrap();

        let lines = spawn_line_reader(Cursor::new(b"hello\nrecharge\n\n".to_vec()));
        let reopened = spawn_recharge_listener(lines, periods.clone()).await.unwrap();

        assert_eq!(reopened, 1);
        assert_ne!(periods.current_period_id(), Some(first));
        assert_eq!(ledger.calls_of(LedgerOp::ClosePeriod).len(), 1);
    }

    #[test]
    fn test_idle_control_input_does_not_block_runtime_shutdown() {
        let (_keep_idle, idle) = std_mpsc::channel::<()>();
        let (done_tx, done_rx) = std_mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let ledger = Arc::new(InMemoryLedger::new());
                let periods = Arc::new(PeriodLifecycleManager::new(ledger, RetryPolicy::none()));
                let lines = spawn_line_reader(BufReader::new(IdleTerminal(idle)));
                let listener = spawn_recharge_listener(lines, periods);
                tokio::time::sleep(Duration::from_millis(20)).await;
                listener.abort();
            });
            drop(runtime);
            let _ = done_tx.send(());
        });

        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
