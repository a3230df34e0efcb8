// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# ecobot Service Layer

Owns the work-period state machine that every ledger write is tagged with.

```text
        initialize()                      close_period_and_reopen()
Uninitialized ──────────► Open ◄──────────────────────────────┐
      │                    │                                  │
      │ prior period       └────────► Closing ────────────────┘
      │ left open                      (totals, close, update,
      └──────► Closing ──► Open         create, baseline, counters)
```

The manager talks to the ledger through [`ecobot_ledger::RemoteLedger`], so any
implementation (HTTP, in-memory) can back it.
*/

pub mod lifecycle;
pub mod types;

pub use lifecycle::PeriodLifecycleManager;
pub use types::{PeriodError, PeriodPhase, PeriodResult, WasteCounters};
