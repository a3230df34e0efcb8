// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ecobot-observability
//!
//! Logging setup shared by every ecobot binary, with per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: File-based log rotation

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known ecobot crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "ecobot",
    "ecobot-structures",
    "ecobot-config",
    "ecobot-correlator",
    "ecobot-transports",
    "ecobot-ledger",
    "ecobot-services",
    "ecobot-agent",
];
