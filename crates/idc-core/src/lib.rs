//! Core — domain types and configuration for the idcheck harness.
//!
//! This crate holds the data model shared by the harness and CLI:
//! - Subjects (the test identities a run exercises) and their verdicts
//! - The run report with ordering and aggregate-count guarantees
//! - The identity header contract derived from an authenticated session
//! - TOML configuration loading with per-field defaults

pub mod config;
pub mod types;
