//! Harness — identity propagation verification for the idcheck toolkit.
//!
//! This crate coordinates the per-subject verification pipeline against a
//! running chat deployment:
//! - Directory seam for resolving a subject's canonical record ([`directory`])
//! - Session acquisition and introspection against the primary service ([`auth`])
//! - The pure expected-vs-actual role check and header-contract derivation ([`verify`])
//! - The fault-isolating run loop and aggregate report ([`orchestrator`])

pub mod auth;
pub mod directory;
pub mod orchestrator;
pub mod verify;
