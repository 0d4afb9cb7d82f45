//! Orchestrator - The turn driver
//!
//! One turn runs `Planning → Validating → (AwaitingApproval)? → Executing →
//! Summarizing`, and every exit produces exactly one reply.
//!
//! # Module Structure
//!
//! - `config`: `OrchestratorConfig`
//! - `types`: `TurnStatus`, `TurnOutcome`
//! - `core`: the `Orchestrator` struct and its builder methods
//! - `process`: the turn state machine
//! - `helpers`: audit, history and reply helpers
//! - `summary`: reply text for executed actions

mod config;
mod core;
mod helpers;
mod process;
mod summary;
mod types;

#[cfg(test)]
mod tests;

pub use config::OrchestratorConfig;
pub use self::core::Orchestrator;
pub use types::{TurnOutcome, TurnStatus};
