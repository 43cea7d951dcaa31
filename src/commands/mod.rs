//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `runtime.rs` — harvest/policy-status/decode handlers.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate the harvesting logic to `services/*`.
//! - Keep behavior and output schema stable.

pub mod runtime;

pub use runtime::{handle_decode, handle_harvest, handle_policy_status};
