//! Service layer containing the harvesting logic and side-effect helpers.
//!
//! ## Service map
//! - `decoder.rs` — raw MRU value → target path + file-time instant.
//! - `walker.rs` — lazy traversal of per-user Office MRU subtrees.
//! - `gate.rs` — macro-access gate state machine: evaluate/veto/revert.
//! - `recency.rs` — retention window + newest-first ordering.
//! - `macros.rs` — macro-bearing extension table + external extractor tool.
//! - `identity.rs` — SID → display-name resolution with raw fallback.
//! - `harvest.rs` — orchestrated run with guaranteed gate rollback.
//! - `config.rs` — config file + effective window computation.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod config;
pub mod decoder;
pub mod gate;
pub mod harvest;
pub mod identity;
pub mod macros;
pub mod output;
pub mod recency;
pub mod walker;
