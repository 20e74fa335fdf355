//! Developer tooling: read-only scene inspection for hosts and debugging.
//!
//! # Invariants
//! - Inspection never mutates the scene or drains its event log.

mod inspector;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "tableau-tools v0.1.0"
}
