//! Core proof-state engine for Vellum.
//!
//! This crate owns the mutable side of the system: the [`State`] store and
//! its invariants, taint propagation, job discovery, the thread-safe
//! [`SharedState`] handle agents act through, and snapshot persistence.
//!
//! ```text
//! agents ──▶ SharedState (RwLock) ──▶ State ──▶ taint::propagate_from
//!                 │                      │
//!                 └── find_jobs ◀────────┘
//! ```

mod error;
pub mod jobs;
pub mod persist;
mod shared;
mod state;
pub mod taint;

pub use error::{EntityKind, Relation, StateError};
pub use jobs::{Jobs, find_jobs};
pub use persist::{
    PersistError, load_snapshot, open_configured, save_snapshot, save_snapshot_with_options,
};
pub use shared::{SharedOptions, SharedState};
pub use state::{ResolvedContext, SNAPSHOT_VERSION, State, StateSnapshot};
pub use taint::{
    TaintChange, TaintReport, compute_taint, propagate, propagate_from, topological_order,
};
