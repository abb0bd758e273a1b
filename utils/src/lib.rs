//! Shared infrastructure utilities for Vellum.
//!
//! Kept out of the domain-pure `vellum-types` crate because it touches the
//! filesystem:
//!
//! - **`atomic_write`**: Crash-safe snapshot persistence (temp + rename)

pub mod atomic_write;

pub use atomic_write::{
    Recovery, SyncPolicy, WriteOptions, recover_backup, write_atomic, write_atomic_with_options,
};
