//! State management module
//!
//! This module handles all index state, including:
//! - The year-grouped photo index and the persisted snapshot (data.rs)
//! - The lock-guarded index handed to scan workers (shared.rs)
//! - Saving, loading and validating the snapshot file (store.rs)

pub mod data;
pub mod shared;
pub mod store;
