//! Per-file media inspection
//!
//! This module handles:
//! - Deciding whether a path is a supported image (classify.rs)
//! - Resolving the year a photo was taken (year.rs)

pub mod classify;
pub mod year;
