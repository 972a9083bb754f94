//! # Change Tracking
//!
//! Ranges of modified buffer slots, merged until the consumer acknowledges
//! an upload.

mod dirty;

pub use dirty::DirtyRange;
