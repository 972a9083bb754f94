//! # Memory Management
//!
//! Index-addressed arenas. A value is referenced by a small copyable
//! [`Handle`] instead of a pointer, so cyclic references can be represented
//! (and detected) without reference counting.

mod arena;

pub use arena::{Arena, ArenaError, Handle};
