//! # PRISM Core
//!
//! Storage primitives shared by the shader graph and the particle buffers.
//!
//! ## Architecture Rules
//!
//! 1. **Indices, not pointers** - graph edges are `Handle`s into an `Arena`
//! 2. **Write once** - arena slots are defined exactly once and never mutated
//! 3. **Upload only what changed** - buffers track a `DirtyRange`

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod memory;
pub mod tracking;

pub use memory::{Arena, ArenaError, Handle};
pub use tracking::DirtyRange;
