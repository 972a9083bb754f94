//! # PRISM Shared
//!
//! Common types used by both the shader compiler and the particle system.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on a GPU or window crate. The math types are
//! `Pod` so they can be handed to any renderer as raw bytes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod math;

pub use config::{from_toml_str, load_toml, ConfigError, ConfigResult};
pub use constants::{DEFAULT_MAX_PARTICLES, DEFAULT_SAFETY_SIZE, MATRIX_ITEM_SIZE, TIME_UNIFORM};
pub use math::{Color, Mat4, Quaternion, Transform, Vec2, Vec3, Vec4};
