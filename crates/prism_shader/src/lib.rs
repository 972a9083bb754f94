//! # PRISM Shader
//!
//! Compose shaders from typed nodes, compile them to GLSL.
//!
//! ## Architecture Rules
//!
//! 1. **Factories are immutable** - a [`NodeFactory`] is shared, never edited
//! 2. **Instances are immutable** - rewiring means inserting new nodes
//! 3. **Types are checked at bind time** - the compiler re-checks forward
//!    references it could not see earlier
//! 4. **All or nothing** - a failed compile returns no source at all
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut graph = ShaderGraph::new();
//! let wave = graph.node(&nodes::sine_wave()).bind("frequency", 2.0_f32)?.insert()?;
//! let master = graph.node(&nodes::master()).bind("alpha", wave)?.insert()?;
//!
//! let shader = compile(&graph, master)?;
//! shader.update(1.0 / 60.0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod compiler;
pub mod description;
pub mod error;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod registry;
pub mod types;
pub mod uniforms;

pub use compiler::{compile, CompiledShader, Compiler, CompilerConfig, Injection};
pub use description::{BindingDescription, BuiltGraph, GraphDescription, NodeDescription};
pub use error::{GraphError, ShaderError, ShaderResult};
pub use graph::{Filter, NodeBuilder, ShaderGraph};
pub use node::{
    Binding, DefaultValue, InputDef, NodeDef, NodeFactory, NodeId, NodeInstance, NodeOutputs,
    OutputDef, OutputRef, Stage, StageCode, UniformDef, DEFAULT_OUTPUT,
};
pub use registry::NodeRegistry;
pub use types::{Value, ValueType};
pub use uniforms::{Uniform, UniformTable, UniformUpdate};
