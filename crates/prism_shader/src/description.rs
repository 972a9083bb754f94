//! # Graph Descriptions
//!
//! Graphs written as TOML instead of code:
//!
//! ```toml
//! root = "out"
//!
//! [[nodes]]
//! key = "wave"
//! factory = "sine_wave"
//! inputs.frequency = { type = "float", value = 2.0 }
//!
//! [[nodes]]
//! key = "out"
//! factory = "master"
//! inputs.alpha = { type = "node", node = "wave" }
//! inputs.diffuseColor = { type = "color", value = "#8cf" }
//! ```
//!
//! Keys may reference nodes declared later. Every key is reserved before any
//! node is defined, so forward references resolve and cycles surface when
//! the graph is compiled.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use prism_shared::{load_toml, Color, ConfigError};
use serde::Deserialize;

use crate::compiler::{CompiledShader, Compiler};
use crate::error::{GraphError, ShaderError, ShaderResult};
use crate::graph::ShaderGraph;
use crate::node::{Binding, NodeId, NodeOutputs, DEFAULT_OUTPUT};
use crate::registry::NodeRegistry;
use crate::types::Value;

/// A whole graph.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDescription {
    /// Key of the root node.
    pub root: String,
    /// Node declarations.
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
}

/// One node declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDescription {
    /// Unique key within the description.
    pub key: String,
    /// Registry key of the factory.
    pub factory: String,
    /// Input bindings by input name.
    #[serde(default)]
    pub inputs: BTreeMap<String, BindingDescription>,
}

/// One input binding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BindingDescription {
    /// Output of another node.
    Node {
        /// Key of the source node.
        node: String,
        /// Output name; `value` when omitted.
        #[serde(default = "default_output")]
        output: String,
    },
    /// Float literal.
    Float {
        /// Value.
        value: f32,
    },
    /// `vec2` literal.
    Vec2 {
        /// Components.
        value: [f32; 2],
    },
    /// `vec3` literal.
    Vec3 {
        /// Components.
        value: [f32; 3],
    },
    /// `vec4` literal.
    Vec4 {
        /// Components.
        value: [f32; 4],
    },
    /// Color from a `#rgb` / `#rrggbb` string.
    Color {
        /// Hex string.
        value: String,
    },
    /// Raw GLSL.
    Expr {
        /// Source.
        value: String,
    },
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

/// A description resolved into a graph.
#[derive(Debug)]
pub struct BuiltGraph {
    /// The nodes.
    pub graph: ShaderGraph,
    /// Id of the root node.
    pub root: NodeId,
    /// Id of every declared key.
    pub ids: HashMap<String, NodeId>,
}

impl BuiltGraph {
    /// Compiles from the root with the default compiler.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile`].
    pub fn compile(&self) -> ShaderResult<CompiledShader> {
        Compiler::new().compile(&self.graph, self.root)
    }
}

impl GraphDescription {
    /// Parses a TOML description.
    ///
    /// # Errors
    ///
    /// [`ShaderError::Config`] on malformed input.
    pub fn from_toml_str(source: &str) -> ShaderResult<Self> {
        Ok(prism_shared::from_toml_str(source)?)
    }

    /// Loads a TOML description file.
    ///
    /// # Errors
    ///
    /// [`ShaderError::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> ShaderResult<Self> {
        Ok(load_toml(path)?)
    }

    /// Instantiates every declared node through `registry`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DuplicateKey`] / [`GraphError::UnknownKey`] for bad keys
    /// - [`ShaderError::UnknownFactory`] for unregistered factories
    /// - [`ShaderError::Config`] for unparsable color strings
    /// - any binding error from [`NodeBuilder::bind`](crate::NodeBuilder::bind)
    pub fn build(&self, registry: &NodeRegistry) -> ShaderResult<BuiltGraph> {
        let mut graph = ShaderGraph::new();
        let mut ids = HashMap::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let id = graph.reserve();
            if ids.insert(node.key.clone(), id).is_some() {
                return Err(GraphError::DuplicateKey(node.key.clone()).into());
            }
        }

        for node in &self.nodes {
            let factory = registry
                .get(&node.factory)
                .ok_or_else(|| ShaderError::UnknownFactory(node.factory.clone()))?;

            let mut builder = graph.node(factory);
            for (input, binding) in &node.inputs {
                builder = builder.bind(input, binding.resolve(&ids)?)?;
            }
            builder.define(ids[&node.key])?;
        }

        let root = *ids
            .get(&self.root)
            .ok_or_else(|| GraphError::UnknownKey(self.root.clone()))?;

        Ok(BuiltGraph { graph, root, ids })
    }
}

impl BindingDescription {
    fn resolve(&self, ids: &HashMap<String, NodeId>) -> ShaderResult<Binding> {
        Ok(match self {
            Self::Node { node, output } => {
                let id = ids
                    .get(node)
                    .ok_or_else(|| GraphError::UnknownKey(node.clone()))?;
                Binding::Output(id.out(output))
            }
            Self::Float { value } => Binding::Literal(Value::Float(*value)),
            Self::Vec2 { value } => Binding::Literal(Value::Vec2(*value)),
            Self::Vec3 { value } => Binding::Literal(Value::Vec3(*value)),
            Self::Vec4 { value } => Binding::Literal(Value::Vec4(*value)),
            Self::Color { value } => {
                let color = Color::from_hex(value).ok_or_else(|| {
                    ConfigError::Invalid(format!("not a hex color: {value}"))
                })?;
                Binding::Literal(color.into())
            }
            Self::Expr { value } => Binding::Expr(value.clone()),
        })
    }
}
