//! Error types for graph construction and compilation.

use prism_core::ArenaError;
use prism_shared::ConfigError;
use thiserror::Error;

use crate::node::NodeId;
use crate::types::ValueType;

/// Errors raised while building or compiling a shader graph.
#[derive(Error, Debug)]
pub enum ShaderError {
    /// A bound value or output cannot feed the input's declared type.
    #[error("type mismatch on {node}.{input}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Node definition name.
        node: String,
        /// Input name.
        input: String,
        /// Declared input type.
        expected: ValueType,
        /// Type of the offered binding.
        found: ValueType,
    },

    /// The node definition has no input with this name.
    #[error("node {node} has no input named {input}")]
    UnknownInput {
        /// Node definition name.
        node: String,
        /// Requested input name.
        input: String,
    },

    /// A required input was never bound.
    #[error("required input {node}.{input} is not bound")]
    UnboundInput {
        /// Node definition name.
        node: String,
        /// Input name.
        input: String,
    },

    /// A graph description names a factory the registry does not know.
    #[error("unknown node factory: {0}")]
    UnknownFactory(String),

    /// Loading a graph description or compiler config failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Structural problem in the graph.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Structural graph errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The nodes reachable from the root contain a cycle.
    #[error("cycle detected: {}", path.join(" -> "))]
    Cycle {
        /// Nodes along the cycle, first node repeated at the end.
        path: Vec<String>,
    },

    /// A reference names an output the node does not declare.
    #[error("node {node} has no output named {output}")]
    MissingOutput {
        /// Node definition name.
        node: String,
        /// Requested output name.
        output: String,
    },

    /// A reserved node was referenced but never defined.
    #[error("node {0} was reserved but never defined")]
    UndefinedNode(NodeId),

    /// The id does not belong to this graph.
    #[error("node {0} does not exist in this graph")]
    UnknownNode(NodeId),

    /// Two nodes declare the same uniform with different types.
    #[error("uniform {name} declared as {first} and as {second}")]
    ConflictingUniform {
        /// Uniform name.
        name: String,
        /// Type of the first declaration.
        first: ValueType,
        /// Type of the conflicting declaration.
        second: ValueType,
    },

    /// A graph description references a key it never declares.
    #[error("unknown node key: {0}")]
    UnknownKey(String),

    /// A graph description declares the same key twice.
    #[error("duplicate node key: {0}")]
    DuplicateKey(String),

    /// Arena slot misuse (defining a node twice, foreign ids).
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

impl From<ArenaError> for ShaderError {
    fn from(err: ArenaError) -> Self {
        Self::Graph(GraphError::Arena(err))
    }
}

/// Result type for shader operations.
pub type ShaderResult<T> = Result<T, ShaderError>;
