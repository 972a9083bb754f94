//! # Node Definitions
//!
//! A [`NodeDef`] describes a reusable shader fragment: typed inputs, typed
//! outputs, per-stage GLSL and the uniforms it needs. [`NodeDef::build`]
//! freezes it into a cheap-to-clone [`NodeFactory`]; a graph instantiates a
//! factory any number of times.
//!
//! Inside stage code, inputs are visible as `in_<name>` and outputs as
//! `out_<name>`. Bodies assign to `out_*`; the compiler copies them into
//! per-instance globals afterwards.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use prism_core::Handle;
use prism_shared::{Color, Vec3};

use crate::types::{Value, ValueType};
use crate::uniforms::UniformUpdate;

/// Handle of a node instance inside a [`ShaderGraph`](crate::ShaderGraph).
pub type NodeId = Handle<NodeInstance>;

/// Name of the output a bare [`NodeId`] binding refers to.
pub const DEFAULT_OUTPUT: &str = "value";

// =============================================================================
// BINDINGS
// =============================================================================

/// Reference to one output of one node instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputRef {
    /// Source node.
    pub node: NodeId,
    /// Output name on the source node.
    pub output: String,
}

/// Named-output access on node ids: `id.out("x")`.
pub trait NodeOutputs {
    /// Reference to the named output of this node.
    fn out(self, output: &str) -> OutputRef;
}

impl NodeOutputs for NodeId {
    fn out(self, output: &str) -> OutputRef {
        OutputRef {
            node: self,
            output: output.to_string(),
        }
    }
}

/// What feeds a node input.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A literal, rendered inline.
    Literal(Value),
    /// Raw GLSL, inserted verbatim.
    Expr(String),
    /// Another node's output. Creates a graph edge.
    Output(OutputRef),
}

impl Binding {
    /// Raw GLSL expression binding.
    pub fn expr(source: impl Into<String>) -> Self {
        Self::Expr(source.into())
    }
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<f32> for Binding {
    fn from(value: f32) -> Self {
        Self::Literal(Value::Float(value))
    }
}

impl From<[f32; 3]> for Binding {
    fn from(value: [f32; 3]) -> Self {
        Self::Literal(Value::Vec3(value))
    }
}

impl From<Vec3> for Binding {
    fn from(value: Vec3) -> Self {
        Self::Literal(value.into())
    }
}

impl From<Color> for Binding {
    fn from(value: Color) -> Self {
        Self::Literal(value.into())
    }
}

impl From<NodeId> for Binding {
    fn from(node: NodeId) -> Self {
        Self::Output(node.out(DEFAULT_OUTPUT))
    }
}

impl From<OutputRef> for Binding {
    fn from(output: OutputRef) -> Self {
        Self::Output(output)
    }
}

// =============================================================================
// DEFINITIONS
// =============================================================================

/// Default used when an input is left unbound.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// Literal value.
    Literal(Value),
    /// Raw GLSL expression.
    Expr(String),
    /// A fresh instance of this factory, bound through its `value` output.
    Node(NodeFactory),
}

impl DefaultValue {
    /// Raw GLSL expression default.
    pub fn expr(source: impl Into<String>) -> Self {
        Self::Expr(source.into())
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<f32> for DefaultValue {
    fn from(value: f32) -> Self {
        Self::Literal(Value::Float(value))
    }
}

impl From<[f32; 3]> for DefaultValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Literal(Value::Vec3(value))
    }
}

impl From<Color> for DefaultValue {
    fn from(value: Color) -> Self {
        Self::Literal(value.into())
    }
}

impl From<NodeFactory> for DefaultValue {
    fn from(factory: NodeFactory) -> Self {
        Self::Node(factory)
    }
}

/// Typed input slot.
#[derive(Debug, Clone)]
pub struct InputDef {
    /// Name, visible in stage code as `in_<name>`.
    pub name: String,
    /// Declared type.
    pub ty: ValueType,
    /// `None` means the input is required.
    pub default: Option<DefaultValue>,
}

/// Typed output slot.
#[derive(Debug, Clone)]
pub struct OutputDef {
    /// Name, visible in stage code as `out_<name>`.
    pub name: String,
    /// Declared type. Fixed for the lifetime of the factory.
    pub ty: ValueType,
    /// Initial expression; the zero value of `ty` when absent.
    pub expr: Option<String>,
}

/// GLSL for one shader stage.
#[derive(Debug, Clone, Default)]
pub struct StageCode {
    /// Emitted once per shader at file scope, deduplicated by text.
    pub header: Option<String>,
    /// Emitted inside the node's block after outputs are initialised.
    pub body: Option<String>,
}

/// Uniform a node needs.
#[derive(Debug, Clone)]
pub struct UniformDef {
    /// GLSL name, shared by every node declaring it.
    pub name: String,
    /// Initial value; also fixes the type.
    pub initial: Value,
    /// Per-frame update rule.
    pub update: UniformUpdate,
}

/// Shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

/// Node definition under construction.
///
/// # Example
///
/// ```rust,ignore
/// let scale = NodeDef::new("Scale")
///     .required_input("a", ValueType::Vec3)
///     .input("factor", ValueType::Float, 1.0_f32)
///     .output("value", ValueType::Vec3, "in_a * in_factor")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct NodeDef {
    name: String,
    inputs: Vec<InputDef>,
    outputs: Vec<OutputDef>,
    vertex: StageCode,
    fragment: StageCode,
    uniforms: Vec<UniformDef>,
    varying: bool,
}

impl NodeDef {
    /// Starts an empty definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            vertex: StageCode::default(),
            fragment: StageCode::default(),
            uniforms: Vec::new(),
            varying: false,
        }
    }

    /// Adds an input with a default used when it is left unbound.
    #[must_use]
    pub fn input(mut self, name: &str, ty: ValueType, default: impl Into<DefaultValue>) -> Self {
        self.inputs.push(InputDef {
            name: name.to_string(),
            ty,
            default: Some(default.into()),
        });
        self
    }

    /// Adds an input that must be bound before insertion.
    #[must_use]
    pub fn required_input(mut self, name: &str, ty: ValueType) -> Self {
        self.inputs.push(InputDef {
            name: name.to_string(),
            ty,
            default: None,
        });
        self
    }

    /// Adds an output initialised from `expr`.
    #[must_use]
    pub fn output(mut self, name: &str, ty: ValueType, expr: impl Into<String>) -> Self {
        self.outputs.push(OutputDef {
            name: name.to_string(),
            ty,
            expr: Some(expr.into()),
        });
        self
    }

    /// Adds an output initialised to zero, for bodies that assign it.
    #[must_use]
    pub fn declare_output(mut self, name: &str, ty: ValueType) -> Self {
        self.outputs.push(OutputDef {
            name: name.to_string(),
            ty,
            expr: None,
        });
        self
    }

    /// Sets the vertex stage body.
    #[must_use]
    pub fn vertex_body(mut self, body: impl Into<String>) -> Self {
        self.vertex.body = Some(body.into());
        self
    }

    /// Sets the fragment stage body.
    #[must_use]
    pub fn fragment_body(mut self, body: impl Into<String>) -> Self {
        self.fragment.body = Some(body.into());
        self
    }

    /// Sets the vertex stage header.
    #[must_use]
    pub fn vertex_header(mut self, header: impl Into<String>) -> Self {
        self.vertex.header = Some(header.into());
        self
    }

    /// Sets the fragment stage header.
    #[must_use]
    pub fn fragment_header(mut self, header: impl Into<String>) -> Self {
        self.fragment.header = Some(header.into());
        self
    }

    /// Declares a uniform.
    #[must_use]
    pub fn uniform(mut self, name: &str, initial: impl Into<Value>, update: UniformUpdate) -> Self {
        self.uniforms.push(UniformDef {
            name: name.to_string(),
            initial: initial.into(),
            update,
        });
        self
    }

    /// Computes outputs in the vertex stage and passes them to the fragment
    /// stage as varyings.
    #[must_use]
    pub fn varying(mut self) -> Self {
        self.varying = true;
        self
    }

    /// Freezes the definition.
    #[must_use]
    pub fn build(self) -> NodeFactory {
        NodeFactory(Arc::new(self))
    }

    /// Definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inputs in declaration order.
    #[must_use]
    pub fn inputs(&self) -> &[InputDef] {
        &self.inputs
    }

    /// Outputs in declaration order.
    #[must_use]
    pub fn outputs(&self) -> &[OutputDef] {
        &self.outputs
    }

    /// Declared uniforms.
    #[must_use]
    pub fn uniforms(&self) -> &[UniformDef] {
        &self.uniforms
    }

    /// Whether outputs travel from vertex to fragment as varyings.
    #[must_use]
    pub const fn is_varying(&self) -> bool {
        self.varying
    }

    /// Code for one stage.
    #[must_use]
    pub const fn stage(&self, stage: Stage) -> &StageCode {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Fragment => &self.fragment,
        }
    }

    /// Input position and definition by name.
    #[must_use]
    pub fn find_input(&self, name: &str) -> Option<(usize, &InputDef)> {
        self.inputs
            .iter()
            .enumerate()
            .find(|(_, input)| input.name == name)
    }

    /// Output definition by name.
    #[must_use]
    pub fn find_output(&self, name: &str) -> Option<&OutputDef> {
        self.outputs.iter().find(|output| output.name == name)
    }
}

/// Shared, immutable node definition.
#[derive(Clone)]
pub struct NodeFactory(Arc<NodeDef>);

impl NodeFactory {
    /// Whether both factories are the same definition.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for NodeFactory {
    type Target = NodeDef;

    fn deref(&self) -> &NodeDef {
        &self.0
    }
}

impl fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeFactory({})", self.0.name)
    }
}

impl From<NodeDef> for NodeFactory {
    fn from(def: NodeDef) -> Self {
        def.build()
    }
}

// =============================================================================
// INSTANCES
// =============================================================================

/// A factory plus one resolved binding per input.
///
/// Instances are immutable once inside a graph.
#[derive(Debug, Clone)]
pub struct NodeInstance {
    factory: NodeFactory,
    bindings: Vec<Binding>,
}

impl NodeInstance {
    pub(crate) fn new(factory: NodeFactory, bindings: Vec<Binding>) -> Self {
        debug_assert_eq!(factory.inputs().len(), bindings.len());
        Self { factory, bindings }
    }

    /// The definition this instance was built from.
    #[must_use]
    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    /// Definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.factory.name()
    }

    /// Inputs paired with their bindings, in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = (&InputDef, &Binding)> {
        self.factory.inputs().iter().zip(&self.bindings)
    }

    /// Binding of the named input.
    #[must_use]
    pub fn binding(&self, input: &str) -> Option<&Binding> {
        let (index, _) = self.factory.find_input(input)?;
        self.bindings.get(index)
    }
}
