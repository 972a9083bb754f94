//! # Shader Graph
//!
//! An arena of immutable node instances. Edges are [`OutputRef`]s stored in
//! the consumer's bindings, so the graph needs no separate adjacency list.
//!
//! ## Forward references
//!
//! [`ShaderGraph::reserve`] hands out an id before its node exists. This is
//! how declarative descriptions are loaded and the only way a cycle can enter
//! the arena; cycles are reported when the graph is compiled.

use prism_core::{Arena, ArenaError};

use crate::error::{GraphError, ShaderError, ShaderResult};
use crate::node::{
    Binding, DefaultValue, InputDef, NodeFactory, NodeId, NodeInstance, OutputRef, DEFAULT_OUTPUT,
};
use crate::nodes;
use crate::types::ValueType;

/// Arena of node instances.
#[derive(Debug, Default)]
pub struct ShaderGraph {
    nodes: Arena<NodeInstance>,
}

impl ShaderGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new instance of `factory`.
    pub fn node(&mut self, factory: &NodeFactory) -> NodeBuilder<'_> {
        NodeBuilder {
            graph: self,
            factory: factory.clone(),
            bindings: vec![None; factory.inputs().len()],
        }
    }

    /// Reserves an id to be filled later with [`NodeBuilder::define`].
    pub fn reserve(&mut self) -> NodeId {
        self.nodes.reserve()
    }

    /// The instance behind an id, if it is defined.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(id)
    }

    /// Whether the id was issued by this graph.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Number of ids issued, defined or reserved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids reserved but not yet defined.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.nodes.reserved_count()
    }

    /// Defined instances in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeInstance)> {
        self.nodes.iter()
    }

    /// Type of a referenced output.
    ///
    /// `Ok(None)` when the node is reserved but not yet defined.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownNode`] for foreign ids and
    /// [`GraphError::MissingOutput`] when the output is not declared.
    pub fn output_type(&self, output: &OutputRef) -> Result<Option<ValueType>, GraphError> {
        if !self.nodes.contains(output.node) {
            return Err(GraphError::UnknownNode(output.node));
        }
        let Some(node) = self.nodes.get(output.node) else {
            return Ok(None);
        };
        node.factory()
            .find_output(&output.output)
            .map(|def| Some(def.ty))
            .ok_or_else(|| GraphError::MissingOutput {
                node: node.name().to_string(),
                output: output.output.clone(),
            })
    }

    /// Builds a processing stack.
    ///
    /// A pass-through node named `name` takes `base`; each filter is then
    /// inserted with its `a` input bound to the previous node. Returns the
    /// last node, whose `value` output carries the stacked result.
    ///
    /// # Errors
    ///
    /// [`GraphError::MissingOutput`] when a filter has no `value` output,
    /// [`ShaderError::TypeMismatch`] when that output or `base` does not fit
    /// `ty`, plus any error from binding the filter's own inputs.
    pub fn stack(
        &mut self,
        ty: ValueType,
        name: &str,
        base: impl Into<Binding>,
        filters: impl IntoIterator<Item = Filter>,
    ) -> ShaderResult<NodeId> {
        let head = self.node(&nodes::pass_through(name, ty)).bind("a", base)?.insert()?;

        filters.into_iter().try_fold(head, |previous, filter| {
            let output = filter.factory.find_output(DEFAULT_OUTPUT).ok_or_else(|| {
                GraphError::MissingOutput {
                    node: filter.factory.name().to_string(),
                    output: DEFAULT_OUTPUT.to_string(),
                }
            })?;
            if !ty.accepts(output.ty) {
                return Err(ShaderError::TypeMismatch {
                    node: filter.factory.name().to_string(),
                    input: DEFAULT_OUTPUT.to_string(),
                    expected: ty,
                    found: output.ty,
                });
            }

            let mut builder = self.node(&filter.factory).bind("a", previous)?;
            for (input, binding) in filter.bindings {
                builder = builder.bind(&input, binding)?;
            }
            builder.insert()
        })
    }
}

/// A factory with some inputs already bound, for [`ShaderGraph::stack`].
#[derive(Debug, Clone)]
pub struct Filter {
    factory: NodeFactory,
    bindings: Vec<(String, Binding)>,
}

impl Filter {
    /// Filter with no extra bindings.
    #[must_use]
    pub fn new(factory: &NodeFactory) -> Self {
        Self {
            factory: factory.clone(),
            bindings: Vec::new(),
        }
    }

    /// Binds one more input.
    #[must_use]
    pub fn with(mut self, input: &str, binding: impl Into<Binding>) -> Self {
        self.bindings.push((input.to_string(), binding.into()));
        self
    }
}

/// In-progress node instance.
///
/// Bindings are checked as they are made; defaults are filled in when the
/// node is inserted.
#[must_use = "a node builder does nothing until inserted"]
pub struct NodeBuilder<'g> {
    graph: &'g mut ShaderGraph,
    factory: NodeFactory,
    bindings: Vec<Option<Binding>>,
}

impl<'g> NodeBuilder<'g> {
    /// Binds an input.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::UnknownInput`] if the factory has no such input
    /// - [`ShaderError::TypeMismatch`] if the literal cannot be coerced or
    ///   the referenced output has an incompatible type
    /// - [`GraphError::MissingOutput`] / [`GraphError::UnknownNode`] for bad
    ///   references to nodes that already exist
    pub fn bind(mut self, input: &str, binding: impl Into<Binding>) -> ShaderResult<Self> {
        let (index, def) = self
            .factory
            .find_input(input)
            .ok_or_else(|| ShaderError::UnknownInput {
                node: self.factory.name().to_string(),
                input: input.to_string(),
            })?;
        let expected = def.ty;

        let binding = match binding.into() {
            Binding::Literal(value) => {
                let coerced = value.coerce_to(expected).ok_or_else(|| ShaderError::TypeMismatch {
                    node: self.factory.name().to_string(),
                    input: input.to_string(),
                    expected,
                    found: value.value_type(),
                })?;
                Binding::Literal(coerced)
            }
            Binding::Output(output) => {
                check_output(self.graph, &self.factory, input, expected, &output)?;
                Binding::Output(output)
            }
            expr @ Binding::Expr(_) => expr,
        };

        self.bindings[index] = Some(binding);
        Ok(self)
    }

    /// Appends the node to the graph.
    ///
    /// # Errors
    ///
    /// [`ShaderError::UnboundInput`] if a required input is unbound, or any
    /// error from instantiating a default.
    pub fn insert(self) -> ShaderResult<NodeId> {
        let (graph, instance) = self.resolve()?;
        Ok(graph.nodes.insert(instance))
    }

    /// Fills a reserved id with this node.
    ///
    /// # Errors
    ///
    /// As [`insert`](Self::insert), plus [`GraphError::Arena`] if the id is
    /// foreign or already defined.
    pub fn define(self, id: NodeId) -> ShaderResult<NodeId> {
        if !self.graph.nodes.contains(id) {
            return Err(ArenaError::UnknownHandle(id.index()).into());
        }
        if self.graph.nodes.is_defined(id) {
            return Err(ArenaError::AlreadyDefined(id.index()).into());
        }
        let (graph, instance) = self.resolve()?;
        graph.nodes.define(id, instance)?;
        Ok(id)
    }

    fn resolve(self) -> ShaderResult<(&'g mut ShaderGraph, NodeInstance)> {
        let Self {
            graph,
            factory,
            bindings,
        } = self;

        // Default nodes are only inserted once every input is known to resolve.
        for (def, binding) in factory.inputs().iter().zip(&bindings) {
            if binding.is_none() {
                check_unbound(&factory, def)?;
            }
        }

        let mut resolved = Vec::with_capacity(bindings.len());
        for (def, binding) in factory.inputs().iter().zip(bindings) {
            let binding = match (binding, &def.default) {
                (Some(binding), _) => binding,
                (None, None) => {
                    return Err(ShaderError::UnboundInput {
                        node: factory.name().to_string(),
                        input: def.name.clone(),
                    })
                }
                (None, Some(DefaultValue::Literal(value))) => {
                    let coerced = value.coerce_to(def.ty).ok_or_else(|| ShaderError::TypeMismatch {
                        node: factory.name().to_string(),
                        input: def.name.clone(),
                        expected: def.ty,
                        found: value.value_type(),
                    })?;
                    Binding::Literal(coerced)
                }
                (None, Some(DefaultValue::Expr(expr))) => Binding::Expr(expr.clone()),
                (None, Some(DefaultValue::Node(default))) => {
                    let id = graph.node(default).insert()?;
                    let output = OutputRef {
                        node: id,
                        output: DEFAULT_OUTPUT.to_string(),
                    };
                    check_output(graph, &factory, &def.name, def.ty, &output)?;
                    Binding::Output(output)
                }
            };
            resolved.push(binding);
        }

        Ok((graph, NodeInstance::new(factory, resolved)))
    }
}

/// Checks that an unbound input can be filled from its default, recursing
/// into the inputs of default nodes.
fn check_unbound(factory: &NodeFactory, def: &InputDef) -> ShaderResult<()> {
    match &def.default {
        None => Err(ShaderError::UnboundInput {
            node: factory.name().to_string(),
            input: def.name.clone(),
        }),
        Some(DefaultValue::Literal(value)) => match value.coerce_to(def.ty) {
            Some(_) => Ok(()),
            None => Err(ShaderError::TypeMismatch {
                node: factory.name().to_string(),
                input: def.name.clone(),
                expected: def.ty,
                found: value.value_type(),
            }),
        },
        Some(DefaultValue::Expr(_)) => Ok(()),
        Some(DefaultValue::Node(default)) => {
            let output = default.find_output(DEFAULT_OUTPUT).ok_or_else(|| {
                GraphError::MissingOutput {
                    node: default.name().to_string(),
                    output: DEFAULT_OUTPUT.to_string(),
                }
            })?;
            if !def.ty.accepts(output.ty) {
                return Err(ShaderError::TypeMismatch {
                    node: factory.name().to_string(),
                    input: def.name.clone(),
                    expected: def.ty,
                    found: output.ty,
                });
            }
            default
                .inputs()
                .iter()
                .try_for_each(|inner| check_unbound(default, inner))
        }
    }
}

/// Checks a reference against an input type. References to reserved nodes
/// pass; the compiler checks them once they are defined.
fn check_output(
    graph: &ShaderGraph,
    factory: &NodeFactory,
    input: &str,
    expected: ValueType,
    output: &OutputRef,
) -> ShaderResult<()> {
    match graph.output_type(output)? {
        Some(found) if !expected.accepts(found) => Err(ShaderError::TypeMismatch {
            node: factory.name().to_string(),
            input: input.to_string(),
            expected,
            found,
        }),
        _ => Ok(()),
    }
}
