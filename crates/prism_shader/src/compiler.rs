//! # Shader Compiler
//!
//! Turns the nodes reachable from a root into vertex and fragment source.
//!
//! ## Pipeline
//!
//! ```text
//! graph ──► linearize (DFS, post-order) ──► prefixes n0..nK
//!       ──► uniform table (dedup by name)
//!       ──► per stage: declarations, headers, globals, blocks, injections
//! ```
//!
//! Every instance gets its own prefix, so a factory used twice produces two
//! independent sets of globals. Compilation either returns complete sources
//! or an error; nothing partial escapes.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use prism_shared::{load_toml, TIME_UNIFORM};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, ShaderError, ShaderResult};
use crate::graph::ShaderGraph;
use crate::node::{Binding, NodeId, NodeInstance, Stage};
use crate::uniforms::{Uniform, UniformTable};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// A line inserted at the end of one stage's `main`.
///
/// `{name}` placeholders are replaced by the root node's output globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    /// Target stage.
    pub stage: Stage,
    /// GLSL statement with `{output}` placeholders.
    pub template: String,
}

impl Injection {
    /// Vertex stage injection.
    pub fn vertex(template: impl Into<String>) -> Self {
        Self {
            stage: Stage::Vertex,
            template: template.into(),
        }
    }

    /// Fragment stage injection.
    pub fn fragment(template: impl Into<String>) -> Self {
        Self {
            stage: Stage::Fragment,
            template: template.into(),
        }
    }
}

/// Compiler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Host material injection points.
    pub injections: Vec<Injection>,
    /// Emit a `/*** n3: Name ***/` comment before each block.
    pub annotate: bool,
}

impl CompilerConfig {
    /// Injection points of a `CustomShaderMaterial`-style host.
    #[must_use]
    pub fn custom_shader_material() -> Vec<Injection> {
        vec![
            Injection::vertex("csm_Position = {position};"),
            Injection::fragment("csm_DiffuseColor = vec4({diffuseColor}, {alpha});"),
        ]
    }

    /// Parses a TOML config; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ShaderError::Config`] on malformed input.
    pub fn from_toml_str(source: &str) -> ShaderResult<Self> {
        Ok(prism_shared::from_toml_str(source)?)
    }

    /// Loads a TOML config file.
    ///
    /// # Errors
    ///
    /// [`ShaderError::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> ShaderResult<Self> {
        Ok(load_toml(path)?)
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            injections: Self::custom_shader_material(),
            annotate: true,
        }
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Result of one compile call.
///
/// Sources never change after compilation; only uniform values do. Clones
/// share uniform storage.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    vertex_source: String,
    fragment_source: String,
    uniforms: UniformTable,
    node_count: usize,
}

impl CompiledShader {
    /// Vertex stage source.
    #[must_use]
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    /// Fragment stage source.
    #[must_use]
    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Uniform table shared with whoever renders the shader.
    #[must_use]
    pub const fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }

    /// Number of node instances compiled.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    /// The elapsed-time uniform, if any node declared it.
    #[must_use]
    pub fn time_uniform(&self) -> Option<&Uniform> {
        self.uniforms.get(TIME_UNIFORM)
    }

    /// Advances time-dependent uniforms by `delta` seconds.
    pub fn update(&self, delta: f32) {
        self.uniforms.advance(delta);
    }
}

// =============================================================================
// COMPILER
// =============================================================================

/// Graph compiler.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    /// Compiler targeting the default host material.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiler with custom settings.
    #[must_use]
    pub const fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Active settings.
    #[must_use]
    pub const fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles the nodes reachable from `root`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownNode`] if `root` or a reference is foreign
    /// - [`GraphError::UndefinedNode`] for reserved ids never defined
    /// - [`GraphError::Cycle`] if the reachable nodes are cyclic
    /// - [`GraphError::MissingOutput`] for references or injection
    ///   placeholders naming undeclared outputs
    /// - [`GraphError::ConflictingUniform`] for uniform type conflicts
    /// - [`ShaderError::TypeMismatch`] for forward references whose type
    ///   turned out incompatible
    pub fn compile(&self, graph: &ShaderGraph, root: NodeId) -> ShaderResult<CompiledShader> {
        let program = Program::linearize(graph, root)?;
        let uniforms = program.collect_uniforms()?;

        let vertex_source = self.emit(Stage::Vertex, &program, &uniforms)?;
        let fragment_source = self.emit(Stage::Fragment, &program, &uniforms)?;

        debug!(
            nodes = program.nodes.len(),
            uniforms = uniforms.len(),
            vertex_bytes = vertex_source.len(),
            fragment_bytes = fragment_source.len(),
            "compiled shader graph"
        );

        Ok(CompiledShader {
            vertex_source,
            fragment_source,
            uniforms,
            node_count: program.nodes.len(),
        })
    }

    fn emit(&self, stage: Stage, program: &Program<'_>, uniforms: &UniformTable) -> ShaderResult<String> {
        let mut src = String::new();

        for uniform in uniforms.iter() {
            src.push_str(&format!(
                "uniform {} {};\n",
                uniform.value_type().glsl_name(),
                uniform.name()
            ));
        }

        for &(id, node) in &program.nodes {
            if node.factory().is_varying() {
                for output in node.factory().outputs() {
                    src.push_str(&format!(
                        "varying {} v_{}_{};\n",
                        output.ty.glsl_name(),
                        program.prefix(id),
                        output.name
                    ));
                }
            }
        }

        let mut seen = HashSet::new();
        for &(_, node) in &program.nodes {
            if let Some(header) = &node.factory().stage(stage).header {
                if seen.insert(header.as_str()) {
                    src.push_str(header.trim_end());
                    src.push('\n');
                }
            }
        }

        for &(id, node) in &program.nodes {
            for output in node.factory().outputs() {
                src.push_str(&format!(
                    "{} {}_{};\n",
                    output.ty.glsl_name(),
                    program.prefix(id),
                    output.name
                ));
            }
        }

        src.push_str("\nvoid main() {\n");
        for &(id, node) in &program.nodes {
            self.emit_block(&mut src, stage, program, id, node);
        }
        for injection in self.config.injections.iter().filter(|i| i.stage == stage) {
            let line = render_template(&injection.template, |name| program.root_output(name))?;
            src.push_str("  ");
            src.push_str(&line);
            src.push('\n');
        }
        src.push_str("}\n");

        Ok(src)
    }

    fn emit_block(&self, src: &mut String, stage: Stage, program: &Program<'_>, id: NodeId, node: &NodeInstance) {
        let prefix = program.prefix(id);
        let factory = node.factory();

        if self.config.annotate {
            src.push_str(&format!("  /*** {prefix}: {} ***/\n", node.name()));
        }

        if factory.is_varying() && stage == Stage::Fragment {
            for output in factory.outputs() {
                src.push_str(&format!("  {prefix}_{0} = v_{prefix}_{0};\n", output.name));
            }
            return;
        }

        src.push_str("  {\n");
        for (input, binding) in node.inputs() {
            src.push_str(&format!(
                "    {} in_{} = {};\n",
                input.ty.glsl_name(),
                input.name,
                program.render(binding)
            ));
        }
        for output in factory.outputs() {
            let init = output
                .expr
                .clone()
                .unwrap_or_else(|| output.ty.zero().to_glsl());
            src.push_str(&format!(
                "    {} out_{} = {init};\n",
                output.ty.glsl_name(),
                output.name
            ));
        }
        if let Some(body) = &factory.stage(stage).body {
            for line in body.lines() {
                src.push_str("    ");
                src.push_str(line.trim());
                src.push('\n');
            }
        }
        for output in factory.outputs() {
            src.push_str(&format!("    {prefix}_{0} = out_{0};\n", output.name));
        }
        src.push_str("  }\n");

        if factory.is_varying() {
            for output in factory.outputs() {
                src.push_str(&format!("  v_{prefix}_{0} = {prefix}_{0};\n", output.name));
            }
        }
    }
}

/// Compiles with the default configuration.
///
/// # Errors
///
/// See [`Compiler::compile`].
pub fn compile(graph: &ShaderGraph, root: NodeId) -> ShaderResult<CompiledShader> {
    Compiler::new().compile(graph, root)
}

// =============================================================================
// LINEARIZATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Reachable nodes in dependency order, with their prefixes.
struct Program<'g> {
    nodes: Vec<(NodeId, &'g NodeInstance)>,
    prefixes: HashMap<NodeId, String>,
}

impl<'g> Program<'g> {
    fn linearize(graph: &'g ShaderGraph, root: NodeId) -> ShaderResult<Self> {
        if !graph.contains(root) {
            return Err(GraphError::UnknownNode(root).into());
        }

        let mut marks = vec![Mark::Unvisited; graph.len()];
        let mut nodes = Vec::new();
        visit(graph, root, &mut marks, &mut nodes)?;

        let prefixes = nodes
            .iter()
            .enumerate()
            .map(|(order, &(id, _))| (id, format!("n{order}")))
            .collect();

        Ok(Self { nodes, prefixes })
    }

    fn prefix(&self, id: NodeId) -> &str {
        self.prefixes.get(&id).map_or("", String::as_str)
    }

    fn render(&self, binding: &Binding) -> String {
        match binding {
            Binding::Literal(value) => value.to_glsl(),
            Binding::Expr(expr) => expr.clone(),
            Binding::Output(source) => format!("{}_{}", self.prefix(source.node), source.output),
        }
    }

    /// Global holding the root's output `name`. The root is last in order.
    fn root_output(&self, name: &str) -> Result<String, GraphError> {
        let &(id, node) = self
            .nodes
            .last()
            .ok_or_else(|| GraphError::MissingOutput {
                node: String::new(),
                output: name.to_string(),
            })?;
        if node.factory().find_output(name).is_none() {
            return Err(GraphError::MissingOutput {
                node: node.name().to_string(),
                output: name.to_string(),
            });
        }
        Ok(format!("{}_{name}", self.prefix(id)))
    }

    fn collect_uniforms(&self) -> Result<UniformTable, GraphError> {
        let mut table = UniformTable::new();
        for &(_, node) in &self.nodes {
            for def in node.factory().uniforms() {
                let ty = def.initial.value_type();
                match table.get(&def.name) {
                    Some(existing) if existing.value_type() != ty => {
                        return Err(GraphError::ConflictingUniform {
                            name: def.name.clone(),
                            first: existing.value_type(),
                            second: ty,
                        });
                    }
                    Some(_) => {}
                    None => table.insert(Uniform::new(&def.name, def.initial, def.update.clone())),
                }
            }
        }
        Ok(table)
    }
}

/// Post-order DFS over input edges in declaration order.
///
/// Iterative: the work stack doubles as the grey path, so chain depth is
/// bounded by memory rather than the thread stack.
fn visit<'g>(
    graph: &'g ShaderGraph,
    root: NodeId,
    marks: &mut [Mark],
    order: &mut Vec<(NodeId, &'g NodeInstance)>,
) -> ShaderResult<()> {
    if marks[root.index()] == Mark::Done {
        return Ok(());
    }
    let node = graph.get(root).ok_or(GraphError::UndefinedNode(root))?;
    marks[root.index()] = Mark::InProgress;

    // (node, instance, index of the next input to walk)
    let mut stack: Vec<(NodeId, &'g NodeInstance, usize)> = vec![(root, node, 0)];

    while let Some(&mut (id, node, ref mut cursor)) = stack.last_mut() {
        let Some((input, binding)) = node.inputs().nth(*cursor) else {
            stack.pop();
            marks[id.index()] = Mark::Done;
            order.push((id, node));
            continue;
        };
        let Binding::Output(source) = binding else {
            *cursor += 1;
            continue;
        };
        if !graph.contains(source.node) {
            return Err(GraphError::UnknownNode(source.node).into());
        }

        match marks[source.node.index()] {
            Mark::Done => {
                if let Some(found) = graph.output_type(source)? {
                    if !input.ty.accepts(found) {
                        return Err(ShaderError::TypeMismatch {
                            node: node.name().to_string(),
                            input: input.name.clone(),
                            expected: input.ty,
                            found,
                        });
                    }
                }
                *cursor += 1;
            }
            Mark::InProgress => {
                let start = stack
                    .iter()
                    .position(|&(p, _, _)| p == source.node)
                    .unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..]
                    .iter()
                    .map(|&(p, _, _)| describe(graph, p))
                    .collect();
                cycle.push(describe(graph, source.node));
                return Err(GraphError::Cycle { path: cycle }.into());
            }
            Mark::Unvisited => {
                // The cursor stays put: the edge is type checked once the
                // source is done.
                let child = graph
                    .get(source.node)
                    .ok_or(GraphError::UndefinedNode(source.node))?;
                marks[source.node.index()] = Mark::InProgress;
                stack.push((source.node, child, 0));
            }
        }
    }

    Ok(())
}

fn describe(graph: &ShaderGraph, id: NodeId) -> String {
    graph
        .get(id)
        .map_or_else(|| format!("<reserved> {id}"), |node| format!("{} {id}", node.name()))
}

/// Replaces `{name}` placeholders through `resolve`.
fn render_template(
    template: &str,
    mut resolve: impl FnMut(&str) -> Result<String, GraphError>,
) -> Result<String, GraphError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&resolve(&after[..close])?);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeDef;
    use crate::nodes;
    use crate::types::ValueType;

    #[test]
    fn test_render_template() {
        let line = render_template("a = vec4({x}, {y});", |name| Ok(format!("n0_{name}"))).unwrap();
        assert_eq!(line, "a = vec4(n0_x, n0_y);");
        let untouched = render_template("no placeholders {", |_| Ok(String::new())).unwrap();
        assert_eq!(untouched, "no placeholders {");
    }

    #[test]
    fn test_minimal_master() {
        let mut graph = ShaderGraph::new();
        let master = graph.node(&nodes::master()).insert().unwrap();
        let shader = compile(&graph, master).unwrap();

        // The default position node comes first, the master last.
        assert_eq!(shader.node_count(), 2);
        assert!(shader.vertex_source().contains("csm_Position = n1_position;"));
        assert!(shader
            .fragment_source()
            .contains("csm_DiffuseColor = vec4(n1_diffuseColor, n1_alpha);"));
        assert!(shader.vertex_source().contains("v_n0_value = n0_value;"));
        assert!(shader.fragment_source().contains("n0_value = v_n0_value;"));
        assert!(shader.uniforms().is_empty());
    }

    #[test]
    fn test_headers_deduplicated() {
        let helper = NodeDef::new("Helper")
            .vertex_header("float helper(float x) { return x * 2.0; }")
            .output("value", ValueType::Float, "helper(1.0)")
            .build();
        let mut graph = ShaderGraph::new();
        let a = graph.node(&helper).insert().unwrap();
        let b = graph.node(&helper).insert().unwrap();
        let sum = graph
            .node(&nodes::add(ValueType::Float))
            .bind("a", a)
            .unwrap()
            .bind("b", b)
            .unwrap()
            .insert()
            .unwrap();
        let master = graph.node(&nodes::master()).bind("alpha", sum).unwrap().insert().unwrap();

        let shader = compile(&graph, master).unwrap();
        assert_eq!(shader.vertex_source().matches("float helper(float x)").count(), 1);
        assert!(!shader.fragment_source().contains("float helper(float x)"));
    }

    #[test]
    fn test_without_annotations() {
        let config = CompilerConfig {
            annotate: false,
            ..CompilerConfig::default()
        };
        let mut graph = ShaderGraph::new();
        let master = graph.node(&nodes::master()).insert().unwrap();
        let shader = Compiler::with_config(config).compile(&graph, master).unwrap();
        assert!(!shader.vertex_source().contains("/***"));
    }

    #[test]
    fn test_config_from_toml() {
        let config = CompilerConfig::from_toml_str(
            r#"
            annotate = false

            [[injections]]
            stage = "vertex"
            template = "gl_Position = vec4({position}, 1.0);"
            "#,
        )
        .unwrap();
        assert!(!config.annotate);
        assert_eq!(config.injections, vec![Injection::vertex("gl_Position = vec4({position}, 1.0);")]);
    }
}
