//! Named node factories for declarative graph descriptions.

use std::collections::HashMap;

use crate::node::NodeFactory;
use crate::nodes;
use crate::types::ValueType;

/// Factory lookup by key.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with the node library.
    ///
    /// Typed families are registered once per arithmetic type with the type
    /// as suffix: `add_vec3`, `mix_color`, `scale_float`, ...
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("time", nodes::time());
        registry.register("vertex_position", nodes::vertex_position());
        registry.register("vertex_normal", nodes::vertex_normal());
        registry.register("uv", nodes::uv());
        registry.register("sin", nodes::sin());
        registry.register("cos", nodes::cos());
        registry.register("sine_wave", nodes::sine_wave());
        registry.register("join", nodes::join());
        registry.register("split", nodes::split());
        registry.register("fresnel", nodes::fresnel());
        registry.register("master", nodes::master());

        for ty in [
            ValueType::Float,
            ValueType::Vec2,
            ValueType::Vec3,
            ValueType::Vec4,
            ValueType::Color,
        ] {
            let suffix = ty.name();
            registry.register(&format!("add_{suffix}"), nodes::add(ty));
            registry.register(&format!("subtract_{suffix}"), nodes::subtract(ty));
            registry.register(&format!("multiply_{suffix}"), nodes::multiply(ty));
            registry.register(&format!("divide_{suffix}"), nodes::divide(ty));
            registry.register(&format!("scale_{suffix}"), nodes::scale(ty));
            registry.register(&format!("mix_{suffix}"), nodes::mix(ty));
            registry.register(&format!("pass_{suffix}"), nodes::pass_through("Pass", ty));
        }
        registry
    }

    /// Adds or replaces a factory. Returns the one it replaced.
    pub fn register(&mut self, key: &str, factory: NodeFactory) -> Option<NodeFactory> {
        self.factories.insert(key.to_string(), factory)
    }

    /// Looks a factory up.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&NodeFactory> {
        self.factories.get(key)
    }

    /// Number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
