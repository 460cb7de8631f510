//! Part kind registry.
//!
//! Maps a [`PartKind`] to a zero-argument constructor. The dependency
//! insertion pass uses it to materialize parts that a group is missing.

use rustc_hash::FxHashMap;

use crate::builtin::BuiltinPart;
use crate::errors::{BuildError, Result};
use crate::part::{MaterialPart, PartKind};

/// Zero-argument part constructor.
pub type PartFactory = fn() -> Box<dyn MaterialPart>;

#[derive(Debug, Clone, Default)]
pub struct PartRegistry {
    factories: FxHashMap<PartKind, PartFactory>,
}

impl PartRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that can construct every built-in kind.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PartKind::VertexTransform, || Box::new(BuiltinPart::vertex_transform()));
        registry.register(PartKind::Diffuse, || Box::new(BuiltinPart::diffuse(false, false, false)));
        registry.register(PartKind::DirectionalLight, || Box::new(BuiltinPart::directional_light()));
        registry.register(PartKind::FinalColor, || Box::new(BuiltinPart::final_color()));
        registry.register(PartKind::AlphaTest, || Box::new(BuiltinPart::alpha_test()));
        registry.register(PartKind::DepthOutput, || Box::new(BuiltinPart::depth_output()));
        registry.register(PartKind::DepthNormalOutput, || {
            Box::new(BuiltinPart::depth_normal_output())
        });
        registry
    }

    /// Registers (or replaces) the factory for `kind`.
    pub fn register(&mut self, kind: PartKind, factory: PartFactory) {
        self.factories.insert(kind, factory);
    }

    #[must_use]
    pub fn contains(&self, kind: PartKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn create(&self, kind: PartKind) -> Result<Box<dyn MaterialPart>> {
        self.factories
            .get(&kind)
            .map(|factory| factory())
            .ok_or(BuildError::UnknownPartKind(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::SourcePart;

    #[test]
    fn builtin_registry_covers_every_builtin_kind() {
        let registry = PartRegistry::builtin();
        for kind in [
            PartKind::VertexTransform,
            PartKind::Diffuse,
            PartKind::DirectionalLight,
            PartKind::FinalColor,
            PartKind::AlphaTest,
            PartKind::DepthOutput,
            PartKind::DepthNormalOutput,
        ] {
            assert_eq!(registry.create(kind).unwrap().kind(), kind);
        }
        assert!(matches!(
            registry.create(PartKind::Custom),
            Err(BuildError::UnknownPartKind(PartKind::Custom))
        ));
    }

    #[test]
    fn factories_can_be_replaced() {
        let mut registry = PartRegistry::builtin();
        registry.register(PartKind::FinalColor, || {
            Box::new(
                SourcePart::new("FlatColor", "void PixelShader(float4 Diffuse, out float4 Color : COLOR0) { Color = Diffuse; }")
                    .with_kind(PartKind::FinalColor),
            )
        });
        assert_eq!(registry.create(PartKind::FinalColor).unwrap().name(), "FlatColor");
    }
}
