//! Built-in material parts backed by the embedded fragment library.

use crate::defines::FragmentDefines;
use crate::errors::Result;
use crate::library::render_fragment;
use crate::part::{MaterialPart, PartKind};
use crate::usage::MaterialUsage;

pub const TEXTURE_ENABLED: &str = "TEXTURE_ENABLED";
pub const DIFFUSE_COLOR_ENABLED: &str = "DIFFUSE_COLOR_ENABLED";
pub const VERTEX_COLOR_ENABLED: &str = "VERTEX_COLOR_ENABLED";

/// A part whose fragment is one of the embedded templates.
#[derive(Debug, Clone)]
pub struct BuiltinPart {
    kind: PartKind,
    defines: FragmentDefines,
}

impl BuiltinPart {
    /// A built-in part of `kind` with no defines. `None` for
    /// [`PartKind::Custom`].
    #[must_use]
    pub fn new(kind: PartKind) -> Option<Self> {
        (kind != PartKind::Custom).then(|| Self {
            kind,
            defines: FragmentDefines::new(),
        })
    }

    #[must_use]
    pub fn vertex_transform() -> Self {
        Self::of(PartKind::VertexTransform)
    }

    #[must_use]
    pub fn diffuse(texture: bool, diffuse_color: bool, vertex_color: bool) -> Self {
        let mut part = Self::of(PartKind::Diffuse);
        part.defines.toggle(TEXTURE_ENABLED, texture);
        part.defines.toggle(DIFFUSE_COLOR_ENABLED, diffuse_color);
        part.defines.toggle(VERTEX_COLOR_ENABLED, vertex_color);
        part
    }

    #[must_use]
    pub fn directional_light() -> Self {
        Self::of(PartKind::DirectionalLight)
    }

    #[must_use]
    pub fn final_color() -> Self {
        Self::of(PartKind::FinalColor)
    }

    #[must_use]
    pub fn alpha_test() -> Self {
        Self::of(PartKind::AlphaTest)
    }

    #[must_use]
    pub fn depth_output() -> Self {
        Self::of(PartKind::DepthOutput)
    }

    #[must_use]
    pub fn depth_normal_output() -> Self {
        Self::of(PartKind::DepthNormalOutput)
    }

    fn of(kind: PartKind) -> Self {
        Self {
            kind,
            defines: FragmentDefines::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn defines(&self) -> &FragmentDefines {
        &self.defines
    }

    #[inline]
    pub fn defines_mut(&mut self) -> &mut FragmentDefines {
        &mut self.defines
    }

    /// Template providing this part's code for `usage`, if it has any.
    fn template(&self, usage: MaterialUsage) -> Option<&'static str> {
        use MaterialUsage as U;
        use PartKind as K;
        match (self.kind, usage) {
            (K::VertexTransform, _) => Some("vertex_transform"),
            (K::Diffuse, U::Default) => Some("diffuse"),
            (K::DirectionalLight, U::Default) => Some("directional_light"),
            (K::FinalColor, U::Default) => Some("final_color"),
            (K::AlphaTest, U::Default) => Some("alpha_test"),
            (K::DepthOutput, U::Depth) => Some("depth_output"),
            (K::DepthNormalOutput, U::DepthAndNormal) => Some("depth_normal_output"),
            _ => None,
        }
    }
}

impl MaterialPart for BuiltinPart {
    fn kind(&self) -> PartKind {
        self.kind
    }

    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn shader_code(&self, usage: MaterialUsage) -> Result<Option<String>> {
        self.template(usage)
            .map(|name| render_fragment(name, &self.defines))
            .transpose()
    }

    fn dependent_parts(&self, usage: MaterialUsage, out: &mut Vec<PartKind>) {
        match (self.kind, usage) {
            (PartKind::VertexTransform, MaterialUsage::Depth) => out.push(PartKind::DepthOutput),
            (PartKind::VertexTransform, MaterialUsage::DepthAndNormal) => {
                out.push(PartKind::DepthNormalOutput);
            }
            (PartKind::Diffuse | PartKind::DirectionalLight, MaterialUsage::Default) => {
                out.push(PartKind::FinalColor);
            }
            _ => {}
        }
    }
}
