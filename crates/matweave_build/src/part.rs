//! Material Parts
//!
//! A material part is one building block of a material group. For every
//! [`MaterialUsage`] it either contributes a fragment source or nothing, and
//! it may name other part kinds that must be present for it to make sense
//! (a diffuse term needs something that writes the final colour).

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::usage::MaterialUsage;

/// Closed set of part kinds the registry can construct, plus
/// [`Custom`](PartKind::Custom) for user-authored fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartKind {
    VertexTransform,
    Diffuse,
    DirectionalLight,
    FinalColor,
    AlphaTest,
    DepthOutput,
    DepthNormalOutput,
    Custom,
}

impl PartKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VertexTransform => "VertexTransform",
            Self::Diffuse => "Diffuse",
            Self::DirectionalLight => "DirectionalLight",
            Self::FinalColor => "FinalColor",
            Self::AlphaTest => "AlphaTest",
            Self::DepthOutput => "DepthOutput",
            Self::DepthNormalOutput => "DepthNormalOutput",
            Self::Custom => "Custom",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One building block of a material group.
pub trait MaterialPart: Send + Sync {
    fn kind(&self) -> PartKind;

    /// Human-readable name, used in fragment ids and diagnostics.
    fn name(&self) -> &str;

    /// Fragment source for `usage`, or `None` when the part contributes no
    /// code to that usage.
    fn shader_code(&self, usage: MaterialUsage) -> Result<Option<String>>;

    /// Appends the kinds this part needs alongside it for `usage`.
    fn dependent_parts(&self, _usage: MaterialUsage, _out: &mut Vec<PartKind>) {}
}

impl fmt::Debug for dyn MaterialPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialPart")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

/// A part wrapping hand-written fragment source.
///
/// Contributes its source to the listed usages only (all usages when the
/// list is empty).
#[derive(Debug, Clone)]
pub struct SourcePart {
    name: String,
    kind: PartKind,
    source: String,
    usages: FxHashSet<MaterialUsage>,
    dependents: Vec<PartKind>,
}

impl SourcePart {
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PartKind::Custom,
            source: source.into(),
            usages: FxHashSet::default(),
            dependents: Vec::new(),
        }
    }

    /// Restricts the part to `usage` (cumulative).
    #[must_use]
    pub fn for_usage(mut self, usage: MaterialUsage) -> Self {
        self.usages.insert(usage);
        self
    }

    /// Presents the part as `kind`, e.g. to replace a built-in.
    #[must_use]
    pub fn with_kind(mut self, kind: PartKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_dependent(mut self, kind: PartKind) -> Self {
        self.dependents.push(kind);
        self
    }

    fn applies_to(&self, usage: MaterialUsage) -> bool {
        self.usages.is_empty() || self.usages.contains(&usage)
    }
}

impl MaterialPart for SourcePart {
    fn kind(&self) -> PartKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn shader_code(&self, usage: MaterialUsage) -> Result<Option<String>> {
        Ok(self.applies_to(usage).then(|| self.source.clone()))
    }

    fn dependent_parts(&self, usage: MaterialUsage, out: &mut Vec<PartKind>) {
        if self.applies_to(usage) {
            out.extend_from_slice(&self.dependents);
        }
    }
}
