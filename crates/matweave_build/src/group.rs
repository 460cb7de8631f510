//! Material groups and dependent-part insertion.

use crate::builtin::BuiltinPart;
use crate::errors::Result;
use crate::part::{MaterialPart, PartKind};
use crate::registry::PartRegistry;
use crate::usage::MaterialUsage;

/// A named, ordered list of material parts built into one effect per usage.
#[derive(Debug, Default)]
pub struct MaterialGroup {
    pub name: String,
    pub parts: Vec<Box<dyn MaterialPart>>,
}

impl MaterialGroup {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_part(mut self, part: impl MaterialPart + 'static) -> Self {
        self.parts.push(Box::new(part));
        self
    }

    pub fn push(&mut self, part: Box<dyn MaterialPart>) {
        self.parts.push(part);
    }

    #[must_use]
    pub fn contains(&self, kind: PartKind) -> bool {
        self.parts.iter().any(|p| p.kind() == kind)
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<PartKind> {
        self.parts.iter().map(|p| p.kind()).collect()
    }
}

/// Moves every part of `kind` outside `start..=end` to directly after `end`.
/// Returns the shifted block bounds, `end` now covering the moved parts.
fn move_after(
    parts: &mut Vec<Box<dyn MaterialPart>>,
    mut start: usize,
    mut end: usize,
    kind: PartKind,
) -> (usize, usize) {
    let mut moved = Vec::new();
    let mut i = 0;
    while i < parts.len() {
        if (i < start || i > end) && parts[i].kind() == kind {
            moved.push(parts.remove(i));
            if i < start {
                start -= 1;
                end -= 1;
            }
        } else {
            i += 1;
        }
    }

    for part in moved {
        end += 1;
        parts.insert(end, part);
    }
    (start, end)
}

/// Completes `group` for `usage`:
///
/// - an empty group gets a plain diffuse part;
/// - a vertex transform is appended when missing;
/// - every dependent kind a part declares is placed directly after it,
///   constructed through `registry` when absent, moved when present
///   elsewhere. Dependents of inserted parts are processed in the same
///   pass.
pub fn resolve_parts(
    group: &mut MaterialGroup,
    usage: MaterialUsage,
    registry: &PartRegistry,
) -> Result<()> {
    if group.parts.is_empty() {
        group.push(Box::new(BuiltinPart::diffuse(false, false, false)));
    }
    if !group.contains(PartKind::VertexTransform) {
        group.push(registry.create(PartKind::VertexTransform)?);
    }

    let parts = &mut group.parts;
    let mut pending = Vec::new();
    let mut p = 0;
    while p < parts.len() {
        let mut owner = p;
        parts[owner].dependent_parts(usage, &mut pending);

        let mut i = 0;
        while i < pending.len() {
            let kind = pending[i];
            i += 1;
            if parts[owner..=p].iter().any(|x| x.kind() == kind) {
                continue;
            }
            if parts.iter().any(|x| x.kind() == kind) {
                (owner, p) = move_after(parts, owner, p, kind);
            } else {
                let part = registry.create(kind)?;
                log::debug!("Inserting dependent part {kind} after `{}`", parts[owner].name());
                part.dependent_parts(usage, &mut pending);
                p += 1;
                parts.insert(p, part);
            }
        }
        pending.clear();
        p += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::SourcePart;

    #[test]
    fn empty_group_gets_diffuse_and_transform() {
        let mut group = MaterialGroup::new("empty");
        resolve_parts(&mut group, MaterialUsage::Default, &PartRegistry::builtin()).unwrap();
        assert_eq!(
            group.kinds(),
            [PartKind::Diffuse, PartKind::FinalColor, PartKind::VertexTransform]
        );
    }

    #[test]
    fn shared_dependent_follows_last_declarer() {
        let mut group = MaterialGroup::new("lit")
            .with_part(BuiltinPart::diffuse(true, false, false))
            .with_part(BuiltinPart::directional_light());
        resolve_parts(&mut group, MaterialUsage::Default, &PartRegistry::builtin()).unwrap();
        assert_eq!(
            group.kinds(),
            [
                PartKind::Diffuse,
                PartKind::DirectionalLight,
                PartKind::FinalColor,
                PartKind::VertexTransform
            ]
        );
    }

    #[test]
    fn transform_dependents_depend_on_usage() {
        let registry = PartRegistry::builtin();

        let mut depth = MaterialGroup::new("g").with_part(BuiltinPart::diffuse(false, false, false));
        resolve_parts(&mut depth, MaterialUsage::Depth, &registry).unwrap();
        assert_eq!(
            depth.kinds(),
            [PartKind::Diffuse, PartKind::VertexTransform, PartKind::DepthOutput]
        );

        let mut both = MaterialGroup::new("g").with_part(BuiltinPart::vertex_transform());
        resolve_parts(&mut both, MaterialUsage::DepthAndNormal, &registry).unwrap();
        assert_eq!(both.kinds(), [PartKind::VertexTransform, PartKind::DepthNormalOutput]);
    }

    #[test]
    fn existing_dependent_is_moved() {
        let mut group = MaterialGroup::new("g")
            .with_part(BuiltinPart::final_color())
            .with_part(SourcePart::new("custom", "void PixelShader(out float4 Diffuse) { Diffuse = 1; }")
                .with_dependent(PartKind::FinalColor));
        resolve_parts(&mut group, MaterialUsage::Default, &PartRegistry::builtin()).unwrap();
        assert_eq!(
            group.kinds(),
            [PartKind::Custom, PartKind::FinalColor, PartKind::VertexTransform]
        );
    }

    #[test]
    fn missing_factory_is_an_error() {
        let mut group = MaterialGroup::new("g").with_part(BuiltinPart::directional_light());
        let mut registry = PartRegistry::new();
        registry.register(PartKind::VertexTransform, || Box::new(BuiltinPart::vertex_transform()));
        let err = resolve_parts(&mut group, MaterialUsage::Default, &registry).unwrap_err();
        assert!(matches!(err, crate::BuildError::UnknownPartKind(PartKind::FinalColor)));
    }
}
