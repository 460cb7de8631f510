//! Canonical argument dictionary.
//!
//! Every stage-function argument across all fragments of a build is merged
//! into one declaration per name. Types must agree exactly; semantics and
//! default values must agree when both sides have one, otherwise the empty
//! side is filled from the other. Iteration follows first-declaration order,
//! which is also the order the emitter declares locals in.

use rustc_hash::FxHashMap;

use crate::declaration::ArgumentDeclaration;
use crate::errors::{ComposeError, ConflictField, Result};
use crate::fragment::FragmentId;

/// Default assigned to arguments that never declare one.
pub const FALLBACK_DEFAULT: &str = "0";

#[derive(Debug, Clone)]
struct Entry {
    argument: ArgumentDeclaration,
    type_origin: FragmentId,
    semantic_origin: FragmentId,
    default_origin: FragmentId,
}

/// Insertion-ordered `name → merged argument` table.
#[derive(Debug, Clone, Default)]
pub struct ArgumentTable {
    entries: Vec<Entry>,
    lookup: FxHashMap<String, usize>,
}

fn merge_field(
    name: &str,
    field: ConflictField,
    current: &mut Option<String>,
    current_origin: &mut FragmentId,
    incoming: Option<&String>,
    from: &FragmentId,
) -> Result<()> {
    match (current.as_ref(), incoming) {
        (Some(existing), Some(value)) if existing != value => Err(ComposeError::ArgumentConflict {
            name: name.to_owned(),
            field,
            first: current_origin.clone(),
            first_value: existing.clone(),
            second: from.clone(),
            second_value: value.clone(),
        }),
        (None, Some(value)) => {
            *current = Some(value.clone());
            *current_origin = from.clone();
            Ok(())
        }
        _ => Ok(()),
    }
}

impl ArgumentTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one fragment's argument into the table.
    pub fn merge(&mut self, argument: &ArgumentDeclaration, from: &FragmentId) -> Result<()> {
        let Some(&slot) = self.lookup.get(&argument.name) else {
            self.lookup.insert(argument.name.clone(), self.entries.len());
            self.entries.push(Entry {
                argument: argument.clone(),
                type_origin: from.clone(),
                semantic_origin: from.clone(),
                default_origin: from.clone(),
            });
            return Ok(());
        };

        let entry = &mut self.entries[slot];
        if entry.argument.ty != argument.ty {
            return Err(ComposeError::ArgumentConflict {
                name: argument.name.clone(),
                field: ConflictField::Type,
                first: entry.type_origin.clone(),
                first_value: entry.argument.ty.clone(),
                second: from.clone(),
                second_value: argument.ty.clone(),
            });
        }
        merge_field(
            &argument.name,
            ConflictField::Semantic,
            &mut entry.argument.semantic,
            &mut entry.semantic_origin,
            argument.semantic.as_ref(),
            from,
        )?;
        merge_field(
            &argument.name,
            ConflictField::DefaultValue,
            &mut entry.argument.default_value,
            &mut entry.default_origin,
            argument.default_value.as_ref(),
            from,
        )
    }

    /// Assigns [`FALLBACK_DEFAULT`] to every argument without a default.
    pub fn finish(&mut self) {
        for entry in &mut self.entries {
            entry
                .argument
                .default_value
                .get_or_insert_with(|| FALLBACK_DEFAULT.to_owned());
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgumentDeclaration> {
        self.lookup.get(name).map(|&i| &self.entries[i].argument)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArgumentDeclaration> {
        self.entries.iter().map(|e| &e.argument)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(order: &[&ArgumentDeclaration]) -> ArgumentDeclaration {
        let mut table = ArgumentTable::new();
        for (i, arg) in order.iter().enumerate() {
            table.merge(arg, &FragmentId::new(format!("f{i}"))).unwrap();
        }
        table.finish();
        table.get("x").unwrap().clone()
    }

    #[test]
    fn test_merge_is_commutative() {
        let bare = ArgumentDeclaration::new("x", "float");
        let bound = ArgumentDeclaration::new("x", "float").with_semantic("TEXCOORD0");

        let a = merged(&[&bare, &bound]);
        let b = merged(&[&bound, &bare]);

        for result in [&a, &b] {
            assert_eq!(result.name, "x");
            assert_eq!(result.ty, "float");
            assert_eq!(result.semantic.as_deref(), Some("TEXCOORD0"));
            assert_eq!(result.default_value.as_deref(), Some("0"));
        }
    }

    #[test]
    fn test_type_conflict() {
        let mut table = ArgumentTable::new();
        table
            .merge(&ArgumentDeclaration::new("n", "float3"), &"a".into())
            .unwrap();
        let err = table
            .merge(&ArgumentDeclaration::new("n", "float4"), &"b".into())
            .unwrap_err();
        match err {
            ComposeError::ArgumentConflict {
                field,
                first,
                second,
                ..
            } => {
                assert_eq!(field, ConflictField::Type);
                assert_eq!(first.as_str(), "a");
                assert_eq!(second.as_str(), "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_semantic_and_default_conflicts() {
        let mut table = ArgumentTable::new();
        table
            .merge(&ArgumentDeclaration::new("c", "float4").with_semantic("COLOR0"), &"a".into())
            .unwrap();
        assert!(table
            .merge(&ArgumentDeclaration::new("c", "float4").with_semantic("COLOR1"), &"b".into())
            .is_err());

        let mut with_default = ArgumentDeclaration::new("k", "float");
        with_default.default_value = Some("1".into());
        let mut other_default = with_default.clone();
        other_default.default_value = Some("2".into());
        table.merge(&with_default, &"a".into()).unwrap();
        table.merge(&ArgumentDeclaration::new("k", "float"), &"b".into()).unwrap();
        let err = table.merge(&other_default, &"c".into()).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::ArgumentConflict {
                field: ConflictField::DefaultValue,
                ..
            }
        ));
    }

    #[test]
    fn test_iteration_keeps_first_declaration_order() {
        let mut table = ArgumentTable::new();
        for name in ["b", "a", "c", "a"] {
            table
                .merge(&ArgumentDeclaration::new(name, "float"), &"f".into())
                .unwrap();
        }
        let names: Vec<_> = table.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
        assert_eq!(table.len(), 3);
    }
}
