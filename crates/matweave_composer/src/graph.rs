//! Dependency Graph
//!
//! Links the parsed fragments of one build together:
//!
//! 1. **Indexing**: each fragment's index is its position in declaration
//!    order. The index drives the rename suffix and the sort tie-break.
//! 2. **Argument merging**: one canonical declaration per argument name,
//!    written back into every fragment argument.
//! 3. **Producers**: walking from the last fragment to the first, a stage
//!    function becomes the canonical producer of its hardware outputs when
//!    none of them was already claimed by a later fragment.
//! 4. **Edges**: `A` depends on `B` when `B` writes a value `A` reads.
//! 5. **Elimination**: after sorting, fragments with a pixel stage that
//!    cannot reach a required output are dropped.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::arguments::ArgumentTable;
use crate::declaration::{ArgumentDeclaration, MaterialPartDeclaration, ShaderStage};
use crate::errors::{ComposeError, Result};
use crate::semantic::{is_valid_pixel_output, is_valid_vertex_output};
use crate::sort::topological_sort;

// ============================================================================
// Indexing and Argument Merging
// ============================================================================

pub(crate) fn assign_indices(parts: &mut [MaterialPartDeclaration]) {
    for (i, part) in parts.iter_mut().enumerate() {
        part.index = i;
    }
}

/// Merges every stage argument (all vertex stages first, then all pixel
/// stages) into one table and writes the canonical semantic back.
pub(crate) fn merge_arguments(parts: &mut [MaterialPartDeclaration]) -> Result<ArgumentTable> {
    let mut table = ArgumentTable::new();
    for stage in [ShaderStage::Vertex, ShaderStage::Pixel] {
        for part in parts.iter() {
            for argument in part.stage_arguments(stage) {
                table.merge(argument, &part.id)?;
            }
        }
    }
    table.finish();

    for part in parts.iter_mut() {
        for stage in [ShaderStage::Vertex, ShaderStage::Pixel] {
            let Some(function) = part.stage_mut(stage) else {
                continue;
            };
            for argument in &mut function.arguments {
                if let Some(canonical) = table.get(&argument.name) {
                    argument.semantic.clone_from(&canonical.semantic);
                }
            }
        }
    }
    Ok(table)
}

// ============================================================================
// Producers
// ============================================================================

fn qualifying_outputs<'a>(
    arguments: impl Iterator<Item = &'a ArgumentDeclaration>,
    is_valid: fn(&str) -> bool,
) -> SmallVec<[&'a str; 4]> {
    arguments
        .filter(|a| a.is_output)
        .filter_map(|a| a.semantic.as_deref())
        .filter(|s| is_valid(s))
        .collect()
}

fn claim<'a>(claimed: &mut FxHashSet<&'a str>, semantics: &[&'a str]) -> bool {
    if semantics.is_empty() || semantics.iter().any(|s| claimed.contains(s)) {
        return false;
    }
    claimed.extend(semantics.iter().copied());
    true
}

pub(crate) fn mark_producers(parts: &mut [MaterialPartDeclaration]) {
    let mut flags = vec![(false, false); parts.len()];
    {
        let mut vertex_claimed = FxHashSet::default();
        let mut pixel_claimed = FxHashSet::default();
        for (i, part) in parts.iter().enumerate().rev() {
            let vs = qualifying_outputs(part.stage_arguments(ShaderStage::Vertex), is_valid_vertex_output);
            let ps = qualifying_outputs(part.stage_arguments(ShaderStage::Pixel), is_valid_pixel_output);
            flags[i] = (claim(&mut vertex_claimed, &vs), claim(&mut pixel_claimed, &ps));
        }
    }
    for (part, (vs, ps)) in parts.iter_mut().zip(flags) {
        part.is_vertex_shader_output_producer = vs;
        part.is_pixel_shader_output_producer = ps;
    }
}

// ============================================================================
// Dependency Edges
// ============================================================================

fn reads(part: &MaterialPartDeclaration, stage: ShaderStage, name: &str) -> bool {
    part.stage_arguments(stage).any(|a| a.is_input && a.name == name)
}

/// Whether `consumer` reads a value `producer` writes.
fn depends_on(consumer: &MaterialPartDeclaration, producer: &MaterialPartDeclaration) -> bool {
    let same_stage = |stage| {
        producer.stage_arguments(stage).any(|out| {
            out.is_output
                && (!out.is_input || producer.index < consumer.index)
                && reads(consumer, stage, &out.name)
        })
    };
    let cross_stage = || {
        producer
            .stage_arguments(ShaderStage::Vertex)
            .any(|out| out.is_output && reads(consumer, ShaderStage::Pixel, &out.name))
    };
    same_stage(ShaderStage::Vertex) || same_stage(ShaderStage::Pixel) || cross_stage()
}

pub(crate) fn link_dependencies(parts: &mut [MaterialPartDeclaration]) {
    let edges: Vec<SmallVec<[usize; 4]>> = parts
        .iter()
        .enumerate()
        .map(|(i, consumer)| {
            parts
                .iter()
                .enumerate()
                .filter(|&(j, producer)| j != i && depends_on(consumer, producer))
                .map(|(_, producer)| producer.index)
                .collect()
        })
        .collect();
    for (part, dependencies) in parts.iter_mut().zip(edges) {
        part.dependencies = dependencies;
    }
}

// ============================================================================
// Ordering and Elimination
// ============================================================================

/// Reorders `parts` so every fragment follows its dependencies.
///
/// Expects `index == position`, as left by [`assign_indices`].
pub(crate) fn sort_parts(parts: Vec<MaterialPartDeclaration>) -> Result<Vec<MaterialPartDeclaration>> {
    let order = topological_sort(parts.len(), |n| parts[n].dependencies.clone()).map_err(|stuck| {
        ComposeError::CyclicDependency {
            fragments: stuck.iter().map(|&n| parts[n].id.clone()).collect(),
        }
    })?;

    let mut slots: Vec<Option<MaterialPartDeclaration>> = parts.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|n| slots[n].take()).collect())
}

/// Tags every fragment that contributes to a live output and drops the
/// untagged ones that have a pixel stage.
///
/// A fragment is a root when it is a pixel-output producer or its pixel
/// stage calls `clip`. With `simplify` off every fragment is a root.
pub(crate) fn eliminate_dead(
    mut parts: Vec<MaterialPartDeclaration>,
    simplify: bool,
) -> Vec<MaterialPartDeclaration> {
    let mut position_of = vec![usize::MAX; parts.len()];
    for (position, part) in parts.iter().enumerate() {
        if let Some(slot) = position_of.get_mut(part.index) {
            *slot = position;
        }
    }

    let mut pending = Vec::new();
    for position in (0..parts.len()).rev() {
        let part = &parts[position];
        let is_root = !simplify
            || part.is_pixel_shader_output_producer
            || part.pixel_shader().is_some_and(|ps| ps.contains_clip);
        if !(is_root || part.tagged) {
            continue;
        }

        pending.push(position);
        while let Some(current) = pending.pop() {
            parts[current].tagged = true;
            for &dep in &parts[current].dependencies {
                if let Some(&p) = position_of.get(dep)
                    && p != usize::MAX
                    && !parts[p].tagged
                {
                    pending.push(p);
                }
            }
        }
    }

    let before = parts.len();
    parts.retain(|part| {
        let keep = part.tagged || part.pixel_shader().is_none();
        if !keep {
            log::debug!("Eliminating fragment `{}`: no path to a pixel output", part.id);
        }
        keep
    });
    if parts.len() != before {
        log::debug!("Dead-code elimination kept {} of {before} fragments", parts.len());
    }
    parts
}
