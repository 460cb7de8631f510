//! Signature Resolver
//!
//! Derives the parameter lists of the composed `VS` and `PS` functions from
//! the ordered fragments, then rewrites them until every value crossing a
//! stage boundary is bound to a hardware semantic:
//!
//! - a value read by the pixel stage but produced nowhere is either turned
//!   into a pixel-stage temporary or forwarded through the vertex stage;
//! - two pixel outputs never share a semantic; the earlier one becomes a
//!   temporary and is still computed;
//! - vertex outputs nobody reads are dropped, the rest get a `TEXCOORD<n>`
//!   slot when their semantic is not a valid vertex output;
//! - a pixel input asking for `POSITION0` is rerouted through a fresh
//!   `TEXCOORD<n>` copy of the position.
//!
//! All lists hold owned copies; the fragment declarations are not touched.

use rustc_hash::FxHashSet;

use crate::arguments::ArgumentTable;
use crate::declaration::{ArgumentDeclaration, MaterialPartDeclaration, ShaderStage};
use crate::errors::{ComposeError, Result};
use crate::semantic::{
    POSITION0, SemanticAllocator, is_valid_pixel_output_opt, is_valid_vertex_output_opt,
};

/// Name suffix of the vertex output that carries a copy of the position to
/// the pixel stage.
pub const POSITION_COPY_SUFFIX: &str = "_pos0_";

/// A vertex output emitted as `out Type o_Name : Semantic` with a
/// synthesized semantic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticBinding {
    pub argument: ArgumentDeclaration,
    pub semantic: String,
}

impl SemanticBinding {
    /// Parameter name in the `VS` signature.
    #[must_use]
    pub fn output_name(&self) -> String {
        format!("o_{}", self.argument.name)
    }

    /// The local the bound output copies its value from.
    #[must_use]
    pub fn source_name(&self) -> &str {
        let name = self.argument.name.as_str();
        name.strip_suffix(POSITION_COPY_SUFFIX).unwrap_or(name)
    }
}

/// The resolved stage signatures of one build.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub vs_inputs: Vec<ArgumentDeclaration>,
    pub vs_outputs: Vec<ArgumentDeclaration>,
    pub ps_inputs: Vec<ArgumentDeclaration>,
    pub ps_outputs: Vec<ArgumentDeclaration>,
    /// Pixel-stage locals standing in for values that are not true stage
    /// parameters.
    pub temporaries: Vec<ArgumentDeclaration>,
    pub semantic_mapping: Vec<SemanticBinding>,
}

#[inline]
fn has_named(list: &[ArgumentDeclaration], name: &str) -> bool {
    list.iter().any(|a| a.name == name)
}

fn dedupe(list: &mut Vec<ArgumentDeclaration>) {
    let mut seen = FxHashSet::default();
    list.retain(|a| seen.insert(a.name.clone()));
}

/// Inputs of `stage` that no earlier fragment writes in the same stage.
fn stage_inputs(parts: &[MaterialPartDeclaration], stage: ShaderStage) -> Vec<ArgumentDeclaration> {
    let mut inputs = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        for argument in part.stage_arguments(stage).filter(|a| a.is_input) {
            let produced_earlier = parts[..i]
                .iter()
                .flat_map(|p| p.stage_arguments(stage))
                .any(|a| a.is_output && a.name == argument.name);
            if !produced_earlier {
                inputs.push(argument.clone());
            }
        }
    }
    inputs
}

/// Outputs of `stage` that no later fragment reads in the same stage.
fn stage_outputs(parts: &[MaterialPartDeclaration], stage: ShaderStage) -> Vec<ArgumentDeclaration> {
    let mut outputs = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        for argument in part.stage_arguments(stage).filter(|a| a.is_output) {
            let consumed_later = parts[i + 1..]
                .iter()
                .flat_map(|p| p.stage_arguments(stage))
                .any(|a| a.is_input && a.name == argument.name);
            if !consumed_later {
                outputs.push(argument.clone());
            }
        }
    }
    outputs
}

impl Signature {
    /// Collects the raw stage lists, deduplicated and defaulted.
    fn collect(parts: &[MaterialPartDeclaration], table: &ArgumentTable) -> Self {
        let mut signature = Self {
            vs_inputs: stage_inputs(parts, ShaderStage::Vertex),
            vs_outputs: stage_outputs(parts, ShaderStage::Vertex),
            ps_inputs: stage_inputs(parts, ShaderStage::Pixel),
            ps_outputs: stage_outputs(parts, ShaderStage::Pixel),
            ..Self::default()
        };
        for list in [
            &mut signature.vs_inputs,
            &mut signature.vs_outputs,
            &mut signature.ps_inputs,
            &mut signature.ps_outputs,
        ] {
            dedupe(list);
            for argument in list.iter_mut() {
                argument.default_value = table.get(&argument.name).and_then(|c| c.default_value.clone());
            }
        }
        signature
    }

    /// Pixel outputs without a real render-target semantic become locals.
    fn demote_unbound_pixel_outputs(&mut self) {
        let demoted: Vec<_> = self
            .ps_outputs
            .iter()
            .filter(|o| !is_valid_pixel_output_opt(o.semantic.as_deref()))
            .filter(|o| !has_named(&self.ps_inputs, &o.name))
            .cloned()
            .collect();
        self.temporaries.extend(demoted);
    }

    /// Keeps only the last pixel output per semantic.
    fn collapse_duplicate_semantics(&mut self) {
        let mut i = 0;
        while i < self.ps_outputs.len() {
            let semantic = &self.ps_outputs[i].semantic;
            if self.ps_outputs[i + 1..].iter().any(|o| o.semantic == *semantic) {
                let demoted = self.ps_outputs.remove(i);
                log::debug!(
                    "Pixel output `{}` shares semantic {:?} with a later output; kept as a temporary",
                    demoted.name,
                    demoted.semantic
                );
                for input in self.ps_inputs.iter_mut().filter(|p| p.name == demoted.name) {
                    input.is_output = false;
                }
                self.temporaries.push(demoted);
            } else {
                i += 1;
            }
        }
    }

    /// Pixel inputs nothing in the vertex stage writes: unbound ones become
    /// locals, bound ones are passed through the vertex stage unchanged.
    fn forward_pixel_inputs(&mut self) {
        let mut i = 0;
        while i < self.ps_inputs.len() {
            let input = &self.ps_inputs[i];
            if has_named(&self.vs_outputs, &input.name) {
                i += 1;
                continue;
            }
            if input.semantic.is_none() {
                let local = self.ps_inputs.remove(i);
                self.temporaries.push(local);
                continue;
            }

            let forwarded = ArgumentDeclaration {
                name: input.name.clone(),
                ty: input.ty.clone(),
                semantic: input.semantic.clone(),
                default_value: None,
                is_input: true,
                is_output: true,
            };
            if has_named(&self.vs_inputs, &forwarded.name) {
                for existing in self.vs_inputs.iter_mut().filter(|a| a.name == forwarded.name) {
                    existing.is_output = true;
                }
            } else {
                self.vs_inputs.push(forwarded.clone());
            }
            self.vs_outputs.push(forwarded);
            i += 1;
        }
    }

    /// Binds vertex outputs without a valid semantic to fresh `TEXCOORD`
    /// slots, then reroutes every `POSITION0` pixel input through one copy
    /// of the vertex position.
    fn bind_vertex_outputs(&mut self, allocator: &mut SemanticAllocator) -> Result<()> {
        let vs_outputs = &self.vs_outputs;
        let is_taken = |s: &str| vs_outputs.iter().any(|a| a.has_semantic(s));

        for output in vs_outputs {
            if is_valid_vertex_output_opt(output.semantic.as_deref()) {
                continue;
            }
            let semantic = allocator.allocate(is_taken);
            log::debug!("Vertex output `{}` bound to {semantic}", output.name);
            self.semantic_mapping.push(SemanticBinding {
                argument: output.clone(),
                semantic,
            });
        }

        let readers: Vec<usize> = self
            .ps_inputs
            .iter()
            .enumerate()
            .filter(|(_, p)| p.has_semantic(POSITION0))
            .map(|(i, _)| i)
            .collect();
        if readers.is_empty() {
            return Ok(());
        }

        let positions: Vec<&ArgumentDeclaration> =
            vs_outputs.iter().filter(|v| v.has_semantic(POSITION0)).collect();
        let [position] = positions.as_slice() else {
            return Err(ComposeError::PositionReroute {
                inputs: readers.iter().map(|&i| self.ps_inputs[i].name.clone()).collect(),
                outputs: positions.iter().map(|v| v.name.clone()).collect(),
            });
        };

        let copy = ArgumentDeclaration::new(
            format!("{}{POSITION_COPY_SUFFIX}", position.name),
            position.ty.clone(),
        )
        .output();
        let semantic = allocator.allocate(is_taken);
        log::debug!("Position `{}` rerouted to the pixel stage through {semantic}", position.name);
        for i in readers {
            self.ps_inputs[i].semantic = Some(semantic.clone());
        }
        self.semantic_mapping.push(SemanticBinding {
            argument: copy,
            semantic,
        });
        Ok(())
    }

    fn fix_directions(&mut self, simplify: bool) {
        let mapped: FxHashSet<String> = self
            .semantic_mapping
            .iter()
            .map(|m| m.argument.name.clone())
            .collect();
        let vs_inputs = &self.vs_inputs;
        self.vs_outputs.retain(|v| !mapped.contains(&v.name));
        self.vs_outputs
            .retain(|v| !vs_inputs.iter().any(|i| i.name == v.name && i.is_output));

        if self.vs_outputs.iter().any(|v| v.has_semantic(POSITION0)) {
            for input in self.vs_inputs.iter_mut().filter(|i| i.has_semantic(POSITION0)) {
                input.is_output = false;
            }
        }

        for input in &mut self.vs_inputs {
            let read_by_pixel = has_named(&self.ps_inputs, &input.name);
            if (!read_by_pixel && !input.has_semantic(POSITION0)) || mapped.contains(&input.name) {
                input.is_output = false;
            }
        }

        for input in &mut self.ps_inputs {
            input.is_output = has_named(&self.ps_outputs, &input.name);
            if let Some(binding) = self.semantic_mapping.iter().find(|m| m.argument.name == input.name) {
                input.semantic = Some(binding.semantic.clone());
            }
        }

        let ps_inputs = &self.ps_inputs;
        let temporaries = &self.temporaries;
        self.ps_outputs
            .retain(|o| !has_named(ps_inputs, &o.name) && !has_named(temporaries, &o.name));

        if simplify {
            for input in &mut self.ps_inputs {
                input.is_output = false;
            }
        }

        let vs_inputs = &self.vs_inputs;
        self.vs_outputs
            .retain(|v| !(v.is_input && has_named(vs_inputs, &v.name)));
    }
}

/// Resolves the composed stage signatures.
///
/// `parts` must already be sorted and pruned. Fails when a vertex input is
/// left without a semantic or when `POSITION0` pixel inputs have no single
/// vertex position to copy from.
pub fn resolve(
    parts: &[MaterialPartDeclaration],
    table: &ArgumentTable,
    simplify: bool,
    allocator: &mut SemanticAllocator,
) -> Result<Signature> {
    let mut signature = Signature::collect(parts, table);

    if simplify {
        signature.demote_unbound_pixel_outputs();
    }
    signature.collapse_duplicate_semantics();
    signature.forward_pixel_inputs();
    dedupe(&mut signature.temporaries);

    if let Some(unbound) = signature.vs_inputs.iter().find(|a| a.semantic.is_none()) {
        return Err(ComposeError::MissingSemantic {
            argument: unbound.name.clone(),
        });
    }

    let ps_inputs = &signature.ps_inputs;
    signature
        .vs_outputs
        .retain(|v| v.has_semantic(POSITION0) || has_named(ps_inputs, &v.name));

    signature.bind_vertex_outputs(allocator)?;
    signature.fix_directions(simplify);
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;
    use crate::graph;
    use crate::lexer::parse_fragment;

    fn run(sources: &[&str], simplify: bool) -> Result<Signature> {
        let mut parts: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(i, src)| parse_fragment(&Fragment::new(format!("f{i}"), *src)).unwrap())
            .collect();
        graph::assign_indices(&mut parts);
        let table = graph::merge_arguments(&mut parts)?;
        graph::mark_producers(&mut parts);
        graph::link_dependencies(&mut parts);
        let parts = graph::eliminate_dead(graph::sort_parts(parts)?, simplify);
        resolve(&parts, &table, simplify, &mut SemanticAllocator::new())
    }

    fn names(list: &[ArgumentDeclaration]) -> Vec<&str> {
        list.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn unsemantic_link_gets_texcoord() {
        let sig = run(
            &[
                "void VertexShader(float3 pos : POSITION0, out float2 uv) { uv = pos.xy; }",
                "void PixelShader(float2 uv, out float4 Color0 : COLOR0) { Color0 = uv.xyxy; }",
            ],
            true,
        )
        .unwrap();

        assert_eq!(names(&sig.vs_inputs), ["pos"]);
        assert!(sig.vs_outputs.is_empty());
        assert_eq!(sig.semantic_mapping.len(), 1);
        assert_eq!(sig.semantic_mapping[0].argument.name, "uv");
        assert_eq!(sig.semantic_mapping[0].semantic, "TEXCOORD0");
        assert_eq!(sig.ps_inputs[0].semantic.as_deref(), Some("TEXCOORD0"));
        assert_eq!(names(&sig.ps_outputs), ["Color0"]);
    }

    #[test]
    fn duplicate_pixel_semantic_keeps_last() {
        let sig = run(
            &[
                "void PixelShader(out float4 First : COLOR0) { First = 0; }",
                "void PixelShader(out float4 Second : COLOR0) { Second = 1; }",
            ],
            false,
        )
        .unwrap();
        assert_eq!(names(&sig.ps_outputs), ["Second"]);
        assert_eq!(names(&sig.temporaries), ["First"]);
    }

    #[test]
    fn pixel_outputs_have_unique_semantics() {
        let sig = run(
            &[
                "void PixelShader(out float4 A : COLOR0, out float4 B : COLOR1) { A = 0; B = 0; }",
                "void PixelShader(out float4 C : COLOR1) { C = 1; }",
                "void PixelShader(out float4 D : COLOR0) { D = 1; }",
            ],
            false,
        )
        .unwrap();
        let mut semantics: Vec<_> = sig.ps_outputs.iter().map(|o| o.semantic.clone()).collect();
        let before = semantics.len();
        semantics.sort();
        semantics.dedup();
        assert_eq!(semantics.len(), before);
        assert_eq!(names(&sig.ps_outputs), ["C", "D"]);
    }

    #[test]
    fn unsemantic_pixel_input_becomes_local_with_default() {
        let sig = run(
            &["void PixelShader(float4 Diffuse, float3 Light = 1, out float4 Color : COLOR0) { Color = Diffuse * float4(Light, 1); }"],
            true,
        )
        .unwrap();
        assert!(sig.ps_inputs.is_empty());
        assert_eq!(names(&sig.temporaries), ["Diffuse", "Light"]);
        assert_eq!(sig.temporaries[1].default_value.as_deref(), Some("1"));
        assert_eq!(sig.temporaries[0].default_value.as_deref(), Some("0"));
    }

    #[test]
    fn semantic_pixel_input_is_forwarded_through_vertex_stage() {
        let sig = run(
            &["void PixelShader(float4 VertexColor : COLOR0, out float4 Color : COLOR0) { Color = VertexColor; }"],
            true,
        )
        .unwrap();
        let forwarded = &sig.vs_inputs[0];
        assert_eq!(forwarded.name, "VertexColor");
        assert!(forwarded.is_input && forwarded.is_output);
        assert!(sig.vs_outputs.is_empty());
        assert_eq!(names(&sig.ps_inputs), ["VertexColor"]);
    }

    #[test]
    fn missing_vertex_semantic_is_fatal() {
        let err = run(
            &[
                "void VertexShader(float3 Tangent, out float4 P : POSITION0) { P = Tangent.xyzz; }",
                "void PixelShader(out float4 Color : COLOR0) { Color = 1; }",
            ],
            true,
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::MissingSemantic { argument } if argument == "Tangent"));
    }

    #[test]
    fn position_input_is_rerouted() {
        let sig = run(
            &[
                "void VertexShader(float4 Position : POSITION0, out float4 ProjectedPosition : POSITION0) { ProjectedPosition = Position; }",
                "void PixelShader(float4 ProjectedPosition : POSITION0, out float4 Color : COLOR0) { Color = ProjectedPosition.z; }",
            ],
            true,
        )
        .unwrap();

        assert_eq!(names(&sig.vs_outputs), ["ProjectedPosition"]);
        assert!(!sig.vs_inputs[0].is_output);
        let binding = &sig.semantic_mapping[0];
        assert_eq!(binding.argument.name, "ProjectedPosition_pos0_");
        assert_eq!(binding.output_name(), "o_ProjectedPosition_pos0_");
        assert_eq!(binding.source_name(), "ProjectedPosition");
        assert_eq!(binding.semantic, "TEXCOORD0");
        assert_eq!(sig.ps_inputs[0].semantic.as_deref(), Some("TEXCOORD0"));
    }

    #[test]
    fn forwarded_position_is_rerouted() {
        let sig = run(
            &["void PixelShader(float4 P : POSITION0, out float4 Color : COLOR0) { Color = P.z; }"],
            true,
        )
        .unwrap();

        assert_eq!(names(&sig.vs_inputs), ["P"]);
        assert!(sig.vs_inputs[0].is_output);
        assert_eq!(sig.semantic_mapping.len(), 1);
        assert_eq!(sig.semantic_mapping[0].argument.name, "P_pos0_");
        assert!(!sig.ps_inputs.iter().any(|p| p.has_semantic(POSITION0)));
    }

    #[test]
    fn two_position_readers_without_a_shared_source_are_rejected() {
        let err = run(
            &[
                "void PixelShader(float4 P : POSITION0, out float4 A) { A = P; }",
                "void PixelShader(float4 Q : POSITION0, float4 A, out float4 Color : COLOR0) { Color = A + Q; }",
            ],
            true,
        )
        .unwrap_err();
        match err {
            ComposeError::PositionReroute { inputs, outputs } => {
                assert_eq!(inputs, ["P", "Q"]);
                assert_eq!(outputs, ["P", "Q"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unread_vertex_outputs_are_dropped() {
        let sig = run(
            &[
                "void VertexShader(float4 Position : POSITION0, out float4 P : POSITION0, out float3 WorldNormal, out float4 Fog : TEXCOORD5) { P = Position; WorldNormal = 0; Fog = 0; }",
                "void PixelShader(out float4 Color : COLOR0) { Color = 1; }",
            ],
            true,
        )
        .unwrap();
        assert_eq!(names(&sig.vs_outputs), ["P"]);
        assert!(sig.semantic_mapping.is_empty());
    }
}
