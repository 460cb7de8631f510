//! Per-build pipeline state.
//!
//! [`BuilderContext`] owns everything one composition produces: the sorted,
//! pruned declarations, the argument table, the resolved signature and each
//! fragment's rename suffix. The semantic allocator and the fragment
//! indices live and die with it, so independent builds may run on separate
//! threads without sharing anything.

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

use crate::arguments::ArgumentTable;
use crate::declaration::MaterialPartDeclaration;
use crate::emit;
use crate::errors::Result;
use crate::fragment::{Fragment, FragmentId};
use crate::graph;
use crate::lexer::parse_fragment;
use crate::resolve::{Signature, resolve};
use crate::semantic::SemanticAllocator;

/// Knobs of one composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Drop fragments with no path to a pixel output and collapse
    /// pass-through values into locals.
    pub simplify: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self { simplify: true }
    }
}

#[derive(Debug, Clone)]
pub struct BuilderContext {
    parts: Vec<MaterialPartDeclaration>,
    arguments: ArgumentTable,
    signature: Signature,
    suffixes: FxHashMap<FragmentId, String>,
}

impl BuilderContext {
    /// Runs the whole front end: parse, merge, link, sort, prune, resolve.
    pub fn build(fragments: &[Fragment], options: &ComposeOptions) -> Result<Self> {
        let mut parts = fragments
            .iter()
            .map(parse_fragment)
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Parsed {} fragments", parts.len());

        graph::assign_indices(&mut parts);
        let arguments = graph::merge_arguments(&mut parts)?;
        graph::mark_producers(&mut parts);
        graph::link_dependencies(&mut parts);
        let suffixes = parts.iter().map(|p| (p.id.clone(), p.suffix())).collect();

        let parts = graph::sort_parts(parts)?;
        if log::log_enabled!(log::Level::Debug) {
            let order: Vec<_> = parts.iter().map(|p| p.id.as_str()).collect();
            log::debug!("Fragment order: {}", order.join(" -> "));
        }
        let parts = graph::eliminate_dead(parts, options.simplify);

        let mut allocator = SemanticAllocator::new();
        let signature = resolve(&parts, &arguments, options.simplify, &mut allocator)?;

        Ok(Self {
            parts,
            arguments,
            signature,
            suffixes,
        })
    }

    /// Sorted, pruned fragment declarations in emission order.
    #[inline]
    #[must_use]
    pub fn parts(&self) -> &[MaterialPartDeclaration] {
        &self.parts
    }

    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &ArgumentTable {
        &self.arguments
    }

    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// `false` when resolution left no pixel output, i.e. nothing to build.
    #[inline]
    #[must_use]
    pub fn has_output(&self) -> bool {
        !self.signature.ps_outputs.is_empty()
    }

    /// The `_<index>` suffix the fragment's locals are renamed with.
    ///
    /// Also answers for fragments eliminated as dead code.
    #[must_use]
    pub fn parameter_suffix(&self, fragment: &FragmentId) -> Option<&str> {
        self.suffixes.get(fragment).map(String::as_str)
    }

    /// Fragment code plus the `VS`/`PS` drivers, without a technique.
    #[must_use]
    pub fn emit_body(&self) -> String {
        emit::emit_body(&self.parts, &self.arguments, &self.signature, "VS", "PS")
    }

    /// The complete program compiled for `profile` (e.g. `"2_0"`).
    #[must_use]
    pub fn emit(&self, profile: &str) -> String {
        emit::emit_program(&self.parts, &self.arguments, &self.signature, profile)
    }
}

/// Content fingerprint of generated source, used as a cache key.
#[inline]
#[must_use]
pub fn fingerprint(source: &str) -> u128 {
    xxh3_128(source.as_bytes())
}

/// A successful composition with at least one pixel output.
#[derive(Debug, Clone)]
pub struct ComposedShader {
    context: BuilderContext,
    body: String,
}

impl ComposedShader {
    #[inline]
    #[must_use]
    pub fn context(&self) -> &BuilderContext {
        &self.context
    }

    /// Fragment code plus drivers; identical for every profile.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Fingerprint of [`body`](Self::body).
    #[must_use]
    pub fn fingerprint(&self) -> u128 {
        fingerprint(&self.body)
    }

    #[must_use]
    pub fn source_for_profile(&self, profile: &str) -> String {
        let mut source = String::with_capacity(self.body.len() + 160);
        source.push_str(&self.body);
        source.push('\n');
        source.push_str(&emit::emit_technique(profile));
        source
    }
}

/// Entry point of the composer.
pub struct Composer;

impl Composer {
    /// Composes `fragments` (in declaration order) into one program.
    ///
    /// Returns `Ok(None)` when the result has no pixel output.
    pub fn compose(fragments: &[Fragment], options: &ComposeOptions) -> Result<Option<ComposedShader>> {
        let context = BuilderContext::build(fragments, options)?;
        if !context.has_output() {
            log::debug!("Composition of {} fragments has no pixel output", fragments.len());
            return Ok(None);
        }
        let body = context.emit_body();
        Ok(Some(ComposedShader { context, body }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(sources: &[(&str, &str)]) -> Vec<Fragment> {
        sources.iter().map(|(id, src)| Fragment::new(*id, *src)).collect()
    }

    #[test]
    fn producer_consumer_program() {
        let _ = env_logger::builder().is_test(true).try_init();

        let shader = Composer::compose(
            &fragments(&[
                ("a", "void VertexShader(float3 pos : POSITION0, out float2 uv) { uv = pos.xy; }"),
                ("b", "void PixelShader(float2 uv, out float4 Color0 : COLOR0) { Color0 = uv.xyxy; }"),
            ]),
            &ComposeOptions::default(),
        )
        .unwrap()
        .unwrap();

        let deps = &shader.context().parts()[1].dependencies;
        assert_eq!(deps.as_slice(), &[0]);

        let source = shader.source_for_profile("2_0");
        assert!(source.contains("void VertexShader_0(float3 pos : POSITION0, out float2 uv)"));
        assert!(source.contains("void VS(float3 pos : POSITION0, out float2 o_uv : TEXCOORD0)"));
        assert!(source.contains("    float2 uv = 0;\n"));
        assert!(source.contains("    VertexShader_0(pos, uv);\n"));
        assert!(source.contains("    o_uv = uv;\n"));
        assert!(source.contains("void PS(float2 uv : TEXCOORD0, out float4 Color0 : COLOR0)"));
        assert!(source.contains("    PixelShader_1(uv, Color0);\n"));
        assert!(source.ends_with("compile ps_2_0 PS();\n    }\n}\n"));
        assert!(source.contains("    o_uv = uv;\n}\n\nvoid PS("));
        assert!(!source.contains("\n\n\n"));
        assert!(!source.contains("{\n\n"));
    }

    #[test]
    fn no_pixel_output_is_nothing_to_build() {
        let result = Composer::compose(
            &fragments(&[("t", "void VertexShader(float4 p : POSITION0, out float4 o : POSITION0) { o = p; }")]),
            &ComposeOptions::default(),
        )
        .unwrap();
        assert!(result.is_none());
        assert!(Composer::compose(&[], &ComposeOptions::default()).unwrap().is_none());
    }

    #[test]
    fn suffixes_cover_eliminated_fragments() {
        let frags = fragments(&[
            ("dead", "void PixelShader(out float4 Unused) { Unused = 0; }"),
            ("live", "void PixelShader(out float4 Color : COLOR0) { Color = 1; }"),
        ]);
        let context = BuilderContext::build(&frags, &ComposeOptions::default()).unwrap();
        assert_eq!(context.parts().len(), 1);
        assert_eq!(context.parameter_suffix(&"dead".into()), Some("_0"));
        assert_eq!(context.parameter_suffix(&"live".into()), Some("_1"));
        assert_eq!(context.parameter_suffix(&"missing".into()), None);
    }

    #[test]
    fn fingerprint_tracks_body() {
        let frags = fragments(&[("p", "void PixelShader(out float4 Color : COLOR0) { Color = 1; }")]);
        let a = Composer::compose(&frags, &ComposeOptions::default()).unwrap().unwrap();
        let b = Composer::compose(&frags, &ComposeOptions::default()).unwrap().unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), fingerprint(a.body()));
        assert_ne!(fingerprint(&a.source_for_profile("2_0")), fingerprint(&a.source_for_profile("3_0")));
    }
}
