//! Material Group Builder
//!
//! Drives one material group through composition and compilation:
//!
//! 1. complete the group with its dependent parts for the usage,
//! 2. gather one fragment per contributing part, tagged `<name>#<position>`,
//! 3. compose them into a program (`None` when nothing reaches a pixel
//!    output),
//! 4. compile along the profile ladder, falling back to the next profile on
//!    failure and consulting the [`EffectCache`] first,
//! 5. write diagnostics artifacts when a directory is configured.

use matweave_composer::{ComposedShader, Composer, Fragment, FragmentId, fingerprint};

use crate::artifacts::ArtifactWriter;
use crate::cache::EffectCache;
use crate::compiler::{CompiledEffect, ShaderCompiler};
use crate::errors::{BuildError, Result};
use crate::group::{MaterialGroup, resolve_parts};
use crate::profile::ShaderProfile;
use crate::registry::PartRegistry;
use crate::settings::BuildSettings;
use crate::usage::MaterialUsage;

/// A compiled effect for one material group and usage.
#[derive(Debug, Clone)]
pub struct BuiltEffect {
    pub usage: MaterialUsage,
    /// The profile that compiled successfully.
    pub profile: ShaderProfile,
    pub bytecode: Vec<u8>,
    pub disassembly: Option<String>,
    /// Generated source submitted to the compiler.
    pub source: String,
    /// Fingerprint of [`source`](Self::source).
    pub fingerprint: u128,
    /// Parameter suffix of every gathered fragment, in gather order.
    pub parameter_suffixes: Vec<(FragmentId, String)>,
}

impl BuiltEffect {
    /// Suffix appended to the locals of the part at `position` in the group.
    #[must_use]
    pub fn parameter_suffix_of(&self, position: usize) -> Option<&str> {
        let tag = format!("#{position}");
        self.parameter_suffixes
            .iter()
            .find(|(id, _)| id.as_str().ends_with(&tag))
            .map(|(_, suffix)| suffix.as_str())
    }
}

pub struct MaterialGroupBuilder<C: ShaderCompiler> {
    settings: BuildSettings,
    registry: PartRegistry,
    compiler: C,
    cache: EffectCache,
    artifacts: Option<ArtifactWriter>,
}

impl<C: ShaderCompiler> MaterialGroupBuilder<C> {
    /// A builder with default settings and the built-in part registry.
    #[must_use]
    pub fn new(compiler: C) -> Self {
        Self {
            settings: BuildSettings::default(),
            registry: PartRegistry::builtin(),
            compiler,
            cache: EffectCache::new(),
            artifacts: None,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: BuildSettings) -> Self {
        self.artifacts = settings.diagnostics_dir.clone().map(ArtifactWriter::new);
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: PartRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut PartRegistry {
        &mut self.registry
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &EffectCache {
        &self.cache
    }

    #[inline]
    #[must_use]
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Builds `group` for every usage in `usages`, skipping usages the group
    /// has no output for.
    pub fn build(
        &mut self,
        group: &mut MaterialGroup,
        usages: &[MaterialUsage],
    ) -> Result<Vec<BuiltEffect>> {
        let mut effects = Vec::with_capacity(usages.len());
        for &usage in usages {
            if let Some(effect) = self.build_by_usage(group, usage)? {
                effects.push(effect);
            }
        }
        Ok(effects)
    }

    /// Builds `group` for `usage`.
    ///
    /// Dependent parts are inserted into `group` in place. Returns `Ok(None)`
    /// when the composed program has no pixel output.
    pub fn build_by_usage(
        &mut self,
        group: &mut MaterialGroup,
        usage: MaterialUsage,
    ) -> Result<Option<BuiltEffect>> {
        if self.settings.profiles.is_empty() {
            return Err(BuildError::NoProfiles);
        }

        resolve_parts(group, usage, &self.registry)?;
        let fragments = gather_fragments(group, usage)?;
        log::debug!(
            "Composing material group `{}` for {usage} from {} fragments",
            group.name,
            fragments.len()
        );

        let Some(shader) = Composer::compose(&fragments, &self.settings.compose_options())? else {
            log::debug!("Material group `{}` has no output for {usage}", group.name);
            return Ok(None);
        };

        let artifact_name = format!("{}_{usage}", group.name);
        let (profile, source, effect) = self.compile(&shader, &artifact_name)?;

        if let Some(writer) = &self.artifacts {
            writer.write(&artifact_name, &source, effect.disassembly.as_deref())?;
        }

        let fingerprint = fingerprint(&source);
        log::info!(
            "Built material group `{}` for {usage} at profile {profile} ({fingerprint:032x})",
            group.name
        );

        let parameter_suffixes = fragments
            .iter()
            .filter_map(|fragment| {
                let suffix = shader.context().parameter_suffix(&fragment.id)?;
                Some((fragment.id.clone(), suffix.to_owned()))
            })
            .collect();

        Ok(Some(BuiltEffect {
            usage,
            profile,
            bytecode: effect.bytecode,
            disassembly: effect.disassembly,
            source,
            fingerprint,
            parameter_suffixes,
        }))
    }

    /// Walks the profile ladder until one profile compiles.
    fn compile(
        &mut self,
        shader: &ComposedShader,
        artifact_name: &str,
    ) -> Result<(ShaderProfile, String, CompiledEffect)> {
        let profiles = &self.settings.profiles;
        let use_cache = self.settings.cache_compiled;

        for (i, &profile) in profiles.iter().enumerate() {
            let source = shader.source_for_profile(profile.as_str());
            let key = fingerprint(&source);

            if use_cache && let Some(effect) = self.cache.get(key) {
                log::debug!("Reusing cached effect {key:032x} for `{artifact_name}`");
                return Ok((profile, source, effect.clone()));
            }

            match self.compiler.compile(&source, profile) {
                Ok(effect) => {
                    if use_cache {
                        self.cache.insert(key, effect.clone());
                    }
                    return Ok((profile, source, effect));
                }
                Err(failure) if i + 1 < profiles.len() => {
                    log::warn!(
                        "Compiling `{artifact_name}` at profile {profile} failed, retrying at {}: {failure}",
                        profiles[i + 1]
                    );
                }
                Err(failure) => {
                    log::error!("Compiling `{artifact_name}` at profile {profile} failed: {failure}");
                    if let Some(writer) = &self.artifacts
                        && let Err(err) = writer.write(artifact_name, &source, None)
                    {
                        log::warn!("Failed to write diagnostics for `{artifact_name}`: {err}");
                    }
                    return Err(BuildError::Compile {
                        profile,
                        message: failure.message,
                        shader_source: source,
                    });
                }
            }
        }

        Err(BuildError::NoProfiles)
    }
}

/// One fragment per part with code for `usage`, in group order.
fn gather_fragments(group: &MaterialGroup, usage: MaterialUsage) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::with_capacity(group.parts.len());
    for (position, part) in group.parts.iter().enumerate() {
        if let Some(code) = part.shader_code(usage)? {
            fragments.push(Fragment::new(format!("{}#{position}", part.name()), code));
        }
    }
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::builtin::BuiltinPart;
    use crate::compiler::CompileFailure;

    /// Records every profile it was asked for; rejects the listed ones.
    struct RecordingCompiler {
        reject: Vec<ShaderProfile>,
        calls: RefCell<Vec<ShaderProfile>>,
    }

    impl RecordingCompiler {
        fn rejecting(reject: &[ShaderProfile]) -> Self {
            Self {
                reject: reject.to_vec(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ShaderCompiler for RecordingCompiler {
        fn compile(
            &self,
            source: &str,
            profile: ShaderProfile,
        ) -> std::result::Result<CompiledEffect, CompileFailure> {
            self.calls.borrow_mut().push(profile);
            if self.reject.contains(&profile) {
                return Err(CompileFailure::new(format!("error X5608: rejected {profile}")));
            }
            Ok(CompiledEffect {
                bytecode: source.len().to_le_bytes().to_vec(),
                disassembly: Some(format!("// {profile}")),
            })
        }
    }

    fn lit_group() -> MaterialGroup {
        MaterialGroup::new("lit")
            .with_part(BuiltinPart::diffuse(true, false, false))
            .with_part(BuiltinPart::directional_light())
    }

    #[test]
    fn builds_at_lowest_profile() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut builder = MaterialGroupBuilder::new(RecordingCompiler::rejecting(&[]));
        let mut group = lit_group();
        let effect = builder.build_by_usage(&mut group, MaterialUsage::Default).unwrap().unwrap();

        assert_eq!(effect.profile, ShaderProfile::Sm2_0);
        assert!(effect.source.contains("compile ps_2_0 PS();"));
        assert_eq!(effect.fingerprint, fingerprint(&effect.source));
        assert_eq!(effect.parameter_suffixes.len(), 4);
        assert_eq!(effect.parameter_suffix_of(0), Some("_0"));
        assert_eq!(*builder.compiler().calls.borrow(), [ShaderProfile::Sm2_0]);
    }

    #[test]
    fn falls_back_to_next_profile() {
        let mut builder =
            MaterialGroupBuilder::new(RecordingCompiler::rejecting(&[ShaderProfile::Sm2_0]));
        let effect = builder
            .build_by_usage(&mut lit_group(), MaterialUsage::Default)
            .unwrap()
            .unwrap();

        assert_eq!(effect.profile, ShaderProfile::Sm3_0);
        assert!(effect.source.contains("compile vs_3_0 VS();"));
        assert_eq!(
            *builder.compiler().calls.borrow(),
            [ShaderProfile::Sm2_0, ShaderProfile::Sm3_0]
        );
    }

    #[test]
    fn failure_at_last_profile_is_fatal() {
        let mut builder = MaterialGroupBuilder::new(RecordingCompiler::rejecting(&ShaderProfile::ALL));
        let err = builder
            .build_by_usage(&mut lit_group(), MaterialUsage::Default)
            .unwrap_err();

        match err {
            BuildError::Compile { profile, message, shader_source } => {
                assert_eq!(profile, ShaderProfile::Sm3_0);
                assert_eq!(message, "error X5608: rejected 3_0");
                assert!(shader_source.contains("compile ps_3_0 PS();"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn identical_source_compiles_once() {
        let mut builder = MaterialGroupBuilder::new(RecordingCompiler::rejecting(&[]));
        let first = builder.build_by_usage(&mut lit_group(), MaterialUsage::Default).unwrap().unwrap();
        let second = builder.build_by_usage(&mut lit_group(), MaterialUsage::Default).unwrap().unwrap();

        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.bytecode, second.bytecode);
        assert_eq!(builder.compiler().calls.borrow().len(), 1);
        assert_eq!(builder.cache().len(), 1);
    }

    #[test]
    fn cache_can_be_disabled() {
        let settings = BuildSettings {
            cache_compiled: false,
            ..BuildSettings::default()
        };
        let mut builder =
            MaterialGroupBuilder::new(RecordingCompiler::rejecting(&[])).with_settings(settings);
        builder.build_by_usage(&mut lit_group(), MaterialUsage::Default).unwrap();
        builder.build_by_usage(&mut lit_group(), MaterialUsage::Default).unwrap();

        assert_eq!(builder.compiler().calls.borrow().len(), 2);
        assert!(builder.cache().is_empty());
    }

    #[test]
    fn usage_without_output_builds_nothing() {
        let mut builder = MaterialGroupBuilder::new(RecordingCompiler::rejecting(&[]));
        let effect = builder.build_by_usage(&mut lit_group(), MaterialUsage::Normal).unwrap();
        assert!(effect.is_none());
        assert!(builder.compiler().calls.borrow().is_empty());
    }

    #[test]
    fn empty_ladder_is_an_error() {
        let settings = BuildSettings {
            profiles: Vec::new(),
            ..BuildSettings::default()
        };
        let mut builder =
            MaterialGroupBuilder::new(RecordingCompiler::rejecting(&[])).with_settings(settings);
        assert!(matches!(
            builder.build_by_usage(&mut lit_group(), MaterialUsage::Default),
            Err(BuildError::NoProfiles)
        ));
    }

    #[test]
    fn gathers_only_contributing_parts() {
        let mut group = lit_group();
        resolve_parts(&mut group, MaterialUsage::Depth, &PartRegistry::builtin()).unwrap();
        let fragments = gather_fragments(&group, MaterialUsage::Depth).unwrap();
        let ids: Vec<_> = fragments.iter().map(|f| f.id.to_string()).collect();
        assert_eq!(ids, ["VertexTransform#2", "DepthOutput#3"]);
    }
}
