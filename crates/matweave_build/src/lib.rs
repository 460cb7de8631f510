//! # Matweave Build
//!
//! The build driver around [`matweave_composer`]. It turns a
//! [`MaterialGroup`] (an ordered list of [`MaterialPart`]s) into one compiled
//! effect per [`MaterialUsage`]:
//!
//! - missing dependent parts are inserted through a [`PartRegistry`],
//! - built-in parts render their fragments from embedded templates,
//! - the composed program is compiled by a user-supplied [`ShaderCompiler`]
//!   along a [`ShaderProfile`] ladder,
//! - compiled effects are cached by source fingerprint and, optionally,
//!   written to a diagnostics directory.
//!
//! ```
//! use matweave_build::{
//!     BuiltinPart, CompileFailure, CompiledEffect, MaterialGroup, MaterialGroupBuilder,
//!     MaterialUsage, ShaderProfile,
//! };
//!
//! let compiler = |source: &str, _profile: ShaderProfile| -> Result<CompiledEffect, CompileFailure> {
//!     Ok(CompiledEffect { bytecode: source.as_bytes().to_vec(), disassembly: None })
//! };
//! let mut builder = MaterialGroupBuilder::new(compiler);
//! let mut group = MaterialGroup::new("stone").with_part(BuiltinPart::diffuse(true, false, false));
//!
//! let effect = builder.build_by_usage(&mut group, MaterialUsage::Default)?.expect("has output");
//! assert_eq!(effect.profile, ShaderProfile::Sm2_0);
//! # Ok::<(), matweave_build::BuildError>(())
//! ```

pub mod artifacts;
pub mod builder;
pub mod builtin;
pub mod cache;
pub mod compiler;
pub mod defines;
pub mod errors;
pub mod group;
pub mod library;
pub mod part;
pub mod profile;
pub mod registry;
pub mod settings;
pub mod usage;

pub use artifacts::ArtifactWriter;
pub use builder::{BuiltEffect, MaterialGroupBuilder};
pub use builtin::BuiltinPart;
pub use cache::EffectCache;
pub use compiler::{CompileFailure, CompiledEffect, ShaderCompiler};
pub use defines::FragmentDefines;
pub use errors::{BuildError, Result};
pub use group::{MaterialGroup, resolve_parts};
pub use library::{fragment_names, render_fragment};
pub use part::{MaterialPart, PartKind, SourcePart};
pub use profile::ShaderProfile;
pub use registry::{PartFactory, PartRegistry};
pub use settings::BuildSettings;
pub use usage::MaterialUsage;
