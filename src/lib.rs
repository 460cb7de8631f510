//! # Matweave
//!
//! Links independently authored shader fragments into one compilable
//! vertex + pixel effect per material usage.
//!
//! The workspace is split in two:
//!
//! - [`composer`] parses fragments, links them through same-named
//!   arguments, orders them, drops dead ones and emits the program. Pure and
//!   in-memory.
//! - [`build`] completes material groups with their dependent parts, renders
//!   built-in fragments, compiles along a profile ladder and caches results.
//!
//! The most common types are re-exported at the crate root.

pub use matweave_build as build;
pub use matweave_composer as composer;

pub use matweave_build::{
    BuildError, BuildSettings, BuiltEffect, BuiltinPart, CompileFailure, CompiledEffect,
    MaterialGroup, MaterialGroupBuilder, MaterialPart, MaterialUsage, PartKind, PartRegistry,
    ShaderCompiler, ShaderProfile, SourcePart,
};
pub use matweave_composer::{
    BuilderContext, ComposeError, ComposeOptions, ComposedShader, Composer, Fragment, FragmentId,
};
