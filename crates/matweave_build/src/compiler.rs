//! External shader compiler boundary.
//!
//! The actual compiler (fxc, a service, a test double) is supplied by the
//! embedding application. Any `Fn(&str, ShaderProfile) -> Result<..>`
//! closure is a compiler.

use thiserror::Error;

use crate::profile::ShaderProfile;

/// Compiled output of one effect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledEffect {
    pub bytecode: Vec<u8>,
    /// Human-readable listing, written next to the source when diagnostics
    /// are enabled.
    pub disassembly: Option<String>,
}

/// A compiler rejection, carried verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileFailure {
    pub message: String,
}

impl CompileFailure {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait ShaderCompiler {
    fn compile(
        &self,
        source: &str,
        profile: ShaderProfile,
    ) -> Result<CompiledEffect, CompileFailure>;
}

impl<F> ShaderCompiler for F
where
    F: Fn(&str, ShaderProfile) -> Result<CompiledEffect, CompileFailure>,
{
    fn compile(
        &self,
        source: &str,
        profile: ShaderProfile,
    ) -> Result<CompiledEffect, CompileFailure> {
        self(source, profile)
    }
}
