//! Error Types
//!
//! [`BuildError`] covers every way building a material group can fail:
//! composition errors raised by the composer before any compiler runs,
//! compiler failures at the last profile of the ladder, and the driver's own
//! template, I/O and configuration failures.
//!
//! A group that composes to nothing (no pixel output) is not an error;
//! [`MaterialGroupBuilder::build_by_usage`] returns `Ok(None)`.
//!
//! [`MaterialGroupBuilder::build_by_usage`]: crate::MaterialGroupBuilder::build_by_usage

use matweave_composer::ComposeError;
use thiserror::Error;

use crate::part::PartKind;
use crate::profile::ShaderProfile;

/// The build driver error type.
#[derive(Error, Debug)]
pub enum BuildError {
    // ========================================================================
    // Composition Errors
    // ========================================================================
    /// Parsing, linking or resolving the fragments failed.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    // ========================================================================
    // Compiler Errors
    // ========================================================================
    /// The external compiler rejected the program at the highest profile.
    ///
    /// `message` is the compiler's diagnostic, unmodified; `shader_source`
    /// is the program that was submitted.
    #[error("Shader compilation failed for profile {profile}: {message}")]
    Compile {
        profile: ShaderProfile,
        message: String,
        shader_source: String,
    },

    /// The settings list no profile to compile for.
    #[error("No shader profile configured")]
    NoProfiles,

    // ========================================================================
    // Part Errors
    // ========================================================================
    /// A dependent part kind has no factory in the registry.
    #[error("No factory registered for material part kind {0}")]
    UnknownPartKind(PartKind),

    /// A built-in fragment template failed to render.
    #[error("Fragment template error: {0}")]
    Template(#[from] minijinja::Error),

    // ========================================================================
    // Environment Errors
    // ========================================================================
    /// Writing diagnostics artifacts failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Build settings could not be parsed.
    #[error("Invalid build settings: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Alias for `Result<T, BuildError>`.
pub type Result<T> = std::result::Result<T, BuildError>;
