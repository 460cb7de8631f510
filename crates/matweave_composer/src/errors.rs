//! Error Types
//!
//! Every failure the composer can raise. All of them abort the whole build
//! before any external compiler is invoked; none is recovered locally.
//!
//! "Nothing to build" (a composition that yields no pixel-shader output) is
//! deliberately **not** an error: [`Composer::compose`] reports it as
//! `Ok(None)`.
//!
//! [`Composer::compose`]: crate::Composer::compose

use std::fmt;

use thiserror::Error;

use crate::fragment::FragmentId;

/// Why a single fragment could not be turned into a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// Neither `VertexShader` nor `PixelShader` was found.
    NoEntryPoint,
    /// An entry point was declared more than once.
    DuplicateEntryPoint(&'static str),
    /// An entry point returns something other than `void`.
    NonVoidReturn {
        function: &'static str,
        return_type: String,
    },
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEntryPoint => f.write_str("cannot find function PixelShader or VertexShader"),
            Self::DuplicateEntryPoint(name) => write!(f, "function {name} is declared more than once"),
            Self::NonVoidReturn {
                function,
                return_type,
            } => write!(
                f,
                "function {function} returns `{return_type}`; entry points must return void, use out parameters instead"
            ),
        }
    }
}

/// Which field of a merged argument disagreed between two fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Type,
    Semantic,
    DefaultValue,
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Semantic => "semantic",
            Self::DefaultValue => "default value",
        })
    }
}

/// The composer error type.
#[derive(Error, Debug)]
pub enum ComposeError {
    // ========================================================================
    // Fragment Errors
    // ========================================================================
    /// A fragment's source has no usable entry point.
    #[error("Fragment `{fragment}` failed to parse: {reason}")]
    FragmentParse {
        fragment: FragmentId,
        reason: ParseFailure,
    },

    // ========================================================================
    // Linking Errors
    // ========================================================================
    /// Two fragments declare the same argument with irreconcilable fields.
    #[error(
        "Parameter `{name}` has two different {field}s: `{first_value}` in `{first}` and `{second_value}` in `{second}`"
    )]
    ArgumentConflict {
        name: String,
        field: ConflictField,
        first: FragmentId,
        first_value: String,
        second: FragmentId,
        second_value: String,
    },

    /// The fragment dependency graph has no topological order.
    #[error("Cyclic dependency between fragments: {}", join_ids(.fragments))]
    CyclicDependency { fragments: Vec<FragmentId> },

    // ========================================================================
    // Signature Errors
    // ========================================================================
    /// A composed vertex-shader input cannot be bound to a hardware slot.
    #[error("Cannot find semantics for vertex shader input `{argument}`")]
    MissingSemantic { argument: String },

    /// Pixel inputs read `POSITION0` but the vertex stage does not write
    /// exactly one position to copy from.
    #[error(
        "Cannot reroute POSITION0 to pixel shader inputs [{}]: vertex shader writes position to [{}]",
        .inputs.join(", "),
        .outputs.join(", ")
    )]
    PositionReroute {
        inputs: Vec<String>,
        outputs: Vec<String>,
    },
}

fn join_ids(ids: &[FragmentId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Alias for `Result<T, ComposeError>`.
pub type Result<T> = std::result::Result<T, ComposeError>;
