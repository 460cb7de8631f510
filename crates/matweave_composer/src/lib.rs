//! # Matweave Composer
//!
//! Links independently authored shader fragments into one vertex + pixel
//! program.
//!
//! A fragment declares top-level variables, helper functions and at most one
//! `VertexShader` and one `PixelShader` function. Fragments never reference
//! each other by name; they communicate through stage-function arguments
//! that share a name. The composer:
//!
//! 1. parses every fragment ([`parse_fragment`]),
//! 2. merges same-named arguments into one canonical table ([`ArgumentTable`]),
//! 3. links fragments whose outputs feed other fragments' inputs and orders
//!    them ([`topological_sort`]),
//! 4. drops fragments that cannot reach a pixel output,
//! 5. resolves the `VS`/`PS` signatures and binds every value crossing a
//!    stage boundary to a hardware semantic,
//! 6. emits the renamed fragment code, the `VS`/`PS` drivers and a
//!    technique block.
//!
//! ```
//! use matweave_composer::{ComposeOptions, Composer, Fragment};
//!
//! let fragments = [
//!     Fragment::new("transform", "void VertexShader(float4 p : POSITION0, out float4 o : POSITION0) { o = p; }"),
//!     Fragment::new("color", "void PixelShader(out float4 Color : COLOR0) { Color = 1; }"),
//! ];
//! let shader = Composer::compose(&fragments, &ComposeOptions::default())?.expect("has output");
//! assert!(shader.source_for_profile("3_0").contains("compile ps_3_0 PS();"));
//! # Ok::<(), matweave_composer::ComposeError>(())
//! ```
//!
//! Everything is in memory and synchronous. All per-build state lives in a
//! [`BuilderContext`].

pub mod arguments;
pub mod context;
pub mod declaration;
pub mod emit;
pub mod errors;
pub mod fragment;
mod graph;
pub mod lexer;
pub mod rename;
pub mod resolve;
pub mod semantic;
pub mod sort;

pub use arguments::ArgumentTable;
pub use context::{BuilderContext, ComposeOptions, ComposedShader, Composer, fingerprint};
pub use declaration::{
    ArgumentDeclaration, FunctionDeclaration, MaterialPartDeclaration, ShaderStage,
    VariableDeclaration,
};
pub use errors::{ComposeError, ConflictField, ParseFailure, Result};
pub use fragment::{Fragment, FragmentId};
pub use lexer::parse_fragment;
pub use rename::{RenameMode, rename, rename_occurrence};
pub use resolve::{SemanticBinding, Signature};
pub use semantic::SemanticAllocator;
pub use sort::topological_sort;
