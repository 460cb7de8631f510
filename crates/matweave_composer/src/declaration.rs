//! Parsed fragment declarations.
//!
//! The structures the lexer produces and the graph / resolver passes mutate.
//! Everything is plain owned data; cross-fragment links are expressed through
//! fragment indices, never references.

use std::fmt;

use smallvec::SmallVec;

use crate::fragment::FragmentId;
use crate::rename::{self, RenameMode};

/// Name of the vertex-stage entry point a fragment may define.
pub const VERTEX_SHADER: &str = "VertexShader";
/// Name of the pixel-stage entry point a fragment may define.
pub const PIXEL_SHADER: &str = "PixelShader";

/// One of the two programmable stages a fragment can contribute to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    /// Name of the fragment function implementing this stage.
    #[inline]
    #[must_use]
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::Vertex => VERTEX_SHADER,
            Self::Pixel => PIXEL_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Pixel => "pixel",
        })
    }
}

/// A top-level variable statement, kept verbatim for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub ty: String,
    pub name: String,
    pub body: String,
}

/// One formal parameter of a stage function.
///
/// Identity across fragments is the `name` alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDeclaration {
    pub name: String,
    pub ty: String,
    pub semantic: Option<String>,
    pub default_value: Option<String>,
    pub is_input: bool,
    pub is_output: bool,
}

impl ArgumentDeclaration {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            semantic: None,
            default_value: None,
            is_input: true,
            is_output: false,
        }
    }

    #[must_use]
    pub fn with_semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = Some(semantic.into());
        self
    }

    #[must_use]
    pub fn output(mut self) -> Self {
        self.is_input = false;
        self.is_output = true;
        self
    }

    #[must_use]
    pub fn inout(mut self) -> Self {
        self.is_input = true;
        self.is_output = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn has_semantic(&self, semantic: &str) -> bool {
        self.semantic.as_deref() == Some(semantic)
    }
}

/// Renders the argument as a stage parameter: `[inout |out ]Type Name[ : Semantic]`.
impl fmt::Display for ArgumentDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_output {
            f.write_str(if self.is_input { "inout " } else { "out " })?;
        }
        write!(f, "{} {}", self.ty, self.name)?;
        if let Some(semantic) = &self.semantic {
            write!(f, " : {semantic}")?;
        }
        Ok(())
    }
}

/// A parsed top-level function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub return_type: String,
    pub arguments: Vec<ArgumentDeclaration>,
    /// Full source text from the return type to the closing brace.
    pub body: String,
    /// Best-effort textual detection of a `clip(` call in the body.
    ///
    /// Substring match only: a commented-out call or an identifier ending in
    /// `clip` also counts. Over-detection only keeps more code alive.
    pub contains_clip: bool,
}

impl FunctionDeclaration {
    /// Renders the call statement used by the `VS`/`PS` drivers.
    #[must_use]
    pub fn invocation(&self, suffix: &str) -> String {
        let args = self
            .arguments
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("    {}{suffix}({args});", self.name)
    }
}

/// Everything one fragment declares, plus the per-build graph state.
#[derive(Debug, Clone)]
pub struct MaterialPartDeclaration {
    pub id: FragmentId,
    /// Position in declaration order; rename suffix and sort key.
    pub index: usize,
    pub variables: Vec<VariableDeclaration>,
    pub functions: Vec<FunctionDeclaration>,
    pub(crate) vertex_shader: Option<usize>,
    pub(crate) pixel_shader: Option<usize>,
    pub is_vertex_shader_output_producer: bool,
    pub is_pixel_shader_output_producer: bool,
    /// Indices of the fragments this one reads values from.
    pub dependencies: SmallVec<[usize; 4]>,
    /// Reachability mark used by dead-code elimination.
    pub tagged: bool,
}

impl MaterialPartDeclaration {
    #[inline]
    #[must_use]
    pub fn vertex_shader(&self) -> Option<&FunctionDeclaration> {
        self.vertex_shader.map(|i| &self.functions[i])
    }

    #[inline]
    #[must_use]
    pub fn pixel_shader(&self) -> Option<&FunctionDeclaration> {
        self.pixel_shader.map(|i| &self.functions[i])
    }

    #[inline]
    #[must_use]
    pub fn stage(&self, stage: ShaderStage) -> Option<&FunctionDeclaration> {
        match stage {
            ShaderStage::Vertex => self.vertex_shader(),
            ShaderStage::Pixel => self.pixel_shader(),
        }
    }

    pub(crate) fn stage_mut(&mut self, stage: ShaderStage) -> Option<&mut FunctionDeclaration> {
        let slot = match stage {
            ShaderStage::Vertex => self.vertex_shader,
            ShaderStage::Pixel => self.pixel_shader,
        };
        slot.map(move |i| &mut self.functions[i])
    }

    /// Arguments of this fragment's function for `stage` (empty if absent).
    pub fn stage_arguments(&self, stage: ShaderStage) -> impl Iterator<Item = &ArgumentDeclaration> {
        self.stage(stage).into_iter().flat_map(|f| f.arguments.iter())
    }

    /// Suffix appended to every local name of this fragment.
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> String {
        format!("_{}", self.index)
    }

    /// Renders the fragment's variables and functions, one per line, with
    /// every local name suffixed so independently authored fragments can be
    /// concatenated without symbol collisions.
    #[must_use]
    pub fn render(&self) -> String {
        let suffix = self.suffix();
        let mut out = String::new();

        for variable in &self.variables {
            let mut text = variable.body.clone();
            for local in &self.variables {
                text = rename::rename_occurrence(&text, &local.name, &suffix, RenameMode::Last);
            }
            out.push_str(text.trim());
            out.push('\n');
        }

        let names: Vec<&str> = self
            .variables
            .iter()
            .map(|v| v.name.as_str())
            .chain(self.functions.iter().map(|f| f.name.as_str()))
            .collect();
        for function in &self.functions {
            out.push_str(rename::rename(&function.body, names.iter().copied(), &suffix).trim());
            out.push('\n');
        }
        out
    }
}
