//! Fragment Lexer
//!
//! A best-effort, single-pass scanner that splits one fragment's source into
//! top-level variable statements and function declarations. At each position
//! it first tries a function (`Type Name ( args ) { ... }`), then a variable
//! (`Type Name ... ;`); when neither matches, scanning stops.
//!
//! Only `//` line comments are understood, and only where whitespace is being
//! skipped or a block is being scanned. Block comments and string literals
//! are not special-cased.

use smallvec::SmallVec;

use crate::declaration::{
    ArgumentDeclaration, FunctionDeclaration, MaterialPartDeclaration, PIXEL_SHADER,
    VERTEX_SHADER, VariableDeclaration,
};
use crate::errors::{ComposeError, ParseFailure, Result};
use crate::fragment::Fragment;
use crate::rename::is_identifier_char;

/// Substring whose presence marks a function as performing a pixel discard.
const CLIP_CALL: &str = "clip(";

struct Lexer<'a> {
    code: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(code: &'a str) -> Self {
        Self { code, pos: 0 }
    }

    #[inline]
    fn eof(&self) -> bool {
        self.pos >= self.code.len()
    }

    #[inline]
    fn current(&self) -> u8 {
        self.code.as_bytes()[self.pos]
    }

    fn eat_line(&mut self) {
        while !self.eof() && !matches!(self.current(), b'\r' | b'\n') {
            self.pos += 1;
        }
    }

    fn eat_comment(&mut self) {
        if self.code.as_bytes()[self.pos..].starts_with(b"//") {
            self.eat_line();
        }
    }

    /// Skips whitespace and line comments; `true` if any whitespace was eaten.
    fn read_separator(&mut self) -> bool {
        let mut result = false;
        while !self.eof() {
            self.eat_comment();
            if self.eof() {
                break;
            }
            if matches!(self.current(), b' ' | b'\t' | b'\r' | b'\n') {
                result = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        result
    }

    fn read_symbol(&mut self, symbol: u8) -> bool {
        self.read_separator();
        if !self.eof() && self.current() == symbol {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn read_identifier(&mut self) -> Option<&'a str> {
        self.read_separator();
        let start = self.pos;
        while !self.eof() && is_identifier_char(self.current()) {
            self.pos += 1;
        }
        let code = self.code;
        (self.pos > start).then_some(&code[start..self.pos])
    }

    /// Scans from `start` to the first `;` that is not nested in braces.
    fn read_statement(&mut self, start: usize) -> Option<&'a str> {
        self.pos = start;
        let mut depth = 0usize;
        while !self.eof() {
            self.eat_comment();
            if self.eof() {
                break;
            }
            match self.current() {
                b'{' => depth += 1,
                b'}' => depth = depth.checked_sub(1)?,
                b';' if depth == 0 => {
                    self.pos += 1;
                    return Some(&self.code[start..self.pos]);
                }
                _ => {}
            }
            self.pos += 1;
        }
        None
    }

    /// Scans from `start` through the brace that closes the first `{`.
    fn read_braced(&mut self, start: usize) -> Option<&'a str> {
        self.pos = start;
        let mut depth = 0usize;
        while !self.eof() {
            self.eat_comment();
            if self.eof() {
                break;
            }
            match self.current() {
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        self.pos += 1;
                        return Some(&self.code[start..self.pos]);
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        None
    }

    fn read_variable(&mut self) -> Option<VariableDeclaration> {
        let initial = self.pos;
        let result = self.try_read_variable(initial);
        if result.is_none() {
            self.pos = initial;
        }
        result
    }

    fn try_read_variable(&mut self, initial: usize) -> Option<VariableDeclaration> {
        let ty = self.read_identifier()?;
        if !self.read_separator() {
            return None;
        }
        let name = self.read_identifier()?;
        let body = self.read_statement(initial)?;
        Some(VariableDeclaration {
            ty: ty.to_owned(),
            name: name.to_owned(),
            body: body.to_owned(),
        })
    }

    fn read_argument(&mut self) -> Option<ArgumentDeclaration> {
        let modifier = self.read_identifier();
        let (is_input, is_output) = match modifier {
            Some("in") => (true, false),
            Some("out") => (false, true),
            Some("inout") => (true, true),
            _ => (true, false),
        };

        let ty = if is_output || modifier == Some("in") {
            if !self.read_separator() {
                return None;
            }
            self.read_identifier()?
        } else {
            modifier?
        };

        if !self.read_separator() {
            return None;
        }
        let name = self.read_identifier()?;

        let mut argument = ArgumentDeclaration {
            name: name.to_owned(),
            ty: ty.to_owned(),
            semantic: None,
            default_value: None,
            is_input,
            is_output,
        };
        if self.read_symbol(b':') {
            argument.semantic = Some(self.read_identifier()?.to_owned());
        }
        if self.read_symbol(b'=') {
            argument.default_value = Some(self.read_identifier()?.to_owned());
        }
        self.read_symbol(b',');
        Some(argument)
    }

    fn read_function(&mut self) -> Option<FunctionDeclaration> {
        let initial = self.pos;
        let result = self.try_read_function(initial);
        if result.is_none() {
            self.pos = initial;
        }
        result
    }

    fn try_read_function(&mut self, initial: usize) -> Option<FunctionDeclaration> {
        let return_type = self.read_identifier()?;
        if !self.read_separator() {
            return None;
        }
        let name = self.read_identifier()?;
        if !self.read_symbol(b'(') {
            return None;
        }
        let mut arguments = Vec::new();
        while let Some(argument) = self.read_argument() {
            arguments.push(argument);
        }
        if !self.read_symbol(b')') {
            return None;
        }
        let body = self.read_braced(initial)?;
        Some(FunctionDeclaration {
            name: name.to_owned(),
            return_type: return_type.to_owned(),
            arguments,
            body: body.to_owned(),
            contains_clip: body.contains(CLIP_CALL),
        })
    }
}

/// Locates the single function called `name`, if any.
fn entry_point(
    functions: &[FunctionDeclaration],
    name: &'static str,
) -> std::result::Result<Option<usize>, ParseFailure> {
    let mut found = functions.iter().enumerate().filter(|(_, f)| f.name == name);
    let first = found.next().map(|(i, _)| i);
    if found.next().is_some() {
        return Err(ParseFailure::DuplicateEntryPoint(name));
    }
    Ok(first)
}

fn check_void(
    function: &FunctionDeclaration,
    name: &'static str,
) -> std::result::Result<(), ParseFailure> {
    if function.return_type == "void" {
        Ok(())
    } else {
        Err(ParseFailure::NonVoidReturn {
            function: name,
            return_type: function.return_type.clone(),
        })
    }
}

/// Parses one fragment into its declaration.
///
/// The returned declaration has index 0, no producer flags and no
/// dependencies; those are filled in by the graph pass.
pub fn parse_fragment(fragment: &Fragment) -> Result<MaterialPartDeclaration> {
    let mut lexer = Lexer::new(&fragment.source);
    let mut variables = Vec::new();
    let mut functions = Vec::new();

    loop {
        if let Some(function) = lexer.read_function() {
            functions.push(function);
        } else if let Some(variable) = lexer.read_variable() {
            variables.push(variable);
        } else {
            break;
        }
    }

    lexer.read_separator();
    if !lexer.eof() {
        log::warn!(
            "Fragment `{}`: stopped parsing at byte {} of {}; the remaining text is ignored",
            fragment.id,
            lexer.pos,
            fragment.source.len()
        );
    }

    let fail = |reason| ComposeError::FragmentParse {
        fragment: fragment.id.clone(),
        reason,
    };

    let vertex_shader = entry_point(&functions, VERTEX_SHADER).map_err(fail)?;
    let pixel_shader = entry_point(&functions, PIXEL_SHADER).map_err(fail)?;
    if vertex_shader.is_none() && pixel_shader.is_none() {
        return Err(fail(ParseFailure::NoEntryPoint));
    }
    if let Some(i) = vertex_shader {
        check_void(&functions[i], VERTEX_SHADER).map_err(fail)?;
    }
    if let Some(i) = pixel_shader {
        check_void(&functions[i], PIXEL_SHADER).map_err(fail)?;
    }

    Ok(MaterialPartDeclaration {
        id: fragment.id.clone(),
        index: 0,
        variables,
        functions,
        vertex_shader,
        pixel_shader,
        is_vertex_shader_output_producer: false,
        is_pixel_shader_output_producer: false,
        dependencies: SmallVec::new(),
        tagged: false,
    })
}
