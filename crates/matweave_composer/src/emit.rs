//! Code Emitter
//!
//! Renders the composed program as plain text:
//!
//! ```text
//! <fragment code, renamed>      one block per surviving fragment
//! void VS(...) { ... }          forwards, locals, fragment calls, copies
//! void PS(...) { ... }          temporaries, forwards, locals, fragment calls
//! technique Default { ... }     only in `emit_program`
//! ```
//!
//! Call sites pass each fragment's own argument names. Since cross-fragment
//! names are never renamed, the names line up with the locals and
//! parameters declared here.

use crate::arguments::{ArgumentTable, FALLBACK_DEFAULT};
use crate::declaration::{ArgumentDeclaration, MaterialPartDeclaration, ShaderStage};
use crate::resolve::Signature;

const INDENT: &str = "    ";

/// Line-oriented output buffer. Section breaks are deferred until the
/// next line is written, so empty sections leave no blank lines behind.
#[derive(Default)]
struct CodeWriter {
    out: String,
    pending_break: bool,
}

impl CodeWriter {
    fn line(&mut self, text: &str) {
        if std::mem::take(&mut self.pending_break) {
            self.out.push('\n');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn indented(&mut self, text: &str) {
        self.out.push_str(INDENT);
        self.line(text);
    }

    /// Requests a blank line before the next line, unless nothing has been
    /// written since the last opening brace.
    fn blank(&mut self) {
        self.pending_break = !self.out.is_empty() && !self.out.ends_with("{\n");
    }

    fn close(&mut self) {
        self.pending_break = false;
        self.line("}");
    }

    fn signature(&mut self, name: &str, params: &[String]) {
        self.line(&format!("void {name}({})", params.join(", ")));
    }

    fn forwards(&mut self, inputs: &[ArgumentDeclaration]) {
        for input in inputs.iter().filter(|a| a.is_input && a.is_output) {
            self.indented(&format!("{0} = {0};", input.name));
        }
    }

    fn locals<'a>(&mut self, arguments: impl Iterator<Item = &'a ArgumentDeclaration>) {
        for argument in arguments {
            let default = argument.default_value.as_deref().unwrap_or(FALLBACK_DEFAULT);
            self.indented(&format!("{} {} = {default};", argument.ty, argument.name));
        }
    }

    fn invocations(&mut self, parts: &[MaterialPartDeclaration], stage: ShaderStage) {
        for part in parts {
            if let Some(function) = part.stage(stage) {
                self.line(&function.invocation(&part.suffix()));
            }
        }
    }
}

fn listed(name: &str, lists: &[&[ArgumentDeclaration]]) -> bool {
    lists.iter().any(|list| list.iter().any(|a| a.name == name))
}

/// The pixel-stage output parameter, always written as a pure `out`.
fn pixel_output(argument: &ArgumentDeclaration) -> String {
    match &argument.semantic {
        Some(semantic) => format!("out {} {} : {semantic}", argument.ty, argument.name),
        None => format!("out {} {}", argument.ty, argument.name),
    }
}

/// Renders the fragment code plus the `vs_name` / `ps_name` drivers.
#[must_use]
pub fn emit_body(
    parts: &[MaterialPartDeclaration],
    arguments: &ArgumentTable,
    signature: &Signature,
    vs_name: &str,
    ps_name: &str,
) -> String {
    let mut w = CodeWriter::default();

    for part in parts {
        w.line(part.render().trim_end());
        w.blank();
    }

    // Vertex stage
    let params: Vec<String> = signature
        .vs_inputs
        .iter()
        .chain(&signature.vs_outputs)
        .map(ToString::to_string)
        .chain(signature.semantic_mapping.iter().map(|binding| {
            format!(
                "out {} {} : {}",
                binding.argument.ty,
                binding.output_name(),
                binding.semantic
            )
        }))
        .collect();
    w.signature(vs_name, &params);
    w.line("{");
    w.forwards(&signature.vs_inputs);
    w.blank();
    w.locals(
        arguments
            .iter()
            .filter(|a| !listed(&a.name, &[signature.vs_inputs.as_slice(), signature.vs_outputs.as_slice()])),
    );
    w.blank();
    w.invocations(parts, ShaderStage::Vertex);
    w.blank();
    for binding in &signature.semantic_mapping {
        w.indented(&format!("{} = {};", binding.output_name(), binding.source_name()));
    }
    w.close();
    w.blank();

    // Pixel stage
    let params: Vec<String> = signature
        .ps_inputs
        .iter()
        .map(ToString::to_string)
        .chain(signature.ps_outputs.iter().map(pixel_output))
        .collect();
    w.signature(ps_name, &params);
    w.line("{");
    for temporary in &signature.temporaries {
        match &temporary.default_value {
            Some(default) => w.indented(&format!("{} {} = {default};", temporary.ty, temporary.name)),
            None => w.indented(&format!("{} {};", temporary.ty, temporary.name)),
        }
    }
    w.blank();
    w.forwards(&signature.ps_inputs);
    w.blank();
    w.locals(arguments.iter().filter(|a| {
        !listed(
            &a.name,
            &[
                signature.ps_inputs.as_slice(),
                signature.ps_outputs.as_slice(),
                signature.temporaries.as_slice(),
            ],
        )
    }));
    w.blank();
    w.invocations(parts, ShaderStage::Pixel);
    w.close();

    w.out
}

/// The effect technique compiling `VS`/`PS` for `profile` (e.g. `"3_0"`).
#[must_use]
pub fn emit_technique(profile: &str) -> String {
    format!(
        "technique Default\n\
         {{\n\
         {INDENT}pass Default\n\
         {INDENT}{{\n\
         {INDENT}{INDENT}VertexShader = compile vs_{profile} VS();\n\
         {INDENT}{INDENT}PixelShader = compile ps_{profile} PS();\n\
         {INDENT}}}\n\
         }}\n"
    )
}

/// The complete program: fragment code, `VS`, `PS` and the technique.
#[must_use]
pub fn emit_program(
    parts: &[MaterialPartDeclaration],
    arguments: &ArgumentTable,
    signature: &Signature,
    profile: &str,
) -> String {
    let mut source = emit_body(parts, arguments, signature, "VS", "PS");
    source.push('\n');
    source.push_str(&emit_technique(profile));
    source
}
