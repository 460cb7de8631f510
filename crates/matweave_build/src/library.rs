//! Built-in Fragment Library
//!
//! The built-in parts' fragment sources are minijinja templates embedded
//! into the binary with `rust-embed`. The template syntax keeps `{` and `}`
//! free for the shading language:
//!
//! | Construct | Syntax |
//! |-----------|--------|
//! | Block     | `{$ if X $} ... {$ endif $}` |
//! | Variable  | `{{ X }}` |
//! | Line      | `$$ if X` ... `$$ endif` |
//!
//! Undefined variables are falsy in tests, so a part only passes the defines
//! it enables. `{$ include "name" $}` pulls in a shared chunk from
//! `chunks/`.

use std::sync::OnceLock;

use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior, syntax::SyntaxConfig};
use rust_embed::RustEmbed;

use crate::defines::FragmentDefines;
use crate::errors::Result;

const TEMPLATE_EXTENSION: &str = ".hlsl";

static FRAGMENT_ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(RustEmbed)]
#[folder = "src/library/fragments"]
struct FragmentAssets;

/// Builds the template environment with every embedded asset registered
/// under its path minus the extension (`diffuse`, `chunks/depth`).
fn build_env() -> Result<Environment<'static>> {
    let mut env = Environment::new();

    let syntax = SyntaxConfig::builder()
        .block_delimiters("{$", "$}")
        .variable_delimiters("{{", "}}")
        .line_statement_prefix("$$")
        .build()?;
    env.set_syntax(syntax);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
    env.set_path_join_callback(|name, _parent| format!("chunks/{name}").into());

    for path in FragmentAssets::iter() {
        let Some(name) = path.strip_suffix(TEMPLATE_EXTENSION) else {
            continue;
        };
        let Some(file) = FragmentAssets::get(&path) else {
            continue;
        };
        let source = String::from_utf8(file.data.into_owned()).map_err(|_| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("fragment template `{path}` is not valid UTF-8"),
            )
        })?;
        env.add_template_owned(name.to_owned(), source)?;
    }

    Ok(env)
}

fn get_env() -> Result<&'static Environment<'static>> {
    if let Some(env) = FRAGMENT_ENV.get() {
        return Ok(env);
    }
    let env = build_env()?;
    log::debug!("Fragment template environment ready");
    Ok(FRAGMENT_ENV.get_or_init(|| env))
}

/// Renders the embedded fragment template `name` with `defines`.
pub fn render_fragment(name: &str, defines: &FragmentDefines) -> Result<String> {
    let template = get_env()?.get_template(name)?;
    Ok(template.render(defines.to_map())?)
}

/// Names of every embedded fragment template (chunks excluded).
#[must_use]
pub fn fragment_names() -> Vec<String> {
    let mut names: Vec<String> = FragmentAssets::iter()
        .filter(|path| !path.starts_with("chunks/"))
        .filter_map(|path| path.strip_suffix(TEMPLATE_EXTENSION).map(str::to_owned))
        .collect();
    names.sort();
    names
}
