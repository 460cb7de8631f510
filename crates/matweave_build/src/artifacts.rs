//! Diagnostics artifacts.
//!
//! Generated effect source is written as `<name>.fx` and, when the compiler
//! produced one, its disassembly as `<name>.asm`, so a failing or suspicious
//! build can be reproduced by hand.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::Result;

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `source` (and `disassembly`) under `name`, creating the
    /// directory first. Returns the path of the source file.
    pub fn write(&self, name: &str, source: &str, disassembly: Option<&str>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let file_name = sanitize(name);
        let source_path = self.dir.join(format!("{file_name}.fx"));
        fs::write(&source_path, source)?;

        if let Some(disassembly) = disassembly {
            fs::write(self.dir.join(format!("{file_name}.asm")), disassembly)?;
        }

        log::debug!("Wrote effect diagnostics to {}", source_path.display());
        Ok(source_path)
    }
}

/// Keeps artifact names inside the diagnostics directory.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect()
}
