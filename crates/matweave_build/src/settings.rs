//! Build Settings
//!
//! Knobs of the build driver. Every field has a default, so a settings file
//! only needs to name what it changes:
//!
//! ```
//! use matweave_build::{BuildSettings, ShaderProfile};
//!
//! let settings = BuildSettings::from_json(r#"{ "simplify": false, "profiles": ["3_0"] }"#)?;
//! assert!(!settings.simplify);
//! assert_eq!(settings.profiles, [ShaderProfile::Sm3_0]);
//! assert!(settings.cache_compiled);
//! # Ok::<(), matweave_build::BuildError>(())
//! ```

use std::path::{Path, PathBuf};

use matweave_composer::ComposeOptions;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::profile::ShaderProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Drop fragments with no path to a pixel output and collapse
    /// pass-through values into locals.
    pub simplify: bool,
    /// Profile ladder. The first profile is tried first; each compiler
    /// failure retries at the next one and a failure at the last is fatal.
    pub profiles: Vec<ShaderProfile>,
    /// Where generated source and disassembly are written, if anywhere.
    pub diagnostics_dir: Option<PathBuf>,
    /// Reuse compiled effects for byte-identical generated source.
    pub cache_compiled: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            simplify: true,
            profiles: ShaderProfile::ALL.to_vec(),
            diagnostics_dir: None,
            cache_compiled: true,
        }
    }
}

impl BuildSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    #[must_use]
    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            simplify: self.simplify,
        }
    }
}
