use std::fmt;

use serde::{Deserialize, Serialize};

/// Shader model a composed program is compiled for.
///
/// Rendered into the technique block as `vs_<profile>` / `ps_<profile>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShaderProfile {
    #[serde(rename = "2_0")]
    Sm2_0,
    #[serde(rename = "3_0")]
    Sm3_0,
}

impl ShaderProfile {
    /// Every profile, lowest first.
    pub const ALL: [Self; 2] = [Self::Sm2_0, Self::Sm3_0];

    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sm2_0 => "2_0",
            Self::Sm3_0 => "3_0",
        }
    }
}

impl fmt::Display for ShaderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
