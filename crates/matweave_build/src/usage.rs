use std::fmt;

use serde::{Deserialize, Serialize};

/// The rendering purpose a material group is built for.
///
/// Each usage composes its own program from the fragments the group's parts
/// contribute for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaterialUsage {
    /// Regular shaded rendering.
    #[default]
    Default,
    /// Depth-only pass (shadow maps, depth prepass).
    Depth,
    /// Depth plus view-space normals.
    DepthAndNormal,
    /// Normals only.
    Normal,
}

impl MaterialUsage {
    pub const ALL: [Self; 4] = [Self::Default, Self::Depth, Self::DepthAndNormal, Self::Normal];

    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Depth => "Depth",
            Self::DepthAndNormal => "DepthAndNormal",
            Self::Normal => "Normal",
        }
    }
}

impl fmt::Display for MaterialUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
