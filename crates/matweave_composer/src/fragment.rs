//! Fragment input types.
//!
//! A [`Fragment`] is the only thing the composer receives from the outside
//! world: one material part's shader chunk for one usage, tagged with a
//! stable identity that every diagnostic refers back to.

use std::fmt;
use std::sync::Arc;

/// Stable identity of the material part that contributed a fragment.
///
/// Cheap to clone; shared between the declaration, the dependency graph and
/// every error that mentions the fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(Arc<str>);

impl FragmentId {
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FragmentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FragmentId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// One shader fragment source together with its owner's identity.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub id: FragmentId,
    pub source: String,
}

impl Fragment {
    #[must_use]
    pub fn new(id: impl Into<FragmentId>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
        }
    }
}
