//! Fragment template defines.
//!
//! The switches a built-in part passes to its fragment template
//! (`TEXTURE_ENABLED`, ...). Stored sorted by key so that two equal define
//! sets render identical templates and serialize identically.

use std::collections::BTreeMap;

/// Sorted `key → value` define set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FragmentDefines {
    defines: Vec<(String, String)>,
}

impl FragmentDefines {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a define, replacing any previous value.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.defines.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
            Ok(idx) => value.clone_into(&mut self.defines[idx].1),
            Err(idx) => self.defines.insert(idx, (key.to_owned(), value.to_owned())),
        }
    }

    /// Sets `key` to `"1"` when `enabled`, removes it otherwise.
    pub fn toggle(&mut self, key: &str, enabled: bool) {
        if enabled {
            self.set(key, "1");
        } else {
            self.remove(key);
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        if let Ok(idx) = self.defines.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
            self.defines.remove(idx);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.defines
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| self.defines[idx].1.as_str())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defines.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert to a map for template rendering.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.defines.iter().cloned().collect()
    }
}
