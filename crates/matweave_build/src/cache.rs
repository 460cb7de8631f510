//! Compiled effect cache keyed by source fingerprint.

use rustc_hash::FxHashMap;

use crate::compiler::CompiledEffect;

/// Byte-identical generated source compiles once.
#[derive(Debug, Default)]
pub struct EffectCache {
    effects: FxHashMap<u128, CompiledEffect>,
}

impl EffectCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, fingerprint: u128) -> Option<&CompiledEffect> {
        self.effects.get(&fingerprint)
    }

    pub fn insert(&mut self, fingerprint: u128, effect: CompiledEffect) {
        self.effects.insert(fingerprint, effect);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_by_fingerprint() {
        let mut cache = EffectCache::new();
        assert!(cache.is_empty());

        let key = matweave_composer::fingerprint("float4 PS() : COLOR0 { return 1; }");
        cache.insert(key, CompiledEffect { bytecode: vec![1, 2, 3], disassembly: None });

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(key).unwrap().bytecode, [1, 2, 3]);
        assert!(cache.get(key ^ 1).is_none());

        cache.clear();
        assert!(cache.is_empty());
    }
}
