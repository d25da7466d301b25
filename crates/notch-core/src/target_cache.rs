//! Memoizes [`Target`] instances by `(device, prefix, suffix, mode)` so
//! that every Result routed to the same file shares one `Target` —
//! required by the Collator's "one header per file" and "one open handle
//! per file" guarantees.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::model::{Target, TargetModeKey};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    device_name: String,
    prefix: String,
    suffix: String,
    mode: TargetModeKey,
}

#[derive(Debug, Default)]
pub struct TargetCache {
    base_path: PathBuf,
    entries: HashMap<Key, Target>,
}

impl TargetCache {
    #[must_use]
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            entries: HashMap::new(),
        }
    }

    /// Resolve (constructing and memoizing if absent) the `Target` for
    /// this key tuple.
    pub fn resolve(
        &mut self,
        device_name: &str,
        prefix: &str,
        suffix: &str,
        mode: TargetModeKey,
    ) -> Target {
        let key = Key {
            device_name: device_name.to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            mode,
        };
        self.entries
            .entry(key)
            .or_insert_with(|| Target {
                device_name: device_name.to_string(),
                base_path: self.base_path.clone(),
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
                mode,
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_returns_equal_targets() {
        let mut cache = TargetCache::new(PathBuf::from("/base"));
        let a = cache.resolve("r1", "", "", TargetModeKey::Text);
        let b = cache.resolve("r1", "", "", TargetModeKey::Text);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_suffix_yields_distinct_target() {
        let mut cache = TargetCache::new(PathBuf::from("/base"));
        let a = cache.resolve("r1", "", "", TargetModeKey::Text);
        let b = cache.resolve("r1", "", "_img", TargetModeKey::Binary);
        assert_ne!(a, b);
    }
}
