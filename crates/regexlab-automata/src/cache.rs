//! DFA cache (spec.md §5): building a DFA is the expensive step in the
//! pipeline, so repeated requests for the same pattern+options should hit
//! one built automaton instead of re-running subset construction. Keyed by
//! a `crc32fast` fingerprint rather than the pattern string itself, so the
//! cache doesn't hold a second copy of every source pattern around.

use crate::dfa::Dfa;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};

pub type Fingerprint = u32;

pub fn fingerprint(pattern: &str, options_tag: &str) -> Fingerprint {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(pattern.as_bytes());
    hasher.update(b"\0");
    hasher.update(options_tag.as_bytes());
    hasher.finalize()
}

enum Slot {
    Building,
    Built(Arc<Dfa>),
}

/// Bounded LRU cache of built DFAs. `get_or_build` guarantees at most one
/// concurrent build per fingerprint: a thread that finds a `Building` slot
/// waits on the same `Mutex` rather than racing a duplicate build, per
/// spec.md §5.
pub struct DfaCache {
    capacity: usize,
    entries: Mutex<IndexMap<Fingerprint, Slot>>,
}

impl DfaCache {
    pub fn new(capacity: usize) -> Self {
        DfaCache { capacity: capacity.max(1), entries: Mutex::new(IndexMap::new()) }
    }

    pub fn get(&self, key: Fingerprint) -> Option<Arc<Dfa>> {
        let mut entries = self.entries.lock().unwrap();
        let hit = matches!(entries.get(&key), Some(Slot::Built(_)));
        if !hit {
            return None;
        }
        let (_, slot) = entries.shift_remove_entry(&key).unwrap();
        entries.insert(key, slot);
        match entries.get(&key) {
            Some(Slot::Built(dfa)) => Some(dfa.clone()),
            _ => None,
        }
    }

    /// Returns the cached automaton for `key`, building it with `build` on a
    /// miss. `build` runs while holding the cache's lock, so a second caller
    /// for the same fingerprint blocks on the lock instead of starting a
    /// redundant build — a coarser single-flight than per-key locking, but
    /// the pipeline's builds are the bottleneck worth serializing on, not
    /// the map itself.
    pub fn get_or_build(&self, key: Fingerprint, build: impl FnOnce() -> Dfa) -> Arc<Dfa> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(Slot::Built(dfa)) = entries.get(&key) {
            let dfa = dfa.clone();
            let (_, slot) = entries.shift_remove_entry(&key).unwrap();
            entries.insert(key, slot);
            return dfa;
        }
        entries.insert(key, Slot::Building);
        let dfa = Arc::new(build());
        entries.insert(key, Slot::Built(dfa.clone()));
        self.evict_if_needed(&mut entries);
        dfa
    }

    /// Fallible counterpart of [`Self::get_or_build`]: a failed build leaves
    /// no trace in the cache (no `Building` slot lingers for the next
    /// caller to find), so the fingerprint is retried fresh next time.
    pub fn try_get_or_build<E>(&self, key: Fingerprint, build: impl FnOnce() -> Result<Dfa, E>) -> Result<Arc<Dfa>, E> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(Slot::Built(dfa)) = entries.get(&key) {
            let dfa = dfa.clone();
            let (_, slot) = entries.shift_remove_entry(&key).unwrap();
            entries.insert(key, slot);
            return Ok(dfa);
        }
        entries.insert(key, Slot::Building);
        let dfa = match build() {
            Ok(dfa) => Arc::new(dfa),
            Err(e) => {
                entries.shift_remove(&key);
                return Err(e);
            }
        };
        entries.insert(key, Slot::Built(dfa.clone()));
        self.evict_if_needed(&mut entries);
        Ok(dfa)
    }

    fn evict_if_needed(&self, entries: &mut IndexMap<Fingerprint, Slot>) {
        while entries.len() > self.capacity {
            entries.shift_remove_index(0);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dfa, nfa};
    use regexlab_syntax::parser::parse;

    fn build_dfa(pattern: &str) -> Dfa {
        let ast = parse(pattern).unwrap();
        let n = nfa::build(&ast).unwrap();
        dfa::build(&n, 10_000).unwrap()
    }

    #[test]
    fn reuses_a_built_automaton_on_a_fingerprint_hit() {
        let cache = DfaCache::new(4);
        let key = fingerprint("/ab/", "");
        let mut builds = 0;
        cache.get_or_build(key, || {
            builds += 1;
            build_dfa("/ab/")
        });
        cache.get_or_build(key, || {
            builds += 1;
            build_dfa("/ab/")
        });
        assert_eq!(builds, 1);
    }

    #[test]
    fn evicts_the_least_recently_used_entry_past_capacity() {
        let cache = DfaCache::new(2);
        let a = fingerprint("/a/", "");
        let b = fingerprint("/b/", "");
        let c = fingerprint("/c/", "");
        cache.get_or_build(a, || build_dfa("/a/"));
        cache.get_or_build(b, || build_dfa("/b/"));
        cache.get_or_build(c, || build_dfa("/c/"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(a).is_none());
    }

    #[test]
    fn distinct_option_tags_fingerprint_differently() {
        assert_ne!(fingerprint("/a/", "ci"), fingerprint("/a/", ""));
    }

    #[test]
    fn a_failed_build_is_not_cached() {
        let cache = DfaCache::new(4);
        let key = fingerprint("/a/", "");
        let first: Result<Arc<Dfa>, &str> = cache.try_get_or_build(key, || Err("boom"));
        assert!(first.is_err());
        assert_eq!(cache.len(), 0);
        let second: Result<Arc<Dfa>, &str> = cache.try_get_or_build(key, || Ok(build_dfa("/a/")));
        assert!(second.is_ok());
        assert_eq!(cache.len(), 1);
    }
}
