// src/admission/limits.rs
// =============================================================================
// Bounded hit counters.
//
// Each worker keeps two of these:
// - one keyed by pattern key (caps links per URL template)
// - one keyed by subdomain (caps links per host)
//
// Counters only go up, and only when a link is actually admitted. A key
// whose count has reached the limit stays exhausted for the rest of the
// worker's run.
// =============================================================================

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitLimits {
    pub max_pattern_hits: u32,
    pub max_subdomain_hits: u32,
}

impl Default for HitLimits {
    fn default() -> Self {
        Self {
            max_pattern_hits: 250,
            max_subdomain_hits: 2000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HitCounter {
    limit: u32,
    hits: HashMap<String, u32>,
}

impl HitCounter {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            hits: HashMap::new(),
        }
    }

    pub fn count(&self, key: &str) -> u32 {
        self.hits.get(key).copied().unwrap_or(0)
    }

    // True once the key has reached the limit; checking never increments
    pub fn is_exhausted(&self, key: &str) -> bool {
        self.count(key) >= self.limit
    }

    // Counts one admitted link under `key`
    pub fn record(&mut self, key: String) {
        *self.hits.entry(key).or_insert(0) += 1;
    }

    // Number of distinct keys seen so far
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    // Number of keys that have hit the limit
    pub fn exhausted_keys(&self) -> usize {
        self.hits.values().filter(|&&hits| hits >= self.limit).count()
    }
}
