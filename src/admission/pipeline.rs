// src/admission/pipeline.rs
// =============================================================================
// The admission pipeline decides, for one discovered link, whether it goes
// into the frontier.
//
// Gates, in order (cheap first, first failure wins):
// 1. Policy gate       - scheme, host, robots, extension (also the parse check)
// 2. Dedup             - canonical identity already admitted by this worker?
// 3. Pattern limit     - this URL template already admitted too often?
// 4. Subdomain limit   - this host already admitted too often?
//
// Only a link that clears all four changes any state: both counters go up
// by one and its identity joins the dedup cache. A rejected link leaves
// everything exactly as it was.
//
// Each worker owns one pipeline. Nothing here is shared or locked; the
// policy gate is behind an Arc only because it is read-only.
// =============================================================================

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use url::Url;

use super::limits::{HitCounter, HitLimits};
use super::policy::{PolicyGate, PolicyViolation};
use crate::identity::{authority_key, canonicalize, pattern_key};

// Why a link was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Policy(PolicyViolation),
    Duplicate,
    PatternLimit,
    SubdomainLimit,
}

impl Rejection {
    // Stable name used as a key in crawl reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Policy(PolicyViolation::Malformed) => "policy/malformed",
            Rejection::Policy(PolicyViolation::Scheme) => "policy/scheme",
            Rejection::Policy(PolicyViolation::Host) => "policy/host",
            Rejection::Policy(PolicyViolation::Robots) => "policy/robots",
            Rejection::Policy(PolicyViolation::Extension) => "policy/extension",
            Rejection::Duplicate => "duplicate",
            Rejection::PatternLimit => "pattern_limit",
            Rejection::SubdomainLimit => "subdomain_limit",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Goes into the frontier
    Accepted(Url),
    /// Silently dropped
    Rejected(Rejection),
}

impl Admission {
    #[cfg(test)]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted(_))
    }
}

pub struct AdmissionPipeline {
    policy: Arc<PolicyGate>,
    // Canonical identities admitted so far; append-only
    seen: HashSet<String>,
    pattern_hits: HitCounter,
    subdomain_hits: HitCounter,
}

impl AdmissionPipeline {
    pub fn new(policy: Arc<PolicyGate>, limits: HitLimits) -> Self {
        Self {
            policy,
            seen: HashSet::new(),
            pattern_hits: HitCounter::new(limits.max_pattern_hits),
            subdomain_hits: HitCounter::new(limits.max_subdomain_hits),
        }
    }

    // Admits a raw link string (anything that fails to parse is rejected)
    #[cfg(test)]
    pub fn admit(&mut self, candidate: &str) -> Admission {
        match Url::parse(candidate) {
            Ok(mut url) => {
                url.set_fragment(None);
                self.admit_url(url)
            }
            Err(_) => Admission::Rejected(Rejection::Policy(PolicyViolation::Malformed)),
        }
    }

    // Admits an already-resolved link
    pub fn admit_url(&mut self, url: Url) -> Admission {
        if let Err(violation) = self.policy.check(&url) {
            return Admission::Rejected(Rejection::Policy(violation));
        }

        let identity = canonicalize(&url);
        if self.seen.contains(&identity) {
            return Admission::Rejected(Rejection::Duplicate);
        }

        let pattern = pattern_key(&url);
        if self.pattern_hits.is_exhausted(&pattern) {
            return Admission::Rejected(Rejection::PatternLimit);
        }

        // The policy gate already guaranteed a host; a non-default port
        // counts as its own server
        let subdomain = authority_key(&url).unwrap_or_default();
        if self.subdomain_hits.is_exhausted(&subdomain) {
            return Admission::Rejected(Rejection::SubdomainLimit);
        }

        self.pattern_hits.record(pattern);
        self.subdomain_hits.record(subdomain);
        self.seen.insert(identity);

        Admission::Accepted(url)
    }

    // Number of distinct identities admitted
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    #[cfg(test)]
    pub fn pattern_count(&self, url: &Url) -> u32 {
        self.pattern_hits.count(&pattern_key(url))
    }

    #[cfg(test)]
    pub fn subdomain_count(&self, subdomain: &str) -> u32 {
        self.subdomain_hits.count(subdomain)
    }

    // Templates that have been capped so far
    pub fn exhausted_patterns(&self) -> usize {
        self.pattern_hits.exhausted_keys()
    }

    pub fn distinct_patterns(&self) -> usize {
        self.pattern_hits.len()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why &mut self on admit?
//    - Admitting a link changes the pipeline (counters and dedup cache)
//    - &mut self means only one caller can use the pipeline at a time
//    - Each worker owns its own pipeline, so that's never a bottleneck
//
// 2. Why Arc<PolicyGate>?
//    - Arc = Atomically Reference Counted pointer
//    - Every worker needs the same read-only rules
//    - Cloning an Arc just bumps a counter; the rules aren't copied
//
// 3. What does `if let Err(violation) = ...` do?
//    - Runs the block only when the Result is an Err
//    - Binds the error value so we can put it in the rejection
// -----------------------------------------------------------------------------
