// src/admission/mod.rs
// =============================================================================
// This module decides which discovered links are worth crawling.
//
// Submodules:
// - policy: static rules (scheme, allowed hosts, robots, extensions)
// - limits: bounded per-key hit counters
// - pipeline: runs one link through every gate, in order
// =============================================================================

mod limits;
mod pipeline;
mod policy;

pub use limits::HitLimits;
pub use pipeline::{Admission, AdmissionPipeline, Rejection};
pub use policy::PolicyGate;
