// Adaptive Assessment Engine
// Implements: input normalization, gap scoring, interview planning, the per-answer
// decision loop, and session summaries. Everything except `handlers` is pure.

pub mod decision;
pub mod gap_scoring;
pub mod handlers;
pub mod normalizer;
pub mod planner;
pub mod summary;
