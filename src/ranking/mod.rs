//! Deterministic candidate ranking.
//!
//! Chooses among courses a student could take. Candidates are compared by
//! utility first, with a tolerance so that floating-point noise counts as a
//! tie; ties are broken by an ordered list of rules:
//!
//! 1. smaller Table 1 rank,
//! 2. higher Table 1 score,
//! 3. higher seeded draw,
//! 4. smaller course id.
//!
//! The last rule makes the order total, so a run never depends on input
//! order or hash iteration.

mod engine;
mod rules;
mod types;

pub use engine::CandidateRanker;
pub use rules::{ByCourseId, ByDraw, ByPosition, ByScore};
pub use types::{Candidate, TieBreakRule};
