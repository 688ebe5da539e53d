//! Seeded snake draft.
//!
//! Students take turns picking one course at a time. The turn order is a
//! seeded permutation of the sorted student list, walked forward in odd
//! rounds and backward in even rounds. Every pick maximizes the student's
//! utility against the allocation as it stands at that moment.

mod runner;
mod types;

pub(crate) use runner::score_candidates;
pub use runner::DraftScheduler;
pub use types::{DraftOutcome, DraftPhase, PickLogEntry};
