//! Draft output records.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::records::{CourseId, StudentId};

/// One committed pick, with the utility decomposition at pick time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PickLogEntry {
    /// 1-based draft round.
    pub round: usize,
    pub student: StudentId,
    pub course: CourseId,
    pub utility: f64,
    pub base: f64,
    /// Normalized friend bonus at pick time.
    pub friend_bonus: f64,
}

/// Lifecycle of a [`DraftScheduler`](super::DraftScheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    Idle,
    Drafting {
        /// 1-based round in progress.
        round: usize,
    },
    Completed,
}

/// Result of a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftOutcome {
    /// Forward turn order (student indices). Even rounds run it reversed.
    pub order: Vec<usize>,
    /// Picks in commit order.
    pub picks: Vec<PickLogEntry>,
}
