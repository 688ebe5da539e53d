//! Post-phase event records.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::records::{CourseId, StudentId};

/// What an improvement iteration did.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "kebab-case"))]
pub enum PostAction {
    /// `student_1` gave `course_1` to `student_2` in exchange for `course_2`.
    Swap {
        student_1: StudentId,
        course_1: CourseId,
        student_2: StudentId,
        course_2: CourseId,
    },
    /// One student's bundle was re-chosen. Both lists are ascending.
    AddDrop {
        student: StudentId,
        dropped: Vec<CourseId>,
        added: Vec<CourseId>,
    },
    /// Nothing improved.
    NoOp,
}

impl PostAction {
    /// Stable kind name for flat log writers.
    pub fn kind(&self) -> &'static str {
        match self {
            PostAction::Swap { .. } => "swap",
            PostAction::AddDrop { .. } => "add-drop",
            PostAction::NoOp => "no-op",
        }
    }
}

/// One entry of the post-phase log.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PostEvent {
    /// Global iteration number, continuing after the draft rounds.
    pub iteration: usize,
    /// Change in global welfare caused by the action; 0 for a no-op.
    pub delta_welfare: f64,
    pub action: PostAction,
}

impl PostEvent {
    pub(crate) fn no_op(iteration: usize) -> Self {
        Self {
            iteration,
            delta_welfare: 0.0,
            action: PostAction::NoOp,
        }
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self.action, PostAction::NoOp)
    }
}
