//! Typed input records.
//!
//! These are the already-parsed rows of the three input tables. Missing
//! cells are `None`; the utility model decides what a missing value means.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Student identifier. Ordered byte-wise; that order is the last tie-break.
pub type StudentId = String;

/// Course identifier. Ordered byte-wise; that order is the last tie-break.
pub type CourseId = String;

/// Table 1: a student's own preference for a course.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PreferenceRecord {
    pub student: StudentId,
    pub course: CourseId,
    /// Raw score (higher is better). Only used as a tie-break.
    pub score: Option<f64>,
    /// 1-based rank within the course universe (1 is best).
    pub position: Option<u32>,
}

impl PreferenceRecord {
    /// Creates a record with both fields present.
    pub fn new(
        student: impl Into<StudentId>,
        course: impl Into<CourseId>,
        score: f64,
        position: u32,
    ) -> Self {
        Self {
            student: student.into(),
            course: course.into(),
            score: Some(score),
            position: Some(position),
        }
    }
}

/// Table 2: a directed "I want to be with this friend in this course" edge.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FriendPreferenceRecord {
    pub student: StudentId,
    pub friend: StudentId,
    pub course: CourseId,
    /// 1-based friend rank (1 is the most wanted friend).
    pub position: Option<u32>,
    pub score: Option<f64>,
}

impl FriendPreferenceRecord {
    /// Creates an edge with a rank and an optional score.
    pub fn new(
        student: impl Into<StudentId>,
        friend: impl Into<StudentId>,
        course: impl Into<CourseId>,
        position: u32,
        score: Option<f64>,
    ) -> Self {
        Self {
            student: student.into(),
            friend: friend.into(),
            course: course.into(),
            position: Some(position),
            score,
        }
    }
}

/// Table 3: per-student weight of the friend term.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LambdaRecord {
    pub student: StudentId,
    pub lambda: f64,
}

impl LambdaRecord {
    pub fn new(student: impl Into<StudentId>, lambda: f64) -> Self {
        Self {
            student: student.into(),
            lambda,
        }
    }
}
