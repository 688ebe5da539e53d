//! Built-in tie-break rules.

use std::cmp::Ordering;

use super::types::{Candidate, TieBreakRule};

/// Smaller Table 1 rank wins. Missing ranks lose.
pub struct ByPosition;

impl TieBreakRule for ByPosition {
    fn name(&self) -> &str {
        "ByPosition"
    }
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        a.position
            .unwrap_or(u32::MAX)
            .cmp(&b.position.unwrap_or(u32::MAX))
    }
}

/// Higher Table 1 score wins. Missing scores lose.
pub struct ByScore;

impl TieBreakRule for ByScore {
    fn name(&self) -> &str {
        "ByScore"
    }
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        let sa = a.score.unwrap_or(f64::NEG_INFINITY);
        let sb = b.score.unwrap_or(f64::NEG_INFINITY);
        sb.total_cmp(&sa)
    }
}

/// Higher seeded draw wins.
pub struct ByDraw;

impl TieBreakRule for ByDraw {
    fn name(&self) -> &str {
        "ByDraw"
    }
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        b.draw.total_cmp(&a.draw)
    }
}

/// Smaller course id wins.
pub struct ByCourseId;

impl TieBreakRule for ByCourseId {
    fn name(&self) -> &str {
        "ByCourseId"
    }
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        a.course.cmp(&b.course)
    }
}
