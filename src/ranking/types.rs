//! Candidate record and the tie-break rule trait.

use std::cmp::Ordering;

/// One course a student could take, scored at decision time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Course index (ascending index = ascending course id).
    pub course: usize,
    /// `U(s, c)` at decision time.
    pub utility: f64,
    pub base: f64,
    /// Normalized friend bonus at decision time.
    pub friend_bonus: f64,
    /// Table 1 rank, `None` when missing.
    pub position: Option<u32>,
    /// Table 1 raw score, `None` when missing.
    pub score: Option<f64>,
    /// Seeded tie-break draw in `[0, 1)`.
    pub draw: f64,
}

/// An ordering consulted when candidates tie on utility.
///
/// Returns `Less` when `a` should win over `b`. Rules are consulted in the
/// order they were added; a later rule only decides when every earlier rule
/// returned `Equal`.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use draft_alloc::ranking::{Candidate, TieBreakRule};
///
/// // Prefer courses the student's friends value more.
/// struct MoreFriendBonus;
///
/// impl TieBreakRule for MoreFriendBonus {
///     fn name(&self) -> &str { "MoreFriendBonus" }
///     fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
///         b.friend_bonus.total_cmp(&a.friend_bonus)
///     }
/// }
/// ```
pub trait TieBreakRule: Send + Sync {
    /// Returns the name of this rule.
    fn name(&self) -> &str;

    /// Compares two tied candidates.
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering;
}
