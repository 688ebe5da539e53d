//! Candidate ranking engine.

use std::cmp::Ordering;

use super::rules::{ByCourseId, ByDraw, ByPosition, ByScore};
use super::types::{Candidate, TieBreakRule};

/// Picks the best candidate(s) by utility, then by a cascade of rules.
///
/// Utility is compared with a tolerance: every candidate within `tau` of the
/// best utility is tied. Ties go to the rules in insertion order, and the
/// first candidate in slice order wins if every rule ties.
///
/// # Examples
///
/// ```
/// use draft_alloc::ranking::{Candidate, CandidateRanker};
///
/// let ranker = CandidateRanker::standard(1e-9);
/// let a = Candidate { course: 0, utility: 0.5, base: 0.5, friend_bonus: 0.0,
///                     position: Some(2), score: Some(1.0), draw: 0.3 };
/// let b = Candidate { course: 1, utility: 0.5 + 1e-12, base: 0.5, friend_bonus: 0.0,
///                     position: Some(1), score: Some(1.0), draw: 0.1 };
/// assert_eq!(ranker.select_best(&[a, b]), Some(1));
/// ```
pub struct CandidateRanker {
    rules: Vec<Box<dyn TieBreakRule>>,
    tau: f64,
}

impl CandidateRanker {
    /// Creates a ranker with no tie-break rules.
    pub fn new(tau: f64) -> Self {
        Self {
            rules: Vec::new(),
            tau,
        }
    }

    /// The draft cascade: rank, then score, then seeded draw, then course id.
    pub fn standard(tau: f64) -> Self {
        Self::new(tau)
            .with_rule(ByPosition)
            .with_rule(ByScore)
            .with_rule(ByDraw)
            .with_rule(ByCourseId)
    }

    /// Appends a tie-break rule.
    pub fn with_rule<R: TieBreakRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Utility tie tolerance.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Returns the names of all rules in order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Cascade comparison of two utility-tied candidates.
    pub fn compare_tied(&self, a: &Candidate, b: &Candidate) -> Ordering {
        for rule in &self.rules {
            let ord = rule.compare(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Index of the winning candidate, `None` for an empty slice.
    pub fn select_best(&self, candidates: &[Candidate]) -> Option<usize> {
        self.best_among(candidates, |_| true)
    }

    /// Indices of the best `n` candidates, best first.
    ///
    /// Built by repeated selection, so each pick applies the tolerance
    /// against the best of the candidates still remaining.
    pub fn top_n(&self, candidates: &[Candidate], n: usize) -> Vec<usize> {
        let mut taken = vec![false; candidates.len()];
        let mut picked = Vec::with_capacity(n.min(candidates.len()));
        while picked.len() < n {
            let Some(i) = self.best_among(candidates, |i| !taken[i]) else {
                break;
            };
            taken[i] = true;
            picked.push(i);
        }
        picked
    }

    fn best_among(&self, candidates: &[Candidate], open: impl Fn(usize) -> bool) -> Option<usize> {
        let top = candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| open(*i))
            .map(|(_, c)| c.utility)
            .fold(f64::NEG_INFINITY, f64::max);
        if top == f64::NEG_INFINITY {
            return None;
        }

        let mut best: Option<usize> = None;
        for (i, cand) in candidates.iter().enumerate() {
            if !open(i) || cand.utility < top - self.tau {
                continue;
            }
            best = match best {
                Some(j) if self.compare_tied(cand, &candidates[j]) != Ordering::Less => Some(j),
                _ => Some(i),
            };
        }
        best
    }
}
