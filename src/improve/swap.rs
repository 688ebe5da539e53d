//! Pairwise swap search with an exact incremental welfare delta.
//!
//! A swap moves `c1` from `s1` to `s2` and `c2` from `s2` to `s1`. Only
//! three groups of utility terms can change:
//!
//! - `s1` loses `U(s1, c1)` and gains `U(s1, c2)`, where the gained term no
//!   longer sees `s2` in `c2`;
//! - `s2`, symmetrically;
//! - any other student that lists `s1` or `s2` as a friend and holds `c1`
//!   or `c2`, whose bonus there changes by the difference of the two
//!   friends' weights.
//!
//! Every other term is untouched, so the delta is exact.

use std::cmp::Ordering;

use crate::state::AllocationState;
use crate::utility::UtilityModel;

/// Deltas closer than this are treated as equal.
pub(crate) const IMPROVEMENT_EPS: f64 = 1e-12;

/// A candidate exchange, by dense index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapMove {
    pub s1: usize,
    pub c1: usize,
    pub s2: usize,
    pub c2: usize,
}

impl SwapMove {
    /// Whether `student` holds `course` once the move is applied.
    fn holds_after(&self, state: &AllocationState, student: usize, course: usize) -> bool {
        if student == self.s1 {
            if course == self.c1 {
                return false;
            }
            if course == self.c2 {
                return true;
            }
        } else if student == self.s2 {
            if course == self.c2 {
                return false;
            }
            if course == self.c1 {
                return true;
            }
        }
        state.holds(student, course)
    }

    /// Whether the move is legal in `state`.
    pub fn is_valid(&self, state: &AllocationState) -> bool {
        self.s1 != self.s2
            && self.c1 != self.c2
            && state.holds(self.s1, self.c1)
            && state.holds(self.s2, self.c2)
            && !state.holds(self.s1, self.c2)
            && !state.holds(self.s2, self.c1)
    }
}

/// Exact `W_after - W_before` for `mv`, without mutating `state`.
pub fn swap_delta(model: &UtilityModel, state: &AllocationState, mv: &SwapMove) -> f64 {
    let own = |student: usize, lost: usize, gained: usize| {
        let lambda = model.lambda(student);
        let bonus_after: f64 = model
            .friends_of(student, gained)
            .iter()
            .filter(|e| mv.holds_after(state, e.friend, gained))
            .map(|e| e.weight)
            .sum();
        let bonus_before = model.friend_bonus(state, student, lost);
        (1.0 - lambda) * (model.base(student, gained) - model.base(student, lost))
            + lambda * model.normalize_bonus(bonus_after - bonus_before)
    };

    let mut delta = own(mv.s1, mv.c1, mv.c2) + own(mv.s2, mv.c2, mv.c1);

    for x in merged_followers(model.followers(mv.s1), model.followers(mv.s2)) {
        if x == mv.s1 || x == mv.s2 {
            continue;
        }
        let mut raw = 0.0;
        if state.holds(x, mv.c1) {
            raw += model.pref(x, mv.s2, mv.c1) - model.pref(x, mv.s1, mv.c1);
        }
        if state.holds(x, mv.c2) {
            raw += model.pref(x, mv.s1, mv.c2) - model.pref(x, mv.s2, mv.c2);
        }
        if raw != 0.0 {
            delta += model.lambda(x) * model.normalize_bonus(raw);
        }
    }
    delta
}

/// Best strictly improving swap, if any.
///
/// Enumerates student pairs `s1 < s2`, then ascending `c1` held by `s1`,
/// then ascending `c2` held by `s2`. A later move only replaces the incumbent when its
/// delta is larger by more than [`IMPROVEMENT_EPS`].
pub fn best_swap(model: &UtilityModel, state: &AllocationState) -> Option<(SwapMove, f64)> {
    let n = model.n_students();
    let mut best: Option<SwapMove> = None;
    let mut best_delta = 0.0;

    for s1 in 0..n {
        for s2 in (s1 + 1)..n {
            for c1 in state.sorted_courses_of(s1) {
                if state.holds(s2, c1) {
                    continue;
                }
                for c2 in state.sorted_courses_of(s2) {
                    if c2 == c1 || state.holds(s1, c2) {
                        continue;
                    }
                    let mv = SwapMove { s1, c1, s2, c2 };
                    let delta = swap_delta(model, state, &mv);
                    if delta > best_delta + IMPROVEMENT_EPS {
                        best_delta = delta;
                        best = Some(mv);
                    }
                }
            }
        }
    }

    if best_delta > IMPROVEMENT_EPS {
        best.map(|mv| (mv, best_delta))
    } else {
        None
    }
}

/// Union of two ascending index lists, ascending and deduplicated.
fn merged_followers<'a>(a: &'a [usize], b: &'a [usize]) -> impl Iterator<Item = usize> + 'a {
    let (mut i, mut j) = (0, 0);
    std::iter::from_fn(move || match (a.get(i), b.get(j)) {
        (Some(&x), Some(&y)) => match x.cmp(&y) {
            Ordering::Less => {
                i += 1;
                Some(x)
            }
            Ordering::Greater => {
                j += 1;
                Some(y)
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
                Some(x)
            }
        },
        (Some(&x), None) => {
            i += 1;
            Some(x)
        }
        (None, Some(&y)) => {
            j += 1;
            Some(y)
        }
        (None, None) => None,
    })
}
