//! Per-student welfare decomposition.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::records::{CourseId, StudentId};
use crate::state::AllocationState;
use crate::utility::UtilityModel;

/// Welfare of one student under the final allocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerStudentWelfare {
    pub student: StudentId,
    pub lambda: f64,
    /// Held courses in acquisition order.
    pub courses: Vec<CourseId>,
    /// `Σ Base(s, c)` over held courses.
    pub base_sum: f64,
    /// Raw friend overlap weight over held courses.
    pub friend_sum_raw: f64,
    /// `friend_sum_raw / MaxFriendBonus`.
    pub friend_sum_norm: f64,
    /// `(1-λ)·base_sum + λ·friend_sum_norm`.
    pub total: f64,
    /// Best achievable `base_sum` with `b` courses.
    pub max_base: f64,
    /// Upper bound on `total` assuming every listed friend joins.
    pub max_total_upper: f64,
    pub base_norm: f64,
    pub total_norm: f64,
    /// Friends holding the same course, counted per (course, friend).
    pub friend_overlaps: usize,
}

/// Decomposes welfare for every student, in student order.
pub fn per_student_welfare(
    model: &UtilityModel,
    state: &AllocationState,
) -> Vec<PerStudentWelfare> {
    #[cfg(feature = "parallel")]
    {
        (0..model.n_students())
            .into_par_iter()
            .map(|s| student_welfare(model, state, s))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..model.n_students())
            .map(|s| student_welfare(model, state, s))
            .collect()
    }
}

fn student_welfare(model: &UtilityModel, state: &AllocationState, s: usize) -> PerStudentWelfare {
    let lambda = model.lambda(s);
    let b = state.max_courses();

    let mut base_sum = 0.0;
    let mut friend_sum_raw = 0.0;
    let mut friend_overlaps = 0;
    for c in state.sorted_courses_of(s) {
        base_sum += model.base(s, c);
        for edge in model.friends_of(s, c) {
            if state.holds(edge.friend, c) {
                friend_sum_raw += edge.weight;
                friend_overlaps += 1;
            }
        }
    }
    let friend_sum_norm = model.normalize_bonus(friend_sum_raw);
    let total = (1.0 - lambda) * base_sum + lambda * friend_sum_norm;

    let max_base = top_sum((0..model.n_courses()).map(|c| model.base(s, c)), b);
    let max_total_upper = top_sum(
        (0..model.n_courses()).map(|c| {
            (1.0 - lambda) * model.base(s, c)
                + lambda * model.normalize_bonus(model.friend_weight_total(s, c))
        }),
        b,
    );

    PerStudentWelfare {
        student: model.student_id(s).to_string(),
        lambda,
        courses: state
            .courses_of(s)
            .iter()
            .map(|&c| model.course_id(c).to_string())
            .collect(),
        base_sum,
        friend_sum_raw,
        friend_sum_norm,
        total,
        max_base,
        max_total_upper,
        base_norm: ratio(base_sum, max_base),
        total_norm: ratio(total, max_total_upper),
        friend_overlaps,
    }
}

/// Sum of the `k` largest values.
fn top_sum(values: impl Iterator<Item = f64>, k: usize) -> f64 {
    let mut xs: Vec<f64> = values.collect();
    xs.sort_by(|a, b| b.total_cmp(a));
    xs.iter().take(k).sum()
}

fn ratio(value: f64, bound: f64) -> f64 {
    if bound > 0.0 {
        value / bound
    } else {
        0.0
    }
}
