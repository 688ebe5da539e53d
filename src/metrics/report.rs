//! Run-level summary and extended metrics.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::inequality::{atkinson, gini, jain, percentile, theil};
use super::welfare::PerStudentWelfare;
use crate::config::{ImproveMode, RunConfig};
use crate::state::AllocationState;
use crate::utility::UtilityModel;

/// Inequality aversion used for the reported Atkinson index.
const ATKINSON_EPSILON: f64 = 0.5;

/// Headline numbers of a run plus the parameters that produced them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SummaryMetrics {
    /// Global welfare `Σ Total_s`.
    pub total_utility: f64,
    /// Gini over `BaseNorm_s`.
    pub gini_base_norm: f64,
    /// Gini over `TotalNorm_s`.
    pub gini_total_norm: f64,
    pub seed: u64,
    pub cap_default: u32,
    pub max_courses: usize,
    pub draft_rounds: usize,
    pub post_iters: usize,
    pub improve_mode: ImproveMode,
}

impl SummaryMetrics {
    pub fn calculate(welfare: &[PerStudentWelfare], config: &RunConfig) -> Self {
        let base_norm: Vec<f64> = welfare.iter().map(|w| w.base_norm).collect();
        let total_norm: Vec<f64> = welfare.iter().map(|w| w.total_norm).collect();
        Self {
            total_utility: welfare.iter().map(|w| w.total).sum(),
            gini_base_norm: gini(&base_norm),
            gini_total_norm: gini(&total_norm),
            seed: config.seed,
            cap_default: config.cap_default,
            max_courses: config.max_courses,
            draft_rounds: config.draft_rounds(),
            post_iters: config.post_iters,
            improve_mode: config.improve_mode,
        }
    }
}

/// Descriptive statistics and fairness indices of a final allocation.
///
/// Averages are per student unless noted; every ratio is 0 when its
/// denominator is empty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtendedMetrics {
    pub total_utility: f64,
    pub total_base_utility: f64,
    /// Sum of normalized friend terms.
    pub total_friend_utility: f64,
    pub avg_utility_per_student: f64,
    pub avg_courses_per_student: f64,
    /// Share of students holding `b` courses.
    pub students_full_alloc_rate: f64,
    pub unfilled_seats_total: u64,
    pub course_fill_rate_mean: f64,
    /// Mean Table 1 rank over allocated courses that have one.
    pub avg_position: f64,
    /// Element `n/2` of the sorted ranks.
    pub median_position: f64,
    pub share_top1: f64,
    pub share_top3: f64,
    pub avg_friend_overlaps_per_student: f64,
    pub share_students_with_any_friend_overlap: f64,
    pub gini_total_norm: f64,
    pub gini_base_norm: f64,
    /// Indices below are over raw `Total_s`.
    pub jain_index: f64,
    pub theil_index: f64,
    pub atkinson_index: f64,
    pub utility_min: f64,
    pub utility_p10: f64,
    pub utility_p25: f64,
    pub utility_p50: f64,
    pub utility_p75: f64,
    pub utility_p90: f64,
}

impl ExtendedMetrics {
    /// Computes the metrics from the welfare rows and the final state.
    pub fn calculate(
        model: &UtilityModel,
        state: &AllocationState,
        welfare: &[PerStudentWelfare],
    ) -> Self {
        let n = welfare.len();
        let per_student = |x: f64| if n == 0 { 0.0 } else { x / n as f64 };

        let totals: Vec<f64> = welfare.iter().map(|w| w.total).collect();
        let base_norm: Vec<f64> = welfare.iter().map(|w| w.base_norm).collect();
        let total_norm: Vec<f64> = welfare.iter().map(|w| w.total_norm).collect();
        let total_utility: f64 = totals.iter().sum();

        let held: usize = (0..n).map(|s| state.course_count(s)).sum();
        let full = (0..n).filter(|&s| state.is_full(s)).count();
        let n_courses = state.n_courses();
        let course_fill_rate_mean = if n_courses == 0 {
            0.0
        } else {
            (0..n_courses).map(|c| state.fill_rate(c)).sum::<f64>() / n_courses as f64
        };

        let mut positions: Vec<u32> = (0..n)
            .flat_map(move |s| {
                state
                    .sorted_courses_of(s)
                    .filter_map(move |c| model.position_a(s, c))
            })
            .collect();
        positions.sort_unstable();
        let share = |count: usize| {
            if positions.is_empty() {
                0.0
            } else {
                count as f64 / positions.len() as f64
            }
        };
        let avg_position = if positions.is_empty() {
            0.0
        } else {
            positions.iter().map(|&p| p as f64).sum::<f64>() / positions.len() as f64
        };
        let median_position = positions.get(positions.len() / 2).map_or(0.0, |&p| p as f64);
        let share_top1 = share(positions.iter().filter(|&&p| p <= 1).count());
        let share_top3 = share(positions.iter().filter(|&&p| p <= 3).count());

        let overlaps: usize = welfare.iter().map(|w| w.friend_overlaps).sum();
        let with_overlap = welfare.iter().filter(|w| w.friend_overlaps > 0).count();

        let mut sorted_totals = totals.clone();
        sorted_totals.sort_by(f64::total_cmp);

        Self {
            total_utility,
            total_base_utility: welfare.iter().map(|w| w.base_sum).sum(),
            total_friend_utility: welfare.iter().map(|w| w.friend_sum_norm).sum(),
            avg_utility_per_student: per_student(total_utility),
            avg_courses_per_student: per_student(held as f64),
            students_full_alloc_rate: per_student(full as f64),
            unfilled_seats_total: state.unfilled_seats(),
            course_fill_rate_mean,
            avg_position,
            median_position,
            share_top1,
            share_top3,
            avg_friend_overlaps_per_student: per_student(overlaps as f64),
            share_students_with_any_friend_overlap: per_student(with_overlap as f64),
            gini_total_norm: gini(&total_norm),
            gini_base_norm: gini(&base_norm),
            jain_index: jain(&totals),
            theil_index: theil(&totals),
            atkinson_index: atkinson(&totals, ATKINSON_EPSILON),
            utility_min: sorted_totals.first().copied().unwrap_or(0.0),
            utility_p10: percentile(&sorted_totals, 0.10),
            utility_p25: percentile(&sorted_totals, 0.25),
            utility_p50: percentile(&sorted_totals, 0.50),
            utility_p75: percentile(&sorted_totals, 0.75),
            utility_p90: percentile(&sorted_totals, 0.90),
        }
    }

    /// Flat `(name, value)` pairs in a stable order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("total_utility", self.total_utility),
            ("total_base_utility", self.total_base_utility),
            ("total_friend_utility", self.total_friend_utility),
            ("avg_utility_per_student", self.avg_utility_per_student),
            ("avg_courses_per_student", self.avg_courses_per_student),
            ("students_full_alloc_rate", self.students_full_alloc_rate),
            ("unfilled_seats_total", self.unfilled_seats_total as f64),
            ("course_fill_rate_mean", self.course_fill_rate_mean),
            ("avg_position", self.avg_position),
            ("median_position", self.median_position),
            ("share_top1", self.share_top1),
            ("share_top3", self.share_top3),
            (
                "avg_friend_overlaps_per_student",
                self.avg_friend_overlaps_per_student,
            ),
            (
                "share_students_with_any_friend_overlap",
                self.share_students_with_any_friend_overlap,
            ),
            ("gini_total_norm", self.gini_total_norm),
            ("gini_base_norm", self.gini_base_norm),
            ("jain_index", self.jain_index),
            ("theil_index", self.theil_index),
            ("atkinson_index_e0_5", self.atkinson_index),
            ("utility_min", self.utility_min),
            ("utility_p10", self.utility_p10),
            ("utility_p25", self.utility_p25),
            ("utility_p50", self.utility_p50),
            ("utility_p75", self.utility_p75),
            ("utility_p90", self.utility_p90),
        ]
    }
}
