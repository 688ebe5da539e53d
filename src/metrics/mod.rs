//! Allocation quality metrics.
//!
//! Computes per-student welfare decompositions, a headline summary and an
//! extended report from a final allocation.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total utility | `Σ Total_s` |
//! | Base norm | `BaseSum_s / MaxBase_s` |
//! | Total norm | `Total_s / MaxTotalUpper_s` |
//! | Gini / Jain / Theil / Atkinson | See [`inequality`] |
//! | Rank satisfaction | Mean, median and top-1/top-3 share of held ranks |
//! | Friend overlap | Listed friends sharing a held course |

pub mod inequality;
mod report;
mod welfare;

pub use report::{ExtendedMetrics, SummaryMetrics};
pub use welfare::{per_student_welfare, PerStudentWelfare};
