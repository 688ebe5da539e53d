//! Post-draft local search.
//!
//! # Algorithm
//!
//! Runs exactly `post_iters` iterations, numbered after the draft rounds.
//!
//! - **Swap**: find the best strictly improving pairwise exchange over the
//!   whole allocation and apply it, or log a no-op.
//! - **Add-drop**: one pass over the draft order (forward on odd
//!   iterations, reversed on even ones) in which each student re-chooses
//!   their bundle. Every change is logged; a pass with none logs a no-op.
//! - **None**: nothing runs.

use tracing::{debug, info, trace};

use super::add_drop::rechoose_bundle;
use super::swap::best_swap;
use super::types::{PostAction, PostEvent};
use crate::config::{ImproveMode, RunConfig};
use crate::ranking::CandidateRanker;
use crate::rng::DrawStream;
use crate::state::AllocationState;
use crate::utility::UtilityModel;

/// Tolerance for checking an incremental delta against full recomputation.
const DELTA_CHECK_TOLERANCE: f64 = 1e-8;

/// Local-search phase over a drafted allocation.
pub struct PostPhaseOptimizer<'a> {
    model: &'a UtilityModel,
    mode: ImproveMode,
    iterations: usize,
    start_iteration: usize,
    ranker: CandidateRanker,
    sanity_checks: bool,
    delta_check_every: usize,
}

impl<'a> PostPhaseOptimizer<'a> {
    pub fn new(model: &'a UtilityModel, config: &RunConfig) -> Self {
        Self {
            model,
            mode: config.improve_mode,
            iterations: config.post_iters,
            start_iteration: config.draft_rounds() + 1,
            ranker: CandidateRanker::standard(config.tau),
            sanity_checks: config.sanity_checks,
            delta_check_every: config.delta_check_every,
        }
    }

    /// Overrides the number of the first iteration.
    pub fn with_start_iteration(mut self, start: usize) -> Self {
        self.start_iteration = start;
        self
    }

    /// Runs every iteration and returns the event log.
    ///
    /// `draft_order` is the forward turn order used by add-drop passes.
    ///
    /// # Panics
    /// Panics on an internal invariant violation when `sanity_checks` or
    /// `delta_check_every` is enabled.
    pub fn run(
        &self,
        state: &mut AllocationState,
        stream: &mut DrawStream,
        draft_order: &[usize],
    ) -> Vec<PostEvent> {
        if self.mode == ImproveMode::None || self.iterations == 0 {
            return Vec::new();
        }
        info!(mode = %self.mode, iterations = self.iterations, "post phase started");

        let mut events = Vec::new();
        let mut applied = 0usize;
        for offset in 0..self.iterations {
            let iteration = self.start_iteration + offset;
            match self.mode {
                ImproveMode::Swap => {
                    events.push(self.swap_iteration(state, iteration, &mut applied));
                }
                ImproveMode::AddDrop => {
                    self.add_drop_pass(state, stream, draft_order, iteration, &mut events);
                }
                ImproveMode::None => unreachable!(),
            }
        }

        let changes = events.iter().filter(|e| !e.is_no_op()).count();
        info!(events = events.len(), changes, "post phase completed");
        events
    }

    fn swap_iteration(
        &self,
        state: &mut AllocationState,
        iteration: usize,
        applied: &mut usize,
    ) -> PostEvent {
        let Some((mv, delta)) = best_swap(self.model, state) else {
            trace!(iteration, "no improving swap");
            return PostEvent::no_op(iteration);
        };

        *applied += 1;
        let verify = self.delta_check_every > 0 && *applied % self.delta_check_every == 0;
        let before = verify.then(|| self.model.global_welfare(state));

        state.swap(mv.s1, mv.c1, mv.s2, mv.c2);

        if let Some(before) = before {
            let actual = self.model.global_welfare(state) - before;
            assert!(
                (actual - delta).abs() <= DELTA_CHECK_TOLERANCE,
                "swap delta mismatch: expected {delta:.12}, got {actual:.12}"
            );
        }
        if self.sanity_checks {
            state.audit_student(mv.s1);
            state.audit_student(mv.s2);
            state.audit_course(mv.c1);
            state.audit_course(mv.c2);
        }

        let m = self.model;
        debug!(
            iteration,
            student_1 = m.student_id(mv.s1),
            course_1 = m.course_id(mv.c1),
            student_2 = m.student_id(mv.s2),
            course_2 = m.course_id(mv.c2),
            delta,
            "swap applied"
        );
        PostEvent {
            iteration,
            delta_welfare: delta,
            action: PostAction::Swap {
                student_1: m.student_id(mv.s1).to_string(),
                course_1: m.course_id(mv.c1).to_string(),
                student_2: m.student_id(mv.s2).to_string(),
                course_2: m.course_id(mv.c2).to_string(),
            },
        }
    }

    fn add_drop_pass(
        &self,
        state: &mut AllocationState,
        stream: &mut DrawStream,
        draft_order: &[usize],
        iteration: usize,
        events: &mut Vec<PostEvent>,
    ) {
        let forward = iteration % 2 == 1;
        let turns: Box<dyn Iterator<Item = &usize>> = if forward {
            Box::new(draft_order.iter())
        } else {
            Box::new(draft_order.iter().rev())
        };

        let mut changed = false;
        for &student in turns {
            let Some(change) = rechoose_bundle(self.model, state, stream, &self.ranker, student)
            else {
                continue;
            };
            changed = true;
            state.audit_student(student);
            if self.sanity_checks {
                for &c in change.dropped.iter().chain(&change.added) {
                    state.audit_course(c);
                }
            }

            let m = self.model;
            let ids = |courses: &[usize]| -> Vec<String> {
                courses.iter().map(|&c| m.course_id(c).to_string()).collect()
            };
            debug!(
                iteration,
                student = m.student_id(student),
                dropped = change.dropped.len(),
                added = change.added.len(),
                delta = change.delta,
                "bundle changed"
            );
            events.push(PostEvent {
                iteration,
                delta_welfare: change.delta,
                action: PostAction::AddDrop {
                    student: m.student_id(student).to_string(),
                    dropped: ids(&change.dropped),
                    added: ids(&change.added),
                },
            });
        }

        if !changed {
            trace!(iteration, "add-drop pass changed nothing");
            events.push(PostEvent::no_op(iteration));
        }
    }
}
