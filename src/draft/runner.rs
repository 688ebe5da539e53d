//! Snake draft execution.
//!
//! # Algorithm
//!
//! 1. Shuffle the sorted student list once with the run's draw stream
//! 2. For each round r = 1..=rounds:
//!    a. Turn order is the shuffled list for odd r, reversed for even r
//!    b. Each student scores every course with a free seat they do not
//!       hold, against the live allocation (so friends picked earlier in the
//!       same round already count)
//!    c. The best candidate by [`CandidateRanker`] is committed and logged
//! 3. Students with nothing feasible are skipped without a log entry

use tracing::{debug, info};

use super::types::{DraftOutcome, DraftPhase, PickLogEntry};
use crate::config::RunConfig;
use crate::ranking::{Candidate, CandidateRanker};
use crate::rng::DrawStream;
use crate::state::AllocationState;
use crate::utility::UtilityModel;

/// Seeded snake-draft scheduler.
pub struct DraftScheduler<'a> {
    model: &'a UtilityModel,
    ranker: CandidateRanker,
    rounds: usize,
    phase: DraftPhase,
}

impl<'a> DraftScheduler<'a> {
    /// Creates an idle scheduler for `config.draft_rounds()` rounds.
    pub fn new(model: &'a UtilityModel, config: &RunConfig) -> Self {
        Self {
            model,
            ranker: CandidateRanker::standard(config.tau),
            rounds: config.draft_rounds(),
            phase: DraftPhase::Idle,
        }
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    /// Runs the draft with a seeded turn order.
    ///
    /// # Panics
    /// Panics if this scheduler already ran.
    pub fn run(&mut self, state: &mut AllocationState, stream: &mut DrawStream) -> DraftOutcome {
        let mut order: Vec<usize> = (0..self.model.n_students()).collect();
        stream.shuffle(&mut order);
        self.run_with_order(state, stream, order)
    }

    /// Runs the draft with an explicit forward turn order.
    ///
    /// # Panics
    /// Panics if this scheduler already ran.
    pub fn run_with_order(
        &mut self,
        state: &mut AllocationState,
        stream: &mut DrawStream,
        order: Vec<usize>,
    ) -> DraftOutcome {
        assert_eq!(self.phase, DraftPhase::Idle, "draft scheduler already ran");
        info!(rounds = self.rounds, students = order.len(), "draft started");

        let mut picks = Vec::new();
        for round in 1..=self.rounds {
            self.phase = DraftPhase::Drafting { round };
            let forward = round % 2 == 1;
            let turns: Box<dyn Iterator<Item = &usize>> = if forward {
                Box::new(order.iter())
            } else {
                Box::new(order.iter().rev())
            };

            for &student in turns {
                if state.is_full(student) {
                    continue;
                }
                let feasible = (0..self.model.n_courses())
                    .filter(|&c| state.has_seat(c) && !state.holds(student, c));
                let candidates = score_candidates(self.model, state, stream, student, feasible);
                let Some(best) = self.ranker.select_best(&candidates) else {
                    continue;
                };
                let pick = candidates[best];

                state.assign(student, pick.course);
                debug!(
                    round,
                    student = self.model.student_id(student),
                    course = self.model.course_id(pick.course),
                    utility = pick.utility,
                    "draft pick"
                );
                picks.push(PickLogEntry {
                    round,
                    student: self.model.student_id(student).to_string(),
                    course: self.model.course_id(pick.course).to_string(),
                    utility: pick.utility,
                    base: pick.base,
                    friend_bonus: pick.friend_bonus,
                });
            }
        }

        self.phase = DraftPhase::Completed;
        info!(picks = picks.len(), "draft completed");
        DraftOutcome { order, picks }
    }
}

/// Scores `courses` for `student` against the live allocation.
///
/// Takes one draw per course, in the order given, whether or not the draw
/// ends up deciding anything.
pub(crate) fn score_candidates(
    model: &UtilityModel,
    state: &AllocationState,
    stream: &mut DrawStream,
    student: usize,
    courses: impl Iterator<Item = usize>,
) -> Vec<Candidate> {
    courses
        .map(|course| {
            let parts = model.utility(state, student, course);
            Candidate {
                course,
                utility: parts.total,
                base: parts.base,
                friend_bonus: parts.friend_bonus,
                position: model.position_a(student, course),
                score: model.score_a(student, course),
                draw: stream.draw(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FriendPreferenceRecord, LambdaRecord, PreferenceRecord};

    fn setup(
        prefs: &[PreferenceRecord],
        friends: &[FriendPreferenceRecord],
        lambdas: &[LambdaRecord],
        config: &RunConfig,
    ) -> (UtilityModel, AllocationState) {
        let model = UtilityModel::build(prefs, friends, lambdas, config).unwrap();
        let state = AllocationState::new(
            model.n_students(),
            model.n_courses(),
            config.cap_default,
            config.max_courses,
        );
        (model, state)
    }

    #[test]
    fn test_course_choice_ties_by_position() {
        let prefs = vec![
            PreferenceRecord::new("S1", "C1", 5.0, 1),
            PreferenceRecord::new("S1", "C2", 5.0, 2),
        ];
        let lambdas = vec![LambdaRecord::new("S1", 1.0)];
        let config = RunConfig::default()
            .with_cap_default(2)
            .with_max_courses(1)
            .with_seed(1);
        let (model, mut state) = setup(&prefs, &[], &lambdas, &config);
        let mut stream = DrawStream::new(config.seed);

        let outcome = DraftScheduler::new(&model, &config).run(&mut state, &mut stream);
        assert_eq!(outcome.picks.len(), 1);
        assert_eq!(outcome.picks[0].course, "C1");
    }

    #[test]
    fn test_snake_order_reverses_on_even_rounds() {
        // Everyone wants C1 most, then C2; one seat each.
        let mut prefs = Vec::new();
        for s in ["A", "B"] {
            prefs.push(PreferenceRecord::new(s, "C1", 1.0, 1));
            prefs.push(PreferenceRecord::new(s, "C2", 1.0, 2));
            prefs.push(PreferenceRecord::new(s, "C3", 1.0, 3));
            prefs.push(PreferenceRecord::new(s, "C4", 1.0, 4));
        }
        let config = RunConfig::default()
            .with_cap_default(1)
            .with_max_courses(2)
            .with_default_lambda(0.0);
        let (model, mut state) = setup(&prefs, &[], &[], &config);
        let mut stream = DrawStream::new(0);

        let mut scheduler = DraftScheduler::new(&model, &config);
        let outcome = scheduler.run_with_order(&mut state, &mut stream, vec![0, 1]);
        let sequence: Vec<(usize, &str, &str)> = outcome
            .picks
            .iter()
            .map(|p| (p.round, p.student.as_str(), p.course.as_str()))
            .collect();
        assert_eq!(
            sequence,
            vec![(1, "A", "C1"), (1, "B", "C2"), (2, "B", "C3"), (2, "A", "C4")]
        );
    }

    #[test]
    fn test_student_without_seats_is_skipped() {
        let prefs = vec![
            PreferenceRecord::new("A", "C1", 1.0, 1),
            PreferenceRecord::new("B", "C1", 1.0, 1),
        ];
        let config = RunConfig::default().with_cap_default(1).with_max_courses(1);
        let (model, mut state) = setup(&prefs, &[], &[], &config);
        let mut stream = DrawStream::new(3);

        let mut scheduler = DraftScheduler::new(&model, &config);
        assert_eq!(scheduler.phase(), DraftPhase::Idle);
        let outcome = scheduler.run_with_order(&mut state, &mut stream, vec![1, 0]);
        assert_eq!(scheduler.phase(), DraftPhase::Completed);
        assert_eq!(outcome.picks.len(), 1);
        assert_eq!(outcome.picks[0].student, "B");
        assert_eq!(state.course_count(0), 0);
    }

    #[test]
    fn test_reactive_bonus_within_round() {
        // B follows A into C2 even though B ranks C1 first.
        let prefs = vec![
            PreferenceRecord::new("A", "C2", 1.0, 1),
            PreferenceRecord::new("A", "C1", 1.0, 2),
            PreferenceRecord::new("B", "C1", 1.0, 1),
            PreferenceRecord::new("B", "C2", 1.0, 2),
        ];
        let friends = vec![FriendPreferenceRecord::new("B", "A", "C2", 1, None)];
        let lambdas = vec![LambdaRecord::new("A", 0.0), LambdaRecord::new("B", 0.8)];
        let config = RunConfig::default().with_cap_default(2).with_max_courses(1);
        let (model, mut state) = setup(&prefs, &friends, &lambdas, &config);
        let mut stream = DrawStream::new(5);

        let mut scheduler = DraftScheduler::new(&model, &config);
        let outcome = scheduler.run_with_order(&mut state, &mut stream, vec![0, 1]);
        assert_eq!(outcome.picks[1].student, "B");
        assert_eq!(outcome.picks[1].course, "C2");
        // 0.2 * Base(B,C2)=0 + 0.8 * 1.0
        assert!((outcome.picks[1].utility - 0.8).abs() < 1e-9);
        assert!((outcome.picks[1].friend_bonus - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_draw_per_feasible_course() {
        let prefs = vec![
            PreferenceRecord::new("A", "C1", 1.0, 1),
            PreferenceRecord::new("A", "C2", 1.0, 2),
            PreferenceRecord::new("A", "C3", 1.0, 3),
        ];
        let config = RunConfig::default().with_cap_default(1).with_max_courses(2);
        let (model, mut state) = setup(&prefs, &[], &[], &config);
        let mut stream = DrawStream::new(11);

        DraftScheduler::new(&model, &config).run_with_order(&mut state, &mut stream, vec![0]);
        // Round 1 scores three courses, round 2 the remaining two.
        assert_eq!(stream.draws(), 5);
    }

    #[test]
    #[should_panic(expected = "already ran")]
    fn test_scheduler_is_single_use() {
        let prefs = vec![PreferenceRecord::new("A", "C1", 1.0, 1)];
        let config = RunConfig::default().with_cap_default(1).with_max_courses(1);
        let (model, mut state) = setup(&prefs, &[], &[], &config);
        let mut stream = DrawStream::new(1);
        let mut scheduler = DraftScheduler::new(&model, &config);
        scheduler.run(&mut state, &mut stream);
        scheduler.run(&mut state, &mut stream);
    }
}
