//! Add-drop passes.
//!
//! Each student in turn re-chooses their whole bundle from the courses they
//! hold plus every course with a free seat, keeping the best `b` by the
//! draft's ranking cascade.

use crate::draft::score_candidates;
use crate::ranking::CandidateRanker;
use crate::rng::DrawStream;
use crate::state::AllocationState;
use crate::utility::UtilityModel;

/// Courses a student gave up and took, by dense index.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BundleChange {
    pub dropped: Vec<usize>,
    pub added: Vec<usize>,
    pub delta: f64,
}

/// Re-chooses the bundle of `student` and applies it.
///
/// Returns `None` when the best bundle is the one already held. Draws one
/// random value per candidate course, ascending, either way.
pub(crate) fn rechoose_bundle(
    model: &UtilityModel,
    state: &mut AllocationState,
    stream: &mut DrawStream,
    ranker: &CandidateRanker,
    student: usize,
) -> Option<BundleChange> {
    let candidates = {
        let open =
            (0..model.n_courses()).filter(|&c| state.holds(student, c) || state.has_seat(c));
        score_candidates(model, state, stream, student, open)
    };
    if candidates.is_empty() {
        return None;
    }

    let desired: Vec<usize> = ranker
        .top_n(&candidates, state.max_courses())
        .into_iter()
        .map(|i| candidates[i].course)
        .collect();
    if desired.len() == state.course_count(student)
        && desired.iter().all(|&c| state.holds(student, c))
    {
        return None;
    }

    let affected = affected_students(model, student);
    let before: f64 = affected
        .iter()
        .map(|&x| model.student_welfare(state, x))
        .sum();
    let (dropped, added) = state.replace(student, &desired);
    let after: f64 = affected
        .iter()
        .map(|&x| model.student_welfare(state, x))
        .sum();

    Some(BundleChange {
        dropped,
        added,
        delta: after - before,
    })
}

/// `student` plus everyone whose bonus can see them, ascending.
fn affected_students(model: &UtilityModel, student: usize) -> Vec<usize> {
    let followers = model.followers(student);
    let mut out = Vec::with_capacity(followers.len() + 1);
    out.extend(followers.iter().copied().filter(|&x| x != student));
    let at = out.partition_point(|&x| x < student);
    out.insert(at, student);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::records::{FriendPreferenceRecord, LambdaRecord, PreferenceRecord};

    fn model(
        prefs: &[PreferenceRecord],
        friends: &[FriendPreferenceRecord],
        lambdas: &[LambdaRecord],
    ) -> UtilityModel {
        UtilityModel::build(prefs, friends, lambdas, &RunConfig::default()).unwrap()
    }

    #[test]
    fn test_moves_to_free_favourite() {
        let prefs = vec![
            PreferenceRecord::new("A", "C1", 1.0, 1),
            PreferenceRecord::new("A", "C2", 1.0, 2),
            PreferenceRecord::new("A", "C3", 1.0, 3),
        ];
        let lambdas = vec![LambdaRecord::new("A", 0.0)];
        let model = model(&prefs, &[], &lambdas);
        let mut state = AllocationState::new(1, 3, 1, 1);
        state.assign(0, 2);
        let mut stream = DrawStream::new(0);
        let ranker = CandidateRanker::standard(1e-9);

        let change = rechoose_bundle(&model, &mut state, &mut stream, &ranker, 0).unwrap();
        assert_eq!(change.dropped, vec![2]);
        assert_eq!(change.added, vec![0]);
        assert!((change.delta - 1.0).abs() < 1e-9);
        assert_eq!(state.courses_of(0), &[0]);
        assert_eq!(state.capacity_left(2), 1);
        assert_eq!(state.capacity_left(0), 0);
        assert_eq!(stream.draws(), 3);
    }

    #[test]
    fn test_unchanged_bundle_is_none() {
        let prefs = vec![
            PreferenceRecord::new("A", "C1", 1.0, 1),
            PreferenceRecord::new("A", "C2", 1.0, 2),
        ];
        let lambdas = vec![LambdaRecord::new("A", 0.0)];
        let model = model(&prefs, &[], &lambdas);
        let mut state = AllocationState::new(1, 2, 1, 1);
        state.assign(0, 0);
        let before = state.clone();
        let mut stream = DrawStream::new(0);
        let ranker = CandidateRanker::standard(1e-9);

        assert!(rechoose_bundle(&model, &mut state, &mut stream, &ranker, 0).is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn test_full_course_is_not_a_candidate() {
        let prefs = vec![
            PreferenceRecord::new("A", "C1", 1.0, 1),
            PreferenceRecord::new("A", "C2", 1.0, 2),
            PreferenceRecord::new("B", "C1", 1.0, 1),
        ];
        let lambdas = vec![LambdaRecord::new("A", 0.0), LambdaRecord::new("B", 0.0)];
        let model = model(&prefs, &[], &lambdas);
        let mut state = AllocationState::new(2, 2, 1, 1);
        state.assign(1, 0);
        state.assign(0, 1);
        let mut stream = DrawStream::new(0);
        let ranker = CandidateRanker::standard(1e-9);

        assert!(rechoose_bundle(&model, &mut state, &mut stream, &ranker, 0).is_none());
        state.audit();
    }

    #[test]
    fn test_delta_counts_followers() {
        // B sits in C2 only because A is there. When A moves to C1, B's
        // bonus disappears and the delta has to show it.
        let prefs = vec![
            PreferenceRecord::new("A", "C1", 1.0, 1),
            PreferenceRecord::new("A", "C2", 1.0, 2),
            PreferenceRecord::new("B", "C2", 1.0, 2),
        ];
        let friends = vec![FriendPreferenceRecord::new("B", "A", "C2", 1, None)];
        let lambdas = vec![LambdaRecord::new("A", 0.0), LambdaRecord::new("B", 1.0)];
        let model = model(&prefs, &friends, &lambdas);
        let mut state = AllocationState::new(2, 2, 2, 1);
        state.assign(0, 1);
        state.assign(1, 1);
        let mut stream = DrawStream::new(0);
        let ranker = CandidateRanker::standard(1e-9);

        let before = model.global_welfare(&state);
        let change = rechoose_bundle(&model, &mut state, &mut stream, &ranker, 0).unwrap();
        let after = model.global_welfare(&state);
        assert!((change.delta - (after - before)).abs() < 1e-9);
        assert!(change.delta.abs() < 1e-9);
    }

    #[test]
    fn test_affected_students_sorted() {
        let prefs = vec![
            PreferenceRecord::new("A", "C1", 1.0, 1),
            PreferenceRecord::new("B", "C1", 1.0, 1),
            PreferenceRecord::new("C", "C1", 1.0, 1),
        ];
        let friends = vec![
            FriendPreferenceRecord::new("A", "B", "C1", 1, None),
            FriendPreferenceRecord::new("C", "B", "C1", 1, None),
        ];
        let model = model(&prefs, &friends, &[]);
        assert_eq!(affected_students(&model, 1), vec![0, 1, 2]);
        assert_eq!(affected_students(&model, 0), vec![0]);
    }
}
