//! Precomputed utility tables and the reactive utility function.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::policy::FriendPrefPolicy;
use super::scale::{pos_u, ScoreRange};
use crate::config::RunConfig;
use crate::error::{AllocError, AllocResult};
use crate::records::{FriendPreferenceRecord, LambdaRecord, PreferenceRecord};
use crate::state::AllocationState;

/// Friend rank scale used when no friend record carries a position.
const DEFAULT_FRIEND_RANKS: usize = 3;

/// One retained friend edge for a (student, course).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FriendEdge {
    pub friend: usize,
    pub weight: f64,
}

/// Decomposition of `U(s, c)` at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilityParts {
    /// `(1-λ)·Base + λ·FriendBonusNorm`.
    pub total: f64,
    pub base: f64,
    /// Friend bonus divided by the theoretical maximum.
    pub friend_bonus: f64,
}

/// Immutable lookup tables built once from the input records.
///
/// Students and courses are stored sorted, and every other table is keyed by
/// their dense indices.
#[derive(Debug, Clone)]
pub struct UtilityModel {
    students: Vec<String>,
    courses: Vec<String>,
    student_index: HashMap<String, usize>,
    course_index: HashMap<String, usize>,
    /// Row-major `[student][course]` tables.
    base: Vec<f64>,
    position_a: Vec<Option<u32>>,
    score_a: Vec<Option<f64>>,
    lambda: Vec<f64>,
    /// Retained friend edges per (student, course), best first.
    friends: HashMap<(usize, usize), Vec<FriendEdge>>,
    /// Students that list the key student as a friend in any course, ascending.
    followers: Vec<Vec<usize>>,
    k_friend: usize,
    max_friend_bonus: f64,
    policy: FriendPrefPolicy,
}

impl UtilityModel {
    /// Builds the tables.
    ///
    /// Fails if a lambda record (or the configured default) is outside
    /// `[0, 1]`, or if the tables name no students or no courses.
    pub fn build(
        preferences: &[PreferenceRecord],
        friend_prefs: &[FriendPreferenceRecord],
        lambdas: &[LambdaRecord],
        config: &RunConfig,
    ) -> AllocResult<Self> {
        for rec in lambdas {
            if !(0.0..=1.0).contains(&rec.lambda) {
                return Err(AllocError::LambdaOutOfRange {
                    student: rec.student.clone(),
                    value: rec.lambda,
                });
            }
        }
        if !(0.0..=1.0).contains(&config.default_lambda) {
            return Err(AllocError::LambdaOutOfRange {
                student: "<default>".into(),
                value: config.default_lambda,
            });
        }

        let mut student_set: BTreeSet<&str> = BTreeSet::new();
        let mut course_set: BTreeSet<&str> = BTreeSet::new();
        for r in preferences {
            student_set.insert(&r.student);
            course_set.insert(&r.course);
        }
        for r in friend_prefs {
            student_set.insert(&r.student);
            student_set.insert(&r.friend);
            course_set.insert(&r.course);
        }
        if student_set.is_empty() {
            return Err(AllocError::EmptyUniverse("students"));
        }
        if course_set.is_empty() {
            return Err(AllocError::EmptyUniverse("courses"));
        }

        let students: Vec<String> = student_set.into_iter().map(str::to_owned).collect();
        let courses: Vec<String> = course_set.into_iter().map(str::to_owned).collect();
        let student_index: HashMap<String, usize> = students
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let course_index: HashMap<String, usize> = courses
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        let n_students = students.len();
        let n_courses = courses.len();

        // ---- Table 1 ----
        let mut base = vec![0.0; n_students * n_courses];
        let mut position_a = vec![None; n_students * n_courses];
        let mut score_a = vec![None; n_students * n_courses];
        for r in preferences {
            let idx = student_index[&r.student] * n_courses + course_index[&r.course];
            base[idx] = pos_u(r.position, n_courses);
            position_a[idx] = r.position;
            score_a[idx] = r.score;
        }

        // ---- Lambdas ----
        let mut lambda = vec![config.default_lambda; n_students];
        for r in lambdas {
            if let Some(&s) = student_index.get(&r.student) {
                lambda[s] = r.lambda;
            }
        }

        // ---- Table 2: group, filter to top-K, weight ----
        let k_friend = friend_prefs
            .iter()
            .filter_map(|r| r.position)
            .max()
            .map(|p| (p as usize).max(1))
            .unwrap_or(DEFAULT_FRIEND_RANKS);
        let top_k = config.friend_top_k.unwrap_or(k_friend);
        if !friend_prefs.is_empty() && top_k > k_friend {
            return Err(AllocError::InvalidConfig(format!(
                "friend_top_k {top_k} exceeds the deepest friend rank {k_friend}"
            )));
        }

        let mut groups: HashMap<(usize, usize), Vec<&FriendPreferenceRecord>> = HashMap::new();
        for r in friend_prefs {
            let key = (student_index[&r.student], course_index[&r.course]);
            groups.entry(key).or_default().push(r);
        }
        for items in groups.values_mut() {
            items.sort_by(|a, b| friend_record_order(a, b));
            items.truncate(top_k);
        }

        let score_range = ScoreRange::observe(
            groups
                .values()
                .flat_map(|items| items.iter().filter_map(|r| r.score)),
        );
        let policy = config.friend_policy;
        let max_friend_bonus = policy.max_bonus(k_friend, score_range.is_some());

        let mut friends: HashMap<(usize, usize), Vec<FriendEdge>> = HashMap::new();
        let mut follower_sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_students];
        for (&(s, c), items) in &groups {
            let edges: Vec<FriendEdge> = items
                .iter()
                .map(|r| {
                    let f = student_index[&r.friend];
                    follower_sets[f].insert(s);
                    FriendEdge {
                        friend: f,
                        weight: policy.weight(r.position, r.score, k_friend, score_range),
                    }
                })
                .collect();
            friends.insert((s, c), edges);
        }
        let followers = follower_sets
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect();

        debug!(
            students = n_students,
            courses = n_courses,
            friend_groups = friends.len(),
            k_friend,
            max_friend_bonus,
            "utility model built"
        );

        Ok(Self {
            students,
            courses,
            student_index,
            course_index,
            base,
            position_a,
            score_a,
            lambda,
            friends,
            followers,
            k_friend,
            max_friend_bonus,
            policy,
        })
    }

    // ---- Universe ----

    /// Sorted student identifiers.
    pub fn students(&self) -> &[String] {
        &self.students
    }

    /// Sorted course identifiers.
    pub fn courses(&self) -> &[String] {
        &self.courses
    }

    pub fn n_students(&self) -> usize {
        self.students.len()
    }

    pub fn n_courses(&self) -> usize {
        self.courses.len()
    }

    pub fn student_id(&self, student: usize) -> &str {
        &self.students[student]
    }

    pub fn course_id(&self, course: usize) -> &str {
        &self.courses[course]
    }

    pub fn student_index(&self, id: &str) -> Option<usize> {
        self.student_index.get(id).copied()
    }

    pub fn course_index(&self, id: &str) -> Option<usize> {
        self.course_index.get(id).copied()
    }

    /// Largest friend rank in the data (`K_friend`).
    pub fn k_friend(&self) -> usize {
        self.k_friend
    }

    pub fn policy(&self) -> FriendPrefPolicy {
        self.policy
    }

    /// Theoretical maximum raw friend bonus for one (student, course).
    pub fn max_friend_bonus(&self) -> f64 {
        self.max_friend_bonus
    }

    // ---- Static lookups ----

    /// `Base(s, c)`; 0 when the student did not rank the course.
    #[inline]
    pub fn base(&self, student: usize, course: usize) -> f64 {
        self.base[student * self.courses.len() + course]
    }

    /// Table 1 rank, `None` when missing.
    pub fn position_a(&self, student: usize, course: usize) -> Option<u32> {
        self.position_a[student * self.courses.len() + course]
    }

    /// Table 1 raw score, `None` when missing.
    pub fn score_a(&self, student: usize, course: usize) -> Option<f64> {
        self.score_a[student * self.courses.len() + course]
    }

    #[inline]
    pub fn lambda(&self, student: usize) -> f64 {
        self.lambda[student]
    }

    /// Retained friend edges of `student` in `course`, best first.
    pub fn friends_of(&self, student: usize, course: usize) -> &[FriendEdge] {
        self.friends
            .get(&(student, course))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Students that list `friend` in any course, ascending.
    pub fn followers(&self, friend: usize) -> &[usize] {
        &self.followers[friend]
    }

    /// `Pref(s, f, c)`; 0 when no retained edge exists.
    ///
    /// Repeated records for the same friend add up, matching how they count
    /// toward the bonus.
    pub fn pref(&self, student: usize, friend: usize, course: usize) -> f64 {
        self.friends_of(student, course)
            .iter()
            .filter(|e| e.friend == friend)
            .map(|e| e.weight)
            .sum()
    }

    /// Sum of all retained friend weights for (s, c), whether or not the
    /// friends hold the course.
    pub fn friend_weight_total(&self, student: usize, course: usize) -> f64 {
        self.friends_of(student, course).iter().map(|e| e.weight).sum()
    }

    // ---- Reactive utility ----

    /// Raw reactive bonus: weights of friends currently holding `course`.
    pub fn friend_bonus(&self, state: &AllocationState, student: usize, course: usize) -> f64 {
        self.friends_of(student, course)
            .iter()
            .filter(|e| state.holds(e.friend, course))
            .map(|e| e.weight)
            .sum()
    }

    /// Scales a raw bonus by the theoretical maximum.
    #[inline]
    pub fn normalize_bonus(&self, raw: f64) -> f64 {
        if self.max_friend_bonus <= 0.0 {
            0.0
        } else {
            raw / self.max_friend_bonus
        }
    }

    /// `U(s, c)` against the current allocation.
    pub fn utility(&self, state: &AllocationState, student: usize, course: usize) -> UtilityParts {
        let base = self.base(student, course);
        let friend_bonus = self.normalize_bonus(self.friend_bonus(state, student, course));
        let lambda = self.lambda(student);
        UtilityParts {
            total: (1.0 - lambda) * base + lambda * friend_bonus,
            base,
            friend_bonus,
        }
    }

    /// `W_s`: summed utility of the courses `student` holds.
    pub fn student_welfare(&self, state: &AllocationState, student: usize) -> f64 {
        state
            .sorted_courses_of(student)
            .map(|c| self.utility(state, student, c).total)
            .sum()
    }

    /// `W`: welfare summed over all students.
    pub fn global_welfare(&self, state: &AllocationState) -> f64 {
        (0..self.n_students())
            .map(|s| self.student_welfare(state, s))
            .sum()
    }
}

/// Best friend records first: higher score, then better rank, then friend id.
/// Missing scores and ranks sort last.
fn friend_record_order(a: &FriendPreferenceRecord, b: &FriendPreferenceRecord) -> Ordering {
    let score_a = a.score.unwrap_or(f64::NEG_INFINITY);
    let score_b = b.score.unwrap_or(f64::NEG_INFINITY);
    score_b
        .total_cmp(&score_a)
        .then_with(|| {
            a.position
                .unwrap_or(u32::MAX)
                .cmp(&b.position.unwrap_or(u32::MAX))
        })
        .then_with(|| a.friend.cmp(&b.friend))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RunConfig {
        RunConfig::default().with_cap_default(2).with_max_courses(1)
    }

    #[test]
    fn test_base_utility_from_table() {
        let prefs = vec![
            PreferenceRecord::new("S1", "C1", 10.0, 1),
            PreferenceRecord::new("S1", "C2", 5.0, 2),
        ];
        let model = UtilityModel::build(&prefs, &[], &[], &config()).unwrap();
        assert!((model.base(0, 0) - 1.0).abs() < 1e-9);
        assert!((model.base(0, 1) - 0.0).abs() < 1e-9);
        assert_eq!(model.position_a(0, 1), Some(2));
        assert_eq!(model.score_a(0, 0), Some(10.0));
    }

    #[test]
    fn test_missing_preference_is_zero() {
        let prefs = vec![
            PreferenceRecord::new("S1", "C1", 1.0, 1),
            PreferenceRecord::new("S2", "C2", 1.0, 1),
        ];
        let model = UtilityModel::build(&prefs, &[], &[], &config()).unwrap();
        let s1 = model.student_index("S1").unwrap();
        let c2 = model.course_index("C2").unwrap();
        assert!((model.base(s1, c2) - 0.0).abs() < 1e-12);
        assert_eq!(model.position_a(s1, c2), None);
    }

    #[test]
    fn test_friend_bonus_reactive() {
        let prefs = vec![
            PreferenceRecord::new("S1", "C1", 10.0, 1),
            PreferenceRecord::new("S2", "C1", 10.0, 1),
        ];
        let friends = vec![FriendPreferenceRecord::new("S1", "S2", "C1", 1, None)];
        let lambdas = vec![LambdaRecord::new("S1", 1.0), LambdaRecord::new("S2", 1.0)];
        let model = UtilityModel::build(&prefs, &friends, &lambdas, &config()).unwrap();
        let mut state = AllocationState::new(2, 1, 2, 1);

        assert!((model.friend_bonus(&state, 0, 0) - 0.0).abs() < 1e-9);

        state.assign(1, 0);
        assert!((model.friend_bonus(&state, 0, 0) - 1.0).abs() < 1e-9);

        let parts = model.utility(&state, 0, 0);
        assert!((parts.base - 1.0).abs() < 1e-9);
        assert!((parts.friend_bonus - 1.0).abs() < 1e-9);
        assert!((parts.total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_friend_move_does_not_change_bonus() {
        let prefs = vec![PreferenceRecord::new("S1", "C1", 1.0, 1)];
        let friends = vec![
            FriendPreferenceRecord::new("S1", "S2", "C1", 1, Some(5.0)),
            FriendPreferenceRecord::new("S1", "S3", "C2", 1, Some(3.0)),
        ];
        let model = UtilityModel::build(&prefs, &friends, &[], &config()).unwrap();
        let (s1, s2, s3) = (0, 1, 2);
        let (c1, c2) = (0, 1);
        let mut state = AllocationState::new(3, 2, 2, 1);
        state.assign(s2, c1);
        let before = model.friend_bonus(&state, s1, c1);
        state.assign(s3, c2);
        assert!((model.friend_bonus(&state, s1, c1) - before).abs() < 1e-12);
    }

    #[test]
    fn test_universe_includes_friend_only_ids() {
        let prefs = vec![PreferenceRecord::new("S1", "C1", 1.0, 1)];
        let friends = vec![FriendPreferenceRecord::new("S1", "S9", "C4", 1, None)];
        let model = UtilityModel::build(&prefs, &friends, &[], &config()).unwrap();
        assert_eq!(model.students(), &["S1".to_string(), "S9".to_string()]);
        assert_eq!(model.courses(), &["C1".to_string(), "C4".to_string()]);
        assert_eq!(model.followers(1), &[0]);
    }

    #[test]
    fn test_top_k_keeps_best_friends() {
        let prefs = vec![PreferenceRecord::new("A", "C1", 1.0, 1)];
        let friends = vec![
            FriendPreferenceRecord::new("A", "B", "C1", 1, Some(2.0)),
            FriendPreferenceRecord::new("A", "C", "C1", 2, Some(5.0)),
            FriendPreferenceRecord::new("A", "D", "C1", 3, Some(5.0)),
        ];
        let cfg = config().with_friend_top_k(2);
        let model = UtilityModel::build(&prefs, &friends, &[], &cfg).unwrap();
        let a = model.student_index("A").unwrap();
        let kept: Vec<&str> = model
            .friends_of(a, 0)
            .iter()
            .map(|e| model.student_id(e.friend))
            .collect();
        assert_eq!(kept, vec!["C", "D"]);
        // B was filtered out, so it carries no weight.
        let b = model.student_index("B").unwrap();
        assert!((model.pref(a, b, 0) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_k_beyond_deepest_rank_rejected() {
        let prefs = vec![PreferenceRecord::new("A", "C1", 1.0, 1)];
        let friends = vec![
            FriendPreferenceRecord::new("A", "B", "C1", 1, Some(5.0)),
            FriendPreferenceRecord::new("A", "C", "C1", 1, Some(5.0)),
            FriendPreferenceRecord::new("A", "D", "C1", 1, Some(5.0)),
        ];
        let cfg = config().with_friend_top_k(3);
        let err = UtilityModel::build(&prefs, &friends, &[], &cfg).unwrap_err();
        assert!(matches!(err, AllocError::InvalidConfig(_)));

        // Keeping every rank is still allowed and stays within the maximum.
        let cfg = config().with_friend_top_k(1);
        let model = UtilityModel::build(&prefs, &friends, &[], &cfg).unwrap();
        assert_eq!(model.k_friend(), 1);
        assert!(model.normalize_bonus(model.friend_weight_total(0, 0)) <= 1.0 + 1e-12);
    }

    #[test]
    fn test_max_friend_bonus_by_data() {
        let prefs = vec![PreferenceRecord::new("S1", "C1", 1.0, 1)];
        let ranked_only = vec![
            FriendPreferenceRecord::new("S1", "S2", "C1", 1, None),
            FriendPreferenceRecord::new("S1", "S3", "C1", 3, None),
        ];
        let model = UtilityModel::build(&prefs, &ranked_only, &[], &config()).unwrap();
        assert_eq!(model.k_friend(), 3);
        assert!((model.max_friend_bonus() - 2.0).abs() < 1e-9);

        let scored = vec![
            FriendPreferenceRecord::new("S1", "S2", "C1", 1, Some(4.0)),
            FriendPreferenceRecord::new("S1", "S3", "C1", 2, Some(1.0)),
        ];
        let model = UtilityModel::build(&prefs, &scored, &[], &config()).unwrap();
        assert!((model.max_friend_bonus() - 2.0).abs() < 1e-9);
        assert!((model.pref(0, 1, 0) - 1.0).abs() < 1e-9);
        assert!((model.pref(0, 2, 0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_lambda_defaults_and_overrides() {
        let prefs = vec![
            PreferenceRecord::new("S1", "C1", 1.0, 1),
            PreferenceRecord::new("S2", "C1", 1.0, 1),
        ];
        let lambdas = vec![LambdaRecord::new("S2", 0.9), LambdaRecord::new("ghost", 0.1)];
        let model = UtilityModel::build(&prefs, &[], &lambdas, &config()).unwrap();
        assert!((model.lambda(0) - 0.3).abs() < 1e-12);
        assert!((model.lambda(1) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_lambda_out_of_range_rejected() {
        let prefs = vec![PreferenceRecord::new("S1", "C1", 5.0, 1)];
        let lambdas = vec![LambdaRecord::new("S1", 1.5)];
        let err = UtilityModel::build(&prefs, &[], &lambdas, &config()).unwrap_err();
        assert!(matches!(err, AllocError::LambdaOutOfRange { .. }));
    }

    #[test]
    fn test_empty_tables_rejected() {
        let err = UtilityModel::build(&[], &[], &[], &config()).unwrap_err();
        assert_eq!(err, AllocError::EmptyUniverse("students"));
    }
}
