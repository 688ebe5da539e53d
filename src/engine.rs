//! End-to-end allocation run.
//!
//! [`AllocationEngine`] validates inputs once, then every call to
//! [`run`](AllocationEngine::run) starts from an empty allocation and a
//! freshly seeded draw stream, so repeated runs return identical results.

use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RunConfig;
use crate::draft::{DraftScheduler, PickLogEntry};
use crate::error::{AllocError, AllocResult};
use crate::improve::{PostEvent, PostPhaseOptimizer};
use crate::metrics::{per_student_welfare, ExtendedMetrics, PerStudentWelfare, SummaryMetrics};
use crate::records::{CourseId, FriendPreferenceRecord, LambdaRecord, PreferenceRecord, StudentId};
use crate::rng::DrawStream;
use crate::state::AllocationState;
use crate::utility::UtilityModel;

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunResult {
    /// Final courses per student, in acquisition order.
    pub allocation: BTreeMap<StudentId, Vec<CourseId>>,
    /// Forward draft turn order.
    pub draft_order: Vec<StudentId>,
    pub pick_log: Vec<PickLogEntry>,
    pub post_log: Vec<PostEvent>,
    /// One row per student, sorted by id.
    pub welfare: Vec<PerStudentWelfare>,
    pub summary: SummaryMetrics,
    pub extended: ExtendedMetrics,
}

/// Draft, improve, measure.
///
/// # Examples
///
/// ```
/// use draft_alloc::{AllocationEngine, PreferenceRecord, RunConfig};
///
/// let prefs = vec![
///     PreferenceRecord::new("alice", "math", 9.0, 1),
///     PreferenceRecord::new("alice", "art", 4.0, 2),
///     PreferenceRecord::new("bob", "math", 8.0, 1),
///     PreferenceRecord::new("bob", "art", 6.0, 2),
/// ];
/// let config = RunConfig::default().with_cap_default(1).with_max_courses(1);
/// let engine = AllocationEngine::new(&prefs, &[], &[], config).unwrap();
/// let result = engine.run();
/// assert_eq!(result.pick_log.len(), 2);
/// assert_eq!(result.extended.unfilled_seats_total, 0);
/// ```
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    model: UtilityModel,
    config: RunConfig,
    draft_order: Option<Vec<usize>>,
}

impl AllocationEngine {
    /// Validates `config`, then builds the utility tables.
    pub fn new(
        preferences: &[PreferenceRecord],
        friends: &[FriendPreferenceRecord],
        lambdas: &[LambdaRecord],
        config: RunConfig,
    ) -> AllocResult<Self> {
        config.validate()?;
        let model = UtilityModel::build(preferences, friends, lambdas, &config)?;
        Ok(Self {
            model,
            config,
            draft_order: None,
        })
    }

    /// Replaces the seeded draft order with an explicit one.
    ///
    /// `order` must name every student exactly once.
    pub fn with_draft_order<S: AsRef<str>>(mut self, order: &[S]) -> AllocResult<Self> {
        let mut seen = BTreeSet::new();
        let mut indices = Vec::with_capacity(order.len());
        for id in order {
            let id = id.as_ref();
            let idx = self.model.student_index(id).ok_or_else(|| {
                AllocError::InvalidConfig(format!("draft order names unknown student '{id}'"))
            })?;
            if !seen.insert(idx) {
                return Err(AllocError::InvalidConfig(format!(
                    "draft order lists student '{id}' twice"
                )));
            }
            indices.push(idx);
        }
        if indices.len() != self.model.n_students() {
            return Err(AllocError::InvalidConfig(format!(
                "draft order has {} students, expected {}",
                indices.len(),
                self.model.n_students()
            )));
        }
        self.draft_order = Some(indices);
        Ok(self)
    }

    pub fn model(&self) -> &UtilityModel {
        &self.model
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Executes one full run.
    pub fn run(&self) -> RunResult {
        let model = &self.model;
        let config = &self.config;
        info!(
            students = model.n_students(),
            courses = model.n_courses(),
            seed = config.seed,
            "allocation run started"
        );

        let mut state = AllocationState::new(
            model.n_students(),
            model.n_courses(),
            config.cap_default,
            config.max_courses,
        );
        let mut stream = DrawStream::new(config.seed);

        let mut scheduler = DraftScheduler::new(model, config);
        let outcome = match &self.draft_order {
            Some(order) => scheduler.run_with_order(&mut state, &mut stream, order.clone()),
            None => scheduler.run(&mut state, &mut stream),
        };
        if config.sanity_checks {
            state.audit();
        }

        let post_log =
            PostPhaseOptimizer::new(model, config).run(&mut state, &mut stream, &outcome.order);
        if config.sanity_checks {
            state.audit();
        }

        let welfare = per_student_welfare(model, &state);
        let summary = SummaryMetrics::calculate(&welfare, config);
        let extended = ExtendedMetrics::calculate(model, &state, &welfare);
        info!(
            total_utility = summary.total_utility,
            gini_total_norm = summary.gini_total_norm,
            "allocation run completed"
        );

        let allocation = welfare
            .iter()
            .map(|w| (w.student.clone(), w.courses.clone()))
            .collect();
        RunResult {
            allocation,
            draft_order: outcome
                .order
                .iter()
                .map(|&s| model.student_id(s).to_string())
                .collect(),
            pick_log: outcome.picks,
            post_log,
            welfare,
            summary,
            extended,
        }
    }
}
