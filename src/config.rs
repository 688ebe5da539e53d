//! Run configuration.
//!
//! [`RunConfig`] holds every scalar that shapes a run: seat capacity, the
//! per-student course budget, draft length, post-phase mode and length, the
//! seed and the numeric tolerances.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{AllocError, AllocResult};
use crate::utility::FriendPrefPolicy;

/// Local-search strategy applied after the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ImproveMode {
    /// Best pairwise course swap per iteration.
    #[default]
    Swap,
    /// Snake-ordered passes where each student re-picks their top `b`.
    AddDrop,
    /// Skip the post phase entirely.
    None,
}

impl ImproveMode {
    /// Stable name used in summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImproveMode::Swap => "swap",
            ImproveMode::AddDrop => "add-drop",
            ImproveMode::None => "none",
        }
    }
}

impl fmt::Display for ImproveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImproveMode {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "swap" => Ok(ImproveMode::Swap),
            "add-drop" | "add_drop" => Ok(ImproveMode::AddDrop),
            "none" => Ok(ImproveMode::None),
            other => Err(AllocError::UnknownImproveMode(other.to_string())),
        }
    }
}

/// Configuration for a single allocation run.
///
/// # Examples
///
/// ```
/// use draft_alloc::{ImproveMode, RunConfig};
///
/// let config = RunConfig::default()
///     .with_cap_default(2)
///     .with_max_courses(3)
///     .with_post_iters(10)
///     .with_improve_mode(ImproveMode::AddDrop)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.draft_rounds(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunConfig {
    /// Seats per course. Every course starts with this many.
    pub cap_default: u32,

    /// Maximum courses per student (`b`).
    pub max_courses: usize,

    /// Number of snake-draft rounds. `None` means one round per course slot.
    pub draft_rounds: Option<usize>,

    /// Post-phase iterations (exactly this many are executed and logged).
    pub post_iters: usize,

    /// Post-phase strategy.
    pub improve_mode: ImproveMode,

    /// Seed for the draft order shuffle and the per-candidate tie-break draws.
    pub seed: u64,

    /// Utilities closer than this are treated as tied.
    pub tau: f64,

    /// Friend weight for students without a lambda record.
    pub default_lambda: f64,

    /// How a friend record turns into a preference weight.
    pub friend_policy: FriendPrefPolicy,

    /// How many friend records to keep per (student, course).
    ///
    /// `None` keeps up to the largest friend rank seen in the data. A larger
    /// value is rejected when the model is built.
    pub friend_top_k: Option<usize>,

    /// Audit list/set consistency and seat accounting after every move.
    pub sanity_checks: bool,

    /// Recompute global welfare around every N-th applied swap and compare
    /// it with the incremental delta. `0` disables the check.
    pub delta_check_every: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cap_default: 10,
            max_courses: 3,
            draft_rounds: None,
            post_iters: 0,
            improve_mode: ImproveMode::Swap,
            seed: 42,
            tau: 1e-9,
            default_lambda: 0.3,
            friend_policy: FriendPrefPolicy::default(),
            friend_top_k: None,
            sanity_checks: false,
            delta_check_every: 0,
        }
    }
}

impl RunConfig {
    /// Sets the seats per course.
    pub fn with_cap_default(mut self, cap: u32) -> Self {
        self.cap_default = cap;
        self
    }

    /// Sets the maximum courses per student.
    pub fn with_max_courses(mut self, b: usize) -> Self {
        self.max_courses = b;
        self
    }

    /// Sets the number of draft rounds.
    pub fn with_draft_rounds(mut self, rounds: usize) -> Self {
        self.draft_rounds = Some(rounds);
        self
    }

    /// Sets the number of post-phase iterations.
    pub fn with_post_iters(mut self, n: usize) -> Self {
        self.post_iters = n;
        self
    }

    /// Sets the post-phase strategy.
    pub fn with_improve_mode(mut self, mode: ImproveMode) -> Self {
        self.improve_mode = mode;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the utility tie tolerance.
    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Sets the fallback lambda.
    pub fn with_default_lambda(mut self, lambda: f64) -> Self {
        self.default_lambda = lambda;
        self
    }

    /// Sets the friend preference policy.
    pub fn with_friend_policy(mut self, policy: FriendPrefPolicy) -> Self {
        self.friend_policy = policy;
        self
    }

    /// Limits the friend records kept per (student, course).
    pub fn with_friend_top_k(mut self, k: usize) -> Self {
        self.friend_top_k = Some(k);
        self
    }

    /// Enables or disables the invariant audits.
    pub fn with_sanity_checks(mut self, enabled: bool) -> Self {
        self.sanity_checks = enabled;
        self
    }

    /// Sets the swap delta verification period (0 to disable).
    pub fn with_delta_check_every(mut self, n: usize) -> Self {
        self.delta_check_every = n;
        self
    }

    /// Effective number of draft rounds.
    pub fn draft_rounds(&self) -> usize {
        self.draft_rounds.unwrap_or(self.max_courses)
    }

    /// Validates the configuration.
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> AllocResult<()> {
        if self.cap_default == 0 {
            return Err(AllocError::InvalidConfig("cap_default must be > 0".into()));
        }
        if self.max_courses == 0 {
            return Err(AllocError::InvalidConfig("max_courses (b) must be > 0".into()));
        }
        let rounds = self.draft_rounds();
        if rounds == 0 {
            return Err(AllocError::InvalidConfig("draft_rounds must be > 0".into()));
        }
        if rounds > self.max_courses {
            return Err(AllocError::InvalidConfig(format!(
                "draft_rounds ({rounds}) must be <= max_courses ({})",
                self.max_courses
            )));
        }
        if !self.tau.is_finite() || self.tau < 0.0 {
            return Err(AllocError::InvalidConfig(
                "tau must be finite and non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_lambda) {
            return Err(AllocError::LambdaOutOfRange {
                student: "<default>".into(),
                value: self.default_lambda,
            });
        }
        if self.friend_top_k == Some(0) {
            return Err(AllocError::InvalidConfig(
                "friend_top_k must be positive or None".into(),
            ));
        }
        self.friend_policy.validate()?;
        Ok(())
    }
}
