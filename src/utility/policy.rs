//! Friend preference weighting policy.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::scale::{pos_u_friend, ScoreRange};
use crate::error::{AllocError, AllocResult};

/// Turns one friend record into a preference weight `Pref(s, f, c)`.
///
/// Every variant falls back to the friend rank when the record carries no
/// score. The variants differ in how a present score is used:
///
/// | Policy | Score present | Score missing |
/// |--------|---------------|---------------|
/// | `PositionOnly` | `posU_friend(p)` | `posU_friend(p)` |
/// | `ScoreOnly` | `scoreU(s)` | `posU_friend(p)` |
/// | `ScoreWithPositionTiebreak` | `(scoreU(s) + ε·posU_friend(p)) / (1 + ε)` | `posU_friend(p)` |
///
/// `ScoreOnly` is the default. The tiebreak variant keeps equal scores
/// ordered by rank while staying inside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FriendPrefPolicy {
    /// Ignore scores, weight by friend rank only.
    PositionOnly,
    /// Weight by normalized score; rank only when the score is missing.
    #[default]
    ScoreOnly,
    /// Normalized score blended with a small rank term.
    ScoreWithPositionTiebreak {
        /// Weight of the rank term relative to the score term.
        epsilon: f64,
    },
}

impl FriendPrefPolicy {
    /// Weight of a single friend record.
    ///
    /// `scores` is the observed score range, `None` when no retained record
    /// carries a score.
    pub fn weight(
        &self,
        position: Option<u32>,
        score: Option<f64>,
        k_friend: usize,
        scores: Option<ScoreRange>,
    ) -> f64 {
        let rank_term = pos_u_friend(position, k_friend);
        let (Some(range), Some(_)) = (scores, score) else {
            return rank_term;
        };
        match *self {
            FriendPrefPolicy::PositionOnly => rank_term,
            FriendPrefPolicy::ScoreOnly => range.normalize(score),
            FriendPrefPolicy::ScoreWithPositionTiebreak { epsilon } => {
                (range.normalize(score) + epsilon * rank_term) / (1.0 + epsilon)
            }
        }
    }

    /// Largest weight this policy can give the friend ranked `rank`.
    pub fn max_weight(&self, rank: u32, k_friend: usize, has_scores: bool) -> f64 {
        let rank_term = pos_u_friend(Some(rank), k_friend);
        if !has_scores {
            return rank_term;
        }
        match *self {
            FriendPrefPolicy::PositionOnly => rank_term,
            FriendPrefPolicy::ScoreOnly => 1.0,
            FriendPrefPolicy::ScoreWithPositionTiebreak { epsilon } => {
                (1.0 + epsilon * rank_term) / (1.0 + epsilon)
            }
        }
    }

    /// Theoretical maximum friend bonus for one (student, course):
    /// every rank `1..=k_friend` filled by a maximally weighted friend.
    pub fn max_bonus(&self, k_friend: usize, has_scores: bool) -> f64 {
        (1..=k_friend as u32)
            .map(|rank| self.max_weight(rank, k_friend, has_scores))
            .sum()
    }

    pub(crate) fn validate(&self) -> AllocResult<()> {
        if let FriendPrefPolicy::ScoreWithPositionTiebreak { epsilon } = *self {
            if !epsilon.is_finite() || epsilon < 0.0 {
                return Err(AllocError::InvalidConfig(
                    "friend policy epsilon must be finite and non-negative".into(),
                ));
            }
        }
        Ok(())
    }
}
