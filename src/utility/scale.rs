//! Rank and score scaling.
//!
//! All three mappings land in `[0, 1]` and treat a missing input as 0.

/// Maps a 1-based course rank to `[0, 1]` by min-max scaling.
///
/// Rank 1 maps to 1 and rank `k` maps to 0. With a single course, only
/// rank 1 is worth anything.
pub fn pos_u(position: Option<u32>, k: usize) -> f64 {
    let Some(p) = position else {
        return 0.0;
    };
    if k <= 1 {
        return if p == 1 { 1.0 } else { 0.0 };
    }
    let k = k as f64;
    (k - p as f64) / (k - 1.0)
}

/// Maps a 1-based friend rank to `(0, 1]`.
///
/// Rank 1 maps to 1 and rank `k` maps to `1/k`, so the last ranked friend
/// still counts for something.
pub fn pos_u_friend(position: Option<u32>, k: usize) -> f64 {
    let Some(p) = position else {
        return 0.0;
    };
    if k == 0 {
        return 0.0;
    }
    let k = k as f64;
    (k + 1.0 - p as f64) / k
}

/// Observed range of friend scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    /// Range over the present scores, or `None` if there are none.
    pub fn observe(scores: impl IntoIterator<Item = f64>) -> Option<Self> {
        scores.into_iter().fold(None, |acc, s| match acc {
            None => Some(Self { min: s, max: s }),
            Some(r) => Some(Self {
                min: r.min.min(s),
                max: r.max.max(s),
            }),
        })
    }

    /// Min-max scales a score into `[0, 1]`, clamped.
    ///
    /// A collapsed range maps any present score to 1.
    pub fn normalize(&self, score: Option<f64>) -> f64 {
        let Some(s) = score else {
            return 0.0;
        };
        if self.max <= self.min {
            return 1.0;
        }
        ((s - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}
