//! Inequality and fairness indices.
//!
//! Every index clamps its inputs to `>= 0` and returns 0 for an empty or
//! all-zero distribution.
//!
//! | Index | Definition | Perfect equality |
//! |-------|-----------|------------------|
//! | Gini | `Σ(2i-n-1)·x_i / (n·Σx)`, `x` ascending, `i` 1-based | 0 |
//! | Jain | `(Σx)² / (n·Σx²)` | 1 |
//! | Theil | `(1/n)·Σ_{x>0} (x/μ)·ln(x/μ)` | 0 |
//! | Atkinson(ε) | `1 - (mean of x^(1-ε))^(1/(1-ε)) / μ` | 0 |
//!
//! # Reference
//! Cowell (2011), "Measuring Inequality", Ch. 3

fn clamped(values: &[f64]) -> Vec<f64> {
    values.iter().map(|&v| v.max(0.0)).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Gini coefficient.
pub fn gini(values: &[f64]) -> f64 {
    let mut xs = clamped(values);
    let n = xs.len();
    if n == 0 {
        return 0.0;
    }
    xs.sort_by(f64::total_cmp);
    let total: f64 = xs.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let numerator: f64 = xs
        .iter()
        .enumerate()
        .map(|(i, &x)| (2.0 * (i + 1) as f64 - n as f64 - 1.0) * x)
        .sum();
    numerator / (n as f64 * total)
}

/// Jain's fairness index.
pub fn jain(values: &[f64]) -> f64 {
    let xs = clamped(values);
    let total: f64 = xs.iter().sum();
    let squares: f64 = xs.iter().map(|x| x * x).sum();
    if total <= 0.0 || squares <= 0.0 {
        return 0.0;
    }
    total * total / (xs.len() as f64 * squares)
}

/// Theil T index.
pub fn theil(values: &[f64]) -> f64 {
    let xs = clamped(values);
    let mu = mean(&xs);
    if mu <= 0.0 {
        return 0.0;
    }
    let sum: f64 = xs
        .iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| {
            let ratio = x / mu;
            ratio * ratio.ln()
        })
        .sum();
    sum / xs.len() as f64
}

/// Atkinson index with inequality aversion `epsilon`.
///
/// `epsilon == 1` uses the geometric mean of the positive values.
///
/// # Panics
/// Panics if `epsilon` is negative or not finite.
pub fn atkinson(values: &[f64], epsilon: f64) -> f64 {
    assert!(
        epsilon.is_finite() && epsilon >= 0.0,
        "atkinson epsilon must be finite and >= 0, got {epsilon}"
    );
    let xs = clamped(values);
    let mu = mean(&xs);
    if mu <= 0.0 {
        return 0.0;
    }

    let equivalent = if epsilon == 1.0 {
        let logs: Vec<f64> = xs.iter().filter(|&&x| x > 0.0).map(|x| x.ln()).collect();
        if logs.is_empty() {
            return 0.0;
        }
        mean(&logs).exp()
    } else {
        let power = 1.0 - epsilon;
        let mean_power = mean(&xs.iter().map(|x| x.powf(power)).collect::<Vec<_>>());
        if mean_power <= 0.0 {
            return 0.0;
        }
        mean_power.powf(1.0 / power)
    };
    1.0 - equivalent / mu
}

/// Element of an ascending slice at index `round((n-1)·p)`, ties to even.
///
/// Returns 0 for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let last = sorted.len() - 1;
    let idx = (last as f64 * p).round_ties_even().clamp(0.0, last as f64) as usize;
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_two_point_distribution() {
        assert!((gini(&[0.0, 1.0]) - 0.5).abs() < 1e-9);
        assert!((jain(&[0.0, 1.0]) - 0.5).abs() < 1e-9);
        // Theil of [0, 1]: mean 0.5, one term 2·ln 2, over n = 2.
        assert!((theil(&[0.0, 1.0]) - 2f64.ln()).abs() < 1e-9);
        // Atkinson(0.5) of [0, 1]: (0.5·1)^2 = 0.25, 1 - 0.25/0.5.
        assert!((atkinson(&[0.0, 1.0], 0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        for f in [gini, jain, theil] {
            assert_eq!(f(&[]), 0.0);
            assert_eq!(f(&[0.0, 0.0]), 0.0);
        }
        assert_eq!(atkinson(&[], 0.5), 0.0);
        assert_eq!(atkinson(&[0.0], 1.0), 0.0);
    }

    #[test]
    fn test_negatives_are_clamped() {
        assert!((gini(&[-3.0, 1.0]) - gini(&[0.0, 1.0])).abs() < 1e-12);
        assert!((jain(&[-3.0, 1.0]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_atkinson_log_branch() {
        // Geometric mean of [1, 4] is 2, arithmetic mean 2.5.
        assert!((atkinson(&[1.0, 4.0], 1.0) - 0.2).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "epsilon")]
    fn test_atkinson_rejects_negative_epsilon() {
        atkinson(&[1.0], -0.5);
    }

    #[test]
    fn test_percentile_index_rule() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&xs, 0.10), 1.0);
        assert_eq!(percentile(&xs, 0.25), 2.0);
        assert_eq!(percentile(&xs, 0.50), 3.0);
        assert_eq!(percentile(&xs, 0.90), 5.0);
        // (4-1)·0.5 = 1.5 rounds to 2.
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 0.5), 3.0);
        // (6-1)·0.5 = 2.5 rounds to 2.
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 0.5), 3.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    proptest! {
        #[test]
        fn prop_uniform_is_perfectly_equal(v in 0.001f64..100.0, n in 1usize..20) {
            let xs = vec![v; n];
            prop_assert!(gini(&xs).abs() < 1e-9);
            prop_assert!((jain(&xs) - 1.0).abs() < 1e-9);
            prop_assert!(theil(&xs).abs() < 1e-9);
            prop_assert!(atkinson(&xs, 0.5).abs() < 1e-9);
        }

        #[test]
        fn prop_indices_in_range(xs in proptest::collection::vec(0.0f64..10.0, 1..30)) {
            let g = gini(&xs);
            prop_assert!((0.0..1.0).contains(&g) || g.abs() < 1e-12);
            let j = jain(&xs);
            prop_assert!(j == 0.0 || (j > 0.0 && j <= 1.0 + 1e-12));
            prop_assert!(theil(&xs) >= -1e-12);
            let a = atkinson(&xs, 0.5);
            prop_assert!((-1e-12..=1.0).contains(&a));
        }
    }
}
