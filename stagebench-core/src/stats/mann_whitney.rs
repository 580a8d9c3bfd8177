use statrs::distribution::{ContinuousCDF, Normal};

use super::{OneSidedTestResult, StatisticalTest};

/// Samples up to this size per side without ties use the exact U distribution.
const EXACT_MAX_SIZE: usize = 20;

/// Mann-Whitney U test: a rank-based, distribution-free two-sample test.
#[derive(Debug, Clone, Copy, Default)]
pub struct MannWhitneyTest;

impl MannWhitneyTest {
    /// U statistic for `x` against `y`: pairs where x wins, ties counted as halves.
    /// Also reports whether any tie was seen.
    fn u_statistic(x: &[f64], y: &[f64]) -> (f64, bool) {
        let mut u = 0.0;
        let mut has_ties = false;
        for &a in x {
            for &b in y {
                if a > b {
                    u += 1.0;
                } else if a == b {
                    u += 0.5;
                    has_ties = true;
                }
            }
        }
        (u, has_ties)
    }

    /// `P(U >= u)` under the null hypothesis, counting rank arrangements exactly.
    fn exact_upper_tail(n: usize, m: usize, u: f64) -> f64 {
        // freq[i][j][k]: arrangements of i x-values and j y-values with U == k.
        let mut freq: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); m + 1]; n + 1];
        for i in 0..=n {
            for j in 0..=m {
                if i == 0 || j == 0 {
                    freq[i][j] = vec![1.0];
                    continue;
                }
                let mut row = vec![0.0; i * j + 1];
                for (k, slot) in row.iter_mut().enumerate() {
                    // The largest value belongs to x (beats all j y-values) or to y.
                    if k >= j {
                        if let Some(v) = freq[i - 1][j].get(k - j) {
                            *slot += v;
                        }
                    }
                    if let Some(v) = freq[i][j - 1].get(k) {
                        *slot += v;
                    }
                }
                freq[i][j] = row;
            }
        }

        let dist = &freq[n][m];
        let total: f64 = dist.iter().sum();
        let start = u.ceil() as usize;
        let tail: f64 = dist.iter().skip(start).sum();
        tail / total
    }

    /// Normal approximation with tie and continuity corrections.
    fn approximate_upper_tail(x: &[f64], y: &[f64], u: f64) -> f64 {
        let n = x.len() as f64;
        let m = y.len() as f64;
        let total = n + m;

        let mut combined: Vec<f64> = x.iter().chain(y.iter()).copied().collect();
        combined.sort_by(|a, b| a.total_cmp(b));
        let mut tie_term = 0.0;
        let mut i = 0;
        while i < combined.len() {
            let mut j = i + 1;
            while j < combined.len() && combined[j] == combined[i] {
                j += 1;
            }
            let t = (j - i) as f64;
            tie_term += t * t * t - t;
            i = j;
        }

        let mean = n * m / 2.0;
        let variance = n * m / 12.0 * ((total + 1.0) - tie_term / (total * (total - 1.0)));
        if variance <= 0.0 {
            return if u > mean { 0.0 } else { 1.0 };
        }

        let z = (u - mean - 0.5) / variance.sqrt();
        match Normal::new(0.0, 1.0) {
            Ok(normal) => 1.0 - normal.cdf(z),
            Err(_) => 1.0,
        }
    }
}

impl StatisticalTest for MannWhitneyTest {
    fn name(&self) -> &'static str {
        "Mann-Whitney"
    }

    fn is_greater(&self, x: &[f64], y: &[f64], threshold: f64, alpha: f64) -> OneSidedTestResult {
        if x.is_empty() || y.is_empty() {
            return OneSidedTestResult::not_rejected(0.0);
        }

        let shifted: Vec<f64> = y.iter().map(|v| v + threshold).collect();
        let (u, has_ties) = Self::u_statistic(x, &shifted);

        let p_value = if !has_ties && x.len() <= EXACT_MAX_SIZE && y.len() <= EXACT_MAX_SIZE {
            Self::exact_upper_tail(x.len(), y.len(), u)
        } else {
            Self::approximate_upper_tail(x, &shifted, u)
        };

        OneSidedTestResult::new(u, p_value, alpha)
    }
}
