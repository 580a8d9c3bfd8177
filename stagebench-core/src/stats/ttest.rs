use statrs::distribution::{ContinuousCDF, StudentsT};

use super::{OneSidedTestResult, StatisticalTest};

/// Welch's t-test for comparing two independent samples with potentially unequal variances.
///
/// This is the parametric half of the equivalence comparison; it does not
/// assume equal variances between the baseline and candidate measurements.
#[derive(Debug, Clone, Copy, Default)]
pub struct WelchTTest;

impl WelchTTest {
    /// Calculate the sample mean.
    pub(crate) fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Calculate the sample variance.
    /// Uses Bessel's correction (n-1 denominator) for unbiased estimation.
    pub(crate) fn variance(samples: &[f64], mean: f64) -> f64 {
        if samples.len() < 2 {
            return 0.0;
        }
        let sum_sq_diff: f64 = samples
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum();
        sum_sq_diff / (samples.len() - 1) as f64
    }

    /// Calculate degrees of freedom using the Welch-Satterthwaite equation.
    ///
    /// df = (var1/n1 + var2/n2)^2 / ((var1/n1)^2/(n1-1) + (var2/n2)^2/(n2-1))
    fn welch_satterthwaite_df(var1: f64, n1: usize, var2: f64, n2: usize) -> f64 {
        let s1 = var1 / n1 as f64;
        let s2 = var2 / n2 as f64;
        let numerator = (s1 + s2).powi(2);
        let denominator = (s1.powi(2) / (n1 - 1) as f64) + (s2.powi(2) / (n2 - 1) as f64);

        if denominator == 0.0 {
            // Fallback to minimum df when variances are zero
            return (n1.min(n2) - 1) as f64;
        }

        numerator / denominator
    }
}

/// Upper-tail probability `P(T > t)` for a Student distribution with `df` degrees of freedom.
fn upper_tail(t: f64, df: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 1.0 - dist.cdf(t),
        // Conservative fallback if distribution creation fails
        Err(_) => 1.0,
    }
}

impl StatisticalTest for WelchTTest {
    fn name(&self) -> &'static str {
        "Welch"
    }

    fn is_greater(&self, x: &[f64], y: &[f64], threshold: f64, alpha: f64) -> OneSidedTestResult {
        let n1 = x.len();
        let n2 = y.len();

        // Handle edge cases with insufficient data
        if n1 < 2 || n2 < 2 {
            return OneSidedTestResult::not_rejected(0.0);
        }

        let mean1 = Self::mean(x);
        let mean2 = Self::mean(y);
        let var1 = Self::variance(x, mean1);
        let var2 = Self::variance(y, mean2);

        let difference = mean1 - mean2 - threshold;
        let se = (var1 / n1 as f64 + var2 / n2 as f64).sqrt();

        // Both samples are constant: the sign of the difference decides.
        if se == 0.0 {
            let (statistic, p_value) = if difference > 0.0 {
                (f64::INFINITY, 0.0)
            } else {
                (f64::NEG_INFINITY, 1.0)
            };
            return OneSidedTestResult::new(statistic, p_value, alpha);
        }

        let t_statistic = difference / se;
        let df = Self::welch_satterthwaite_df(var1, n1, var2, n2);
        OneSidedTestResult::new(t_statistic, upper_tail(t_statistic, df), alpha)
    }
}

/// One-sample Student t-test against a constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentTest;

impl StudentTest {
    /// Test `H1: mean(x) > value`.
    pub fn is_greater_than(&self, x: &[f64], value: f64, alpha: f64) -> OneSidedTestResult {
        let n = x.len();
        if n < 2 {
            return OneSidedTestResult::not_rejected(0.0);
        }

        let mean = WelchTTest::mean(x);
        let sd = WelchTTest::variance(x, mean).sqrt();
        let difference = mean - value;

        if sd == 0.0 {
            let (statistic, p_value) = if difference > 0.0 {
                (f64::INFINITY, 0.0)
            } else {
                (f64::NEG_INFINITY, 1.0)
            };
            return OneSidedTestResult::new(statistic, p_value, alpha);
        }

        let t_statistic = difference / (sd / (n as f64).sqrt());
        OneSidedTestResult::new(t_statistic, upper_tail(t_statistic, (n - 1) as f64), alpha)
    }
}
