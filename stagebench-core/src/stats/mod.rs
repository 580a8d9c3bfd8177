//! Descriptive statistics over timing samples and the hypothesis tests built on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

mod equivalence;
mod mann_whitney;
mod multimodality;
mod ttest;
mod zero;

pub use equivalence::{
    compare_samples, ComparisonVerdict, EquivalenceResult, EquivalenceTest, SampleComparison,
    Threshold, Verdict,
};
pub use mann_whitney::MannWhitneyTest;
pub use multimodality::{m_value, Modality};
pub use ttest::{StudentTest, WelchTTest};
pub use zero::{
    check_zero_measurement_one_sample, check_zero_measurement_two_samples,
    zero_measurement_threshold,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatisticsError {
    /// An empty sample means the stage pipeline produced nothing to describe.
    #[error("Sequence of values contains no elements, statistics can't be calculated")]
    EmptySample,

    #[error("Confidence level must be between 0 and 1 (exclusive), got {0}")]
    InvalidConfidenceLevel(f64),

    #[error("Unknown outlier mode: {0}")]
    UnknownOutlierMode(String),
}

/// Result of a one-sided test of `H1: x > y + threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OneSidedTestResult {
    /// Test statistic (t for Welch/Student, U for Mann-Whitney).
    pub statistic: f64,
    /// Probability of a statistic at least this extreme under the null hypothesis.
    pub p_value: f64,
    /// Whether the null hypothesis was rejected at the requested significance level.
    pub null_hypothesis_rejected: bool,
}

impl OneSidedTestResult {
    pub fn new(statistic: f64, p_value: f64, alpha: f64) -> Self {
        Self {
            statistic,
            p_value,
            null_hypothesis_rejected: p_value < alpha,
        }
    }

    /// Result used when there is not enough data to test anything.
    pub fn not_rejected(statistic: f64) -> Self {
        Self {
            statistic,
            p_value: 1.0,
            null_hypothesis_rejected: false,
        }
    }
}

/// Trait for two-sample tests usable inside the equivalence framework.
pub trait StatisticalTest: Send + Sync {
    /// Short display name of the test.
    fn name(&self) -> &'static str;

    /// Test `H1: x > y + threshold` against `H0: x <= y + threshold`.
    fn is_greater(&self, x: &[f64], y: &[f64], threshold: f64, alpha: f64) -> OneSidedTestResult;
}

/// Confidence level of an interval, strictly between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    pub const L90: ConfidenceLevel = ConfidenceLevel(0.90);
    pub const L95: ConfidenceLevel = ConfidenceLevel(0.95);
    pub const L99: ConfidenceLevel = ConfidenceLevel(0.99);
    pub const L999: ConfidenceLevel = ConfidenceLevel(0.999);

    pub fn new(level: f64) -> Result<Self, StatisticsError> {
        if level > 0.0 && level < 1.0 {
            Ok(Self(level))
        } else {
            Err(StatisticsError::InvalidConfidenceLevel(level))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Two-sided Student quantile for a sample of `n` values; NaN when `n < 2`.
    pub fn z_value(&self, n: usize) -> f64 {
        if n < 2 {
            return f64::NAN;
        }
        match StudentsT::new(0.0, 1.0, (n - 1) as f64) {
            Ok(dist) => dist.inverse_cdf(1.0 - (1.0 - self.0) / 2.0),
            Err(_) => f64::NAN,
        }
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        ConfidenceLevel::L999
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = StatisticsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        ConfidenceLevel::new(value)
    }
}

impl From<ConfidenceLevel> for f64 {
    fn from(level: ConfidenceLevel) -> Self {
        level.0
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0 * 100.0)
    }
}

/// `mean ± z * standard_error` at a given confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub n: usize,
    pub mean: f64,
    pub standard_error: f64,
    pub level: ConfidenceLevel,
    /// Half-width of the interval; NaN when fewer than two values are available.
    pub margin: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn new(mean: f64, standard_error: f64, n: usize, level: ConfidenceLevel) -> Self {
        let margin = standard_error * level.z_value(n);
        Self {
            n,
            mean,
            standard_error,
            level,
            margin,
            lower: mean - margin,
            upper: mean + margin,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower - 1e-9 < value && value < self.upper + 1e-9
    }

    /// Whether the margin is known (the sample had at least two values).
    pub fn is_defined(&self) -> bool {
        self.margin.is_finite()
    }
}

/// Policy deciding which Tukey-fence outliers are excluded from the final statistic.
///
/// Detection always happens; only removal is affected by the mode. The
/// aliases `none`, `only_lower`, `only_upper` and `all` are accepted
/// wherever a mode is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMode {
    #[serde(alias = "none")]
    DontRemove,
    #[serde(alias = "only_lower")]
    RemoveLower,
    #[default]
    #[serde(alias = "only_upper")]
    RemoveUpper,
    #[serde(alias = "all")]
    RemoveAll,
}

impl OutlierMode {
    /// Whether `value` is excluded under this mode given the fences of `stats`.
    pub fn removes(&self, stats: &Statistics, value: f64) -> bool {
        match self {
            OutlierMode::DontRemove => false,
            OutlierMode::RemoveLower => value < stats.lower_fence,
            OutlierMode::RemoveUpper => value > stats.upper_fence,
            OutlierMode::RemoveAll => stats.is_outlier(value),
        }
    }
}

impl FromStr for OutlierMode {
    type Err = StatisticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "dontremove" | "none" => Ok(OutlierMode::DontRemove),
            "removelower" | "onlylower" => Ok(OutlierMode::RemoveLower),
            "removeupper" | "onlyupper" => Ok(OutlierMode::RemoveUpper),
            "removeall" | "all" => Ok(OutlierMode::RemoveAll),
            _ => Err(StatisticsError::UnknownOutlierMode(s.to_string())),
        }
    }
}

impl fmt::Display for OutlierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OutlierMode::DontRemove => "dont_remove",
            OutlierMode::RemoveLower => "remove_lower",
            OutlierMode::RemoveUpper => "remove_upper",
            OutlierMode::RemoveAll => "remove_all",
        };
        f.write_str(text)
    }
}

/// Interpolated percentiles of a sorted sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles {
    pub p0: f64,
    pub p25: f64,
    pub p50: f64,
    pub p67: f64,
    pub p80: f64,
    pub p85: f64,
    pub p90: f64,
    pub p95: f64,
    pub p100: f64,
}

impl Percentiles {
    fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p0: percentile(sorted, 0.0),
            p25: percentile(sorted, 0.25),
            p50: percentile(sorted, 0.50),
            p67: percentile(sorted, 0.67),
            p80: percentile(sorted, 0.80),
            p85: percentile(sorted, 0.85),
            p90: percentile(sorted, 0.90),
            p95: percentile(sorted, 0.95),
            p100: percentile(sorted, 1.0),
        }
    }
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Descriptive statistics snapshot of a non-empty sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    #[serde(skip)]
    sorted: Vec<f64>,
    pub n: usize,
    pub min: f64,
    pub lower_fence: f64,
    pub q1: f64,
    pub median: f64,
    pub mean: f64,
    pub q3: f64,
    pub upper_fence: f64,
    pub max: f64,
    pub interquartile_range: f64,
    pub outliers: Vec<f64>,
    pub variance: f64,
    pub standard_deviation: f64,
    pub standard_error: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub confidence_interval: ConfidenceInterval,
    pub percentiles: Percentiles,
}

impl Statistics {
    /// Compute statistics at the default 99.9% confidence level.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::EmptySample`] when `values` is empty.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Result<Self, StatisticsError> {
        Self::with_confidence_level(values, ConfidenceLevel::default())
    }

    pub fn with_confidence_level(
        values: impl IntoIterator<Item = f64>,
        level: ConfidenceLevel,
    ) -> Result<Self, StatisticsError> {
        let mut sorted: Vec<f64> = values.into_iter().collect();
        let n = sorted.len();
        if n == 0 {
            return Err(StatisticsError::EmptySample);
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let (q1, median, q3) = if n == 1 {
            (sorted[0], sorted[0], sorted[0])
        } else {
            // Both halves exclude the middle element when n is odd.
            (
                median_of_sorted(&sorted[..n / 2]),
                median_of_sorted(&sorted),
                median_of_sorted(&sorted[(n + 1) / 2..]),
            )
        };

        let min = sorted[0];
        let max = sorted[n - 1];
        let mean = sorted.iter().sum::<f64>() / n as f64;

        let interquartile_range = q3 - q1;
        let lower_fence = q1 - 1.5 * interquartile_range;
        let upper_fence = q3 + 1.5 * interquartile_range;
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < lower_fence || v > upper_fence)
            .collect();

        let variance = if n == 1 {
            0.0
        } else {
            sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        };
        let standard_deviation = variance.sqrt();
        let standard_error = standard_deviation / (n as f64).sqrt();

        let central_moment = |k: i32| sorted.iter().map(|v| (v - mean).powi(k)).sum::<f64>() / n as f64;
        let (skewness, kurtosis) = if standard_deviation > 0.0 {
            (
                central_moment(3) / standard_deviation.powi(3),
                central_moment(4) / standard_deviation.powi(4),
            )
        } else {
            (0.0, 0.0)
        };

        let confidence_interval = ConfidenceInterval::new(mean, standard_error, n, level);
        let percentiles = Percentiles::from_sorted(&sorted);

        Ok(Self {
            sorted,
            n,
            min,
            lower_fence,
            q1,
            median,
            mean,
            q3,
            upper_fence,
            max,
            interquartile_range,
            outliers,
            variance,
            standard_deviation,
            standard_error,
            skewness,
            kurtosis,
            confidence_interval,
            percentiles,
        })
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower_fence || value > self.upper_fence
    }

    /// Sorted sample with every Tukey-fence outlier removed.
    pub fn without_outliers(&self) -> Vec<f64> {
        self.sorted
            .iter()
            .copied()
            .filter(|&v| !self.is_outlier(v))
            .collect()
    }

    /// Confidence interval of the mean at another confidence level.
    pub fn confidence_interval_at(&self, level: ConfidenceLevel) -> ConfidenceInterval {
        ConfidenceInterval::new(self.mean, self.standard_error, self.n, level)
    }

    /// The sample in ascending order.
    pub fn values(&self) -> &[f64] {
        &self.sorted
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.n {
            1 => write!(f, "{} (N = 1)", self.sorted[0]),
            2 => write!(f, "{},{} (N = 2)", self.sorted[0], self.sorted[1]),
            n => write!(
                f,
                "{} +- {} (N = {})",
                self.mean, self.confidence_interval.margin, n
            ),
        }
    }
}
