//! Two-one-sided-test (TOST) equivalence framing over any [`StatisticalTest`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::mann_whitney::MannWhitneyTest;
use super::ttest::WelchTTest;
use super::{OneSidedTestResult, StatisticalTest};

/// Largest difference still considered "the same".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Threshold {
    /// Fraction of the baseline mean (0.02 means 2%).
    Relative(f64),
    /// Absolute difference in nanoseconds.
    Absolute(f64),
}

impl Threshold {
    /// Threshold in the sample's unit, given the baseline sample.
    pub fn to_absolute(&self, baseline: &[f64]) -> f64 {
        match *self {
            Threshold::Relative(ratio) => ratio * WelchTTest::mean(baseline).abs(),
            Threshold::Absolute(value) => value,
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Relative(0.02)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Relative(ratio) => write!(f, "{}%", ratio * 100.0),
            Threshold::Absolute(ns) => write!(f, "{} ns", ns),
        }
    }
}

/// Outcome of a single test under the equivalence framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// Difference proven to lie within `(-threshold, threshold)`.
    Same,
    /// Candidate proven faster than baseline by more than the threshold.
    Faster,
    /// Candidate proven slower than baseline by more than the threshold.
    Slower,
    /// Neither equivalence nor a difference could be shown.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquivalenceResult {
    pub test: &'static str,
    pub verdict: Verdict,
    /// `H1: candidate > baseline + threshold`.
    pub slower: OneSidedTestResult,
    /// `H1: baseline > candidate + threshold`.
    pub faster: OneSidedTestResult,
    /// `H1: candidate > baseline - threshold` (lower TOST bound).
    pub above_lower: OneSidedTestResult,
    /// `H1: baseline > candidate - threshold` (upper TOST bound).
    pub below_upper: OneSidedTestResult,
}

/// Equivalence test wrapping a one-sided statistical test.
#[derive(Debug, Clone)]
pub struct EquivalenceTest<T: StatisticalTest> {
    pub test: T,
    /// Significance level of each one-sided test.
    pub alpha: f64,
}

impl<T: StatisticalTest> EquivalenceTest<T> {
    pub fn new(test: T, alpha: f64) -> Self {
        Self { test, alpha }
    }

    /// Classify `candidate` against `baseline` with an absolute threshold.
    pub fn check(&self, baseline: &[f64], candidate: &[f64], threshold: f64) -> EquivalenceResult {
        let slower = self.test.is_greater(candidate, baseline, threshold, self.alpha);
        let faster = self.test.is_greater(baseline, candidate, threshold, self.alpha);
        let above_lower = self.test.is_greater(candidate, baseline, -threshold, self.alpha);
        let below_upper = self.test.is_greater(baseline, candidate, -threshold, self.alpha);

        let verdict = if slower.null_hypothesis_rejected {
            Verdict::Slower
        } else if faster.null_hypothesis_rejected {
            Verdict::Faster
        } else if above_lower.null_hypothesis_rejected && below_upper.null_hypothesis_rejected {
            Verdict::Same
        } else {
            Verdict::Unknown
        };

        EquivalenceResult {
            test: self.test.name(),
            verdict,
            slower,
            faster,
            above_lower,
            below_upper,
        }
    }
}

/// Combined verdict of the parametric and rank-based tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonVerdict {
    Same,
    Faster,
    Slower,
    /// The tests disagree or neither reached a conclusion.
    Inconclusive,
}

impl ComparisonVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonVerdict::Same => "same",
            ComparisonVerdict::Faster => "faster",
            ComparisonVerdict::Slower => "slower",
            ComparisonVerdict::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for ComparisonVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleComparison {
    pub threshold: Threshold,
    /// Threshold resolved against the baseline, in the sample's unit.
    pub threshold_value: f64,
    pub welch: EquivalenceResult,
    pub mann_whitney: EquivalenceResult,
    pub verdict: ComparisonVerdict,
}

/// Compare two independent samples with Welch and Mann-Whitney under TOST.
///
/// `Same` needs equivalence under both tests and a direction needs both
/// tests to agree; anything else is `Inconclusive`.
pub fn compare_samples(
    baseline: &[f64],
    candidate: &[f64],
    threshold: Threshold,
    alpha: f64,
) -> SampleComparison {
    let threshold_value = threshold.to_absolute(baseline);
    let welch = EquivalenceTest::new(WelchTTest, alpha).check(baseline, candidate, threshold_value);
    let mann_whitney =
        EquivalenceTest::new(MannWhitneyTest, alpha).check(baseline, candidate, threshold_value);

    let verdict = match (welch.verdict, mann_whitney.verdict) {
        (Verdict::Same, Verdict::Same) => ComparisonVerdict::Same,
        (Verdict::Faster, Verdict::Faster) => ComparisonVerdict::Faster,
        (Verdict::Slower, Verdict::Slower) => ComparisonVerdict::Slower,
        _ => ComparisonVerdict::Inconclusive,
    };

    SampleComparison {
        threshold,
        threshold_value,
        welch,
        mann_whitney,
        verdict,
    }
}
