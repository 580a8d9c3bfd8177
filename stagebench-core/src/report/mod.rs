use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::measurement::{IterationMode, IterationStage, Measurement};
use crate::results::RunResults;
use crate::stats::{
    compare_samples, ConfidenceLevel, OutlierMode, SampleComparison, Statistics, StatisticsError,
    Threshold,
};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("benchmark '{0}' has no actual workload measurements")]
    EmptyActualStage(String),

    #[error("statistics error: {0}")]
    Statistics(#[from] StatisticsError),
}

/// Per-benchmark summary over every launch of that benchmark.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub name: String,
    pub runs: Vec<RunResults>,
    /// Statistics over the per-op values of every launch's Result stage.
    pub statistics: Statistics,
}

impl BenchmarkReport {
    pub fn new(name: impl Into<String>, runs: Vec<RunResults>) -> Result<Self, ReportError> {
        Self::with_confidence_level(name, runs, ConfidenceLevel::default())
    }

    pub fn with_confidence_level(
        name: impl Into<String>,
        runs: Vec<RunResults>,
        level: ConfidenceLevel,
    ) -> Result<Self, ReportError> {
        let name = name.into();
        let values: Vec<f64> = runs
            .iter()
            .flat_map(|run| run.results().iter().map(Measurement::nanoseconds_per_op))
            .collect();
        if values.is_empty() {
            return Err(ReportError::EmptyActualStage(name));
        }
        let statistics = Statistics::with_confidence_level(values, level)?;
        Ok(Self {
            name,
            runs,
            statistics,
        })
    }

    /// Split a flat measurement stream into launches and fold them.
    pub fn from_measurements(
        name: impl Into<String>,
        measurements: Vec<Measurement>,
        outlier_mode: OutlierMode,
        level: ConfidenceLevel,
    ) -> Result<Self, ReportError> {
        let mut launches: BTreeMap<u32, Vec<Measurement>> = BTreeMap::new();
        for measurement in measurements {
            launches
                .entry(measurement.launch_index())
                .or_default()
                .push(measurement);
        }
        let runs = launches
            .into_iter()
            .map(|(launch, measurements)| RunResults::new(launch, measurements, outlier_mode, false))
            .collect();
        Self::with_confidence_level(name, runs, level)
    }

    /// Per-op values of every Result-stage measurement.
    pub fn result_values(&self) -> Vec<f64> {
        self.runs
            .iter()
            .flat_map(|run| run.results().iter().map(Measurement::nanoseconds_per_op))
            .collect()
    }

    /// Per-op values of the given raw stage across all launches.
    pub fn values_of(&self, mode: IterationMode, stage: IterationStage) -> Vec<f64> {
        self.runs
            .iter()
            .flat_map(|run| run.measurements_of(mode, stage).map(Measurement::nanoseconds_per_op))
            .collect()
    }

    pub fn detected_outlier_count(&self) -> usize {
        self.runs.iter().map(|run| run.detected_outliers().len()).sum()
    }

    pub fn removed_outlier_count(&self) -> usize {
        self.runs.iter().map(|run| run.removed_outliers().len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleStats {
    pub mean_ns: f64,
    pub std_dev_ns: f64,
    /// Half-width of the confidence interval of the mean.
    pub error_ns: f64,
    pub median_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
    pub sample_count: usize,
    /// Outliers detected before the outlier policy was applied.
    pub outlier_count: usize,
    pub removed_outlier_count: usize,
}

impl From<&BenchmarkReport> for SampleStats {
    fn from(report: &BenchmarkReport) -> Self {
        let stats = &report.statistics;
        Self {
            mean_ns: stats.mean,
            std_dev_ns: stats.standard_deviation,
            error_ns: stats.confidence_interval.margin,
            median_ns: stats.median,
            min_ns: stats.min,
            max_ns: stats.max,
            sample_count: stats.n,
            outlier_count: report.detected_outlier_count(),
            removed_outlier_count: report.removed_outlier_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkComparison {
    pub name: String,
    pub baseline_stats: SampleStats,
    pub candidate_stats: SampleStats,
    pub comparison: SampleComparison,
}

impl BenchmarkComparison {
    pub fn new(
        baseline: &BenchmarkReport,
        candidate: &BenchmarkReport,
        threshold: Threshold,
        alpha: f64,
    ) -> Self {
        let comparison = compare_samples(
            &baseline.result_values(),
            &candidate.result_values(),
            threshold,
            alpha,
        );
        Self {
            name: baseline.name.clone(),
            baseline_stats: SampleStats::from(baseline),
            candidate_stats: SampleStats::from(candidate),
            comparison,
        }
    }

    /// Candidate mean over baseline mean.
    pub fn ratio(&self) -> f64 {
        if self.baseline_stats.mean_ns == 0.0 {
            f64::NAN
        } else {
            self.candidate_stats.mean_ns / self.baseline_stats.mean_ns
        }
    }
}

pub trait Reporter: Send + Sync {
    fn report_summaries(
        &self,
        reports: &[BenchmarkReport],
        conclusions: &[crate::analysis::Conclusion],
    ) -> Result<(), ReportError>;

    fn report_comparisons(&self, results: &[BenchmarkComparison]) -> Result<(), ReportError>;
}

mod terminal;
pub use terminal::TerminalReporter;
