//! Result-stage post-processing of one engine run.

use serde::Serialize;

use crate::measurement::{IterationMode, IterationStage, Measurement};
use crate::stats::{ConfidenceLevel, OutlierMode, Statistics, StatisticsError};

/// Everything one engine run (one launch) produced, plus its Result stage.
///
/// The Result stage is the Actual workload stage with the per-operation
/// overhead subtracted (clamped at zero) and outliers removed according to
/// the configured [`OutlierMode`].
#[derive(Debug, Clone, Serialize)]
pub struct RunResults {
    launch_index: u32,
    measurements: Vec<Measurement>,
    results: Vec<Measurement>,
    overhead_per_op: Option<f64>,
    outlier_mode: OutlierMode,
    detected_outliers: Vec<f64>,
    removed_outliers: Vec<f64>,
    cancelled: bool,
}

impl RunResults {
    pub fn new(
        launch_index: u32,
        measurements: Vec<Measurement>,
        outlier_mode: OutlierMode,
        cancelled: bool,
    ) -> Self {
        let overhead: Vec<f64> = measurements
            .iter()
            .filter(|m| m.is(IterationMode::Overhead, IterationStage::Actual))
            .map(Measurement::nanoseconds_per_op)
            .collect();
        let overhead_per_op = if overhead.is_empty() {
            None
        } else {
            Some(overhead.iter().sum::<f64>() / overhead.len() as f64)
        };

        let corrected: Vec<Measurement> = measurements
            .iter()
            .filter(|m| m.is(IterationMode::Workload, IterationStage::Actual))
            .map(|m| {
                let overhead = overhead_per_op.unwrap_or(0.0) * m.operations() as f64;
                let ns = (m.nanoseconds() - overhead).max(0.0);
                m.with_stage_and_nanoseconds(IterationStage::Result, ns)
            })
            .collect();

        let (results, detected_outliers, removed_outliers) =
            match Statistics::new(corrected.iter().map(Measurement::nanoseconds_per_op)) {
                Ok(stats) => {
                    let (removed, kept): (Vec<Measurement>, Vec<Measurement>) = corrected
                        .into_iter()
                        .partition(|m| outlier_mode.removes(&stats, m.nanoseconds_per_op()));
                    let removed = removed.iter().map(Measurement::nanoseconds_per_op).collect();
                    (kept, stats.outliers, removed)
                }
                Err(_) => (Vec::new(), Vec::new(), Vec::new()),
            };

        Self {
            launch_index,
            measurements,
            results,
            overhead_per_op,
            outlier_mode,
            detected_outliers,
            removed_outliers,
            cancelled,
        }
    }

    pub fn launch_index(&self) -> u32 {
        self.launch_index
    }

    /// Every raw measurement of the run in the order it was taken.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn measurements_of(
        &self,
        mode: IterationMode,
        stage: IterationStage,
    ) -> impl Iterator<Item = &Measurement> + '_ {
        self.measurements.iter().filter(move |m| m.is(mode, stage))
    }

    /// Result-stage measurements after overhead subtraction and outlier removal.
    pub fn results(&self) -> &[Measurement] {
        &self.results
    }

    /// Mean per-operation overhead; `None` when overhead was not evaluated.
    pub fn overhead_per_op(&self) -> Option<f64> {
        self.overhead_per_op
    }

    pub fn outlier_mode(&self) -> OutlierMode {
        self.outlier_mode
    }

    /// Per-op values outside the Tukey fences, whether or not they were removed.
    pub fn detected_outliers(&self) -> &[f64] {
        &self.detected_outliers
    }

    pub fn removed_outliers(&self) -> &[f64] {
        &self.removed_outliers
    }

    /// Whether the run stopped early because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn statistics(&self) -> Result<Statistics, StatisticsError> {
        self.statistics_at(ConfidenceLevel::default())
    }

    pub fn statistics_at(&self, level: ConfidenceLevel) -> Result<Statistics, StatisticsError> {
        Statistics::with_confidence_level(
            self.results.iter().map(Measurement::nanoseconds_per_op),
            level,
        )
    }
}
