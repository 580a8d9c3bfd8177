use std::time::Duration;

use super::{Analyser, Conclusion, ConclusionKind};
use crate::measurement::{IterationMode, IterationStage, Measurement};
use crate::report::BenchmarkReport;

/// Warns when an actual workload iteration was too short to time reliably.
#[derive(Debug, Clone, Copy)]
pub struct MinIterationTimeAnalyser {
    min_iteration_time: Duration,
}

impl MinIterationTimeAnalyser {
    pub fn new(min_iteration_time: Duration) -> Self {
        Self { min_iteration_time }
    }
}

impl Default for MinIterationTimeAnalyser {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl Analyser for MinIterationTimeAnalyser {
    fn id(&self) -> &'static str {
        "MinIterationTime"
    }

    fn analyse(&self, report: &BenchmarkReport) -> Vec<Conclusion> {
        let shortest = report
            .runs
            .iter()
            .flat_map(|run| run.measurements_of(IterationMode::Workload, IterationStage::Actual))
            .map(Measurement::nanoseconds)
            .fold(f64::INFINITY, f64::min);
        let limit = self.min_iteration_time.as_nanos() as f64;
        if !shortest.is_finite() || shortest >= limit {
            return Vec::new();
        }
        vec![Conclusion::new(
            self.id(),
            ConclusionKind::Warning,
            &report.name,
            format!(
                "The minimum observed iteration time is {:.4} ms, below {} ms; increase the invocation count",
                shortest / 1e6,
                self.min_iteration_time.as_millis()
            ),
        )]
    }
}
