use super::{Analyser, Conclusion, ConclusionKind};
use crate::measurement::{IterationMode, IterationStage};
use crate::report::BenchmarkReport;
use crate::stats::{
    check_zero_measurement_one_sample, check_zero_measurement_two_samples,
    zero_measurement_threshold,
};

/// Overhead samples needed before the two-sample check is preferred.
const MIN_OVERHEAD_SAMPLE: usize = 3;

/// Detects workloads whose timing cannot be told apart from doing nothing.
///
/// With enough overhead measurements the workload is tested against them;
/// otherwise the Result stage is tested against half a CPU cycle, which
/// requires a known CPU frequency.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroMeasurementAnalyser {
    cpu_frequency_ghz: Option<f64>,
}

impl ZeroMeasurementAnalyser {
    pub fn new(cpu_frequency_ghz: Option<f64>) -> Self {
        Self { cpu_frequency_ghz }
    }
}

impl Analyser for ZeroMeasurementAnalyser {
    fn id(&self) -> &'static str {
        "ZeroMeasurement"
    }

    fn analyse(&self, report: &BenchmarkReport) -> Vec<Conclusion> {
        let overhead = report.values_of(IterationMode::Overhead, IterationStage::Actual);
        let message = if overhead.len() >= MIN_OVERHEAD_SAMPLE {
            let workload = report.values_of(IterationMode::Workload, IterationStage::Actual);
            check_zero_measurement_two_samples(&workload, &overhead).then(|| {
                "The workload duration is indistinguishable from the empty loop duration".to_string()
            })
        } else {
            self.cpu_frequency_ghz.and_then(|ghz| {
                let threshold = zero_measurement_threshold(ghz);
                check_zero_measurement_one_sample(&report.result_values(), threshold).then(|| {
                    format!(
                        "The workload duration is indistinguishable from zero (threshold {:.4} ns)",
                        threshold
                    )
                })
            })
        };

        message
            .map(|m| vec![Conclusion::new(self.id(), ConclusionKind::Warning, &report.name, m)])
            .unwrap_or_default()
    }
}

/// Flags a Result stage made up entirely of zero durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantFoldingAnalyser;

impl Analyser for ConstantFoldingAnalyser {
    fn id(&self) -> &'static str {
        "ConstantFolding"
    }

    fn analyse(&self, report: &BenchmarkReport) -> Vec<Conclusion> {
        let values = report.result_values();
        if values.is_empty() || values.iter().any(|&v| v > 0.0) {
            return Vec::new();
        }
        vec![Conclusion::new(
            self.id(),
            ConclusionKind::Warning,
            &report.name,
            "Every result measurement is zero; the workload was most likely optimized away",
        )]
    }
}
