//! Analysers turning finished reports into [`Conclusion`]s.
//!
//! Findings never abort anything; they are attached to the summary for the
//! user to judge.

use std::fmt;

use serde::Serialize;

use crate::report::BenchmarkReport;

mod iteration_time;
mod multimodal;
mod outliers;
mod zero_measurement;

pub use iteration_time::MinIterationTimeAnalyser;
pub use multimodal::MultimodalDistributionAnalyser;
pub use outliers::OutliersAnalyser;
pub use zero_measurement::{ConstantFoldingAnalyser, ZeroMeasurementAnalyser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConclusionKind {
    Hint,
    Warning,
    Error,
}

impl fmt::Display for ConclusionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConclusionKind::Hint => "hint",
            ConclusionKind::Warning => "warning",
            ConclusionKind::Error => "error",
        };
        f.write_str(text)
    }
}

/// A short structured diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conclusion {
    pub analyser_id: &'static str,
    pub kind: ConclusionKind,
    pub message: String,
    /// Benchmark the finding is about.
    pub benchmark: String,
}

impl Conclusion {
    pub fn new(
        analyser_id: &'static str,
        kind: ConclusionKind,
        benchmark: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            analyser_id,
            kind,
            message: message.into(),
            benchmark: benchmark.to_string(),
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.benchmark, self.message)
    }
}

pub trait Analyser: Send + Sync {
    fn id(&self) -> &'static str;

    fn analyse(&self, report: &BenchmarkReport) -> Vec<Conclusion>;
}

/// Settings shared by the default analyser set.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Maximum CPU frequency; enables the one-sample zero-measurement check.
    pub cpu_frequency_ghz: Option<f64>,
    /// Fewest Result values for which modality is evaluated.
    pub modality_min_sample: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            cpu_frequency_ghz: None,
            modality_min_sample: multimodal::DEFAULT_MIN_SAMPLE,
        }
    }
}

pub fn default_analysers(settings: &AnalysisSettings) -> Vec<Box<dyn Analyser>> {
    vec![
        Box::new(OutliersAnalyser),
        Box::new(MinIterationTimeAnalyser::default()),
        Box::new(MultimodalDistributionAnalyser::new(settings.modality_min_sample)),
        Box::new(ZeroMeasurementAnalyser::new(settings.cpu_frequency_ghz)),
        Box::new(ConstantFoldingAnalyser),
    ]
}

/// Run every analyser over every report, most severe findings first.
pub fn analyse_all(analysers: &[Box<dyn Analyser>], reports: &[BenchmarkReport]) -> Vec<Conclusion> {
    let mut conclusions: Vec<Conclusion> = reports
        .iter()
        .flat_map(|report| analysers.iter().flat_map(move |a| a.analyse(report)))
        .collect();
    conclusions.sort_by(|a, b| b.kind.cmp(&a.kind));
    conclusions
}


#[cfg(test)]
mod tests {
    use super::test_support::workload_report;
    use super::*;

    #[test]
    fn test_conclusion_display() {
        let c = Conclusion::new("Outliers", ConclusionKind::Hint, "sum", "2 outliers were removed");
        assert_eq!(c.to_string(), "[hint] sum: 2 outliers were removed");
    }

    #[test]
    fn test_analyse_all_orders_by_severity() {
        // All-zero single-op iterations trip the constant folding and
        // iteration time analysers.
        let report = workload_report(&[0.0; 5]);
        let conclusions = analyse_all(&default_analysers(&AnalysisSettings::default()), &[report]);

        assert!(!conclusions.is_empty());
        assert!(conclusions
            .windows(2)
            .all(|pair| pair[0].kind >= pair[1].kind));
        assert!(conclusions.iter().any(|c| c.analyser_id == "ConstantFolding"));
    }
}
