use super::{Analyser, Conclusion, ConclusionKind};
use crate::report::BenchmarkReport;

/// Reports how many outliers were present versus how many were removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutliersAnalyser;

fn format_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.2} ns", v))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Analyser for OutliersAnalyser {
    fn id(&self) -> &'static str {
        "Outliers"
    }

    fn analyse(&self, report: &BenchmarkReport) -> Vec<Conclusion> {
        let detected = report.detected_outlier_count();
        if detected == 0 {
            return Vec::new();
        }
        let removed: Vec<f64> = report
            .runs
            .iter()
            .flat_map(|run| run.removed_outliers().iter().copied())
            .collect();

        let message = if removed.is_empty() {
            format!("{} outliers were detected but none were removed", detected)
        } else if removed.len() == detected {
            format!("{} outliers were removed ({})", removed.len(), format_values(&removed))
        } else {
            format!(
                "{} outliers were removed ({}), {} outliers were detected",
                removed.len(),
                format_values(&removed),
                detected
            )
        };
        vec![Conclusion::new(self.id(), ConclusionKind::Hint, &report.name, message)]
    }
}
