use std::io::{self, Write};

use colored::Colorize;

use super::{BenchmarkComparison, BenchmarkReport, ReportError, Reporter, SampleStats};
use crate::analysis::{Conclusion, ConclusionKind};
use crate::stats::ComparisonVerdict;

/// A reporter that outputs benchmark summaries and comparisons to the terminal.
#[derive(Debug, Clone)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// Format a duration in nanoseconds to a human-readable string.
    fn format_time(ns: f64) -> String {
        if !ns.is_finite() {
            "NA".to_string()
        } else if ns >= 1_000_000_000.0 {
            format!("{:.3} s", ns / 1_000_000_000.0)
        } else if ns >= 1_000_000.0 {
            format!("{:.3} ms", ns / 1_000_000.0)
        } else if ns >= 1_000.0 {
            format!("{:.3} us", ns / 1_000.0)
        } else {
            format!("{:.3} ns", ns)
        }
    }

    /// Format a mean with its confidence interval half-width.
    fn format_time_with_error(stats: &SampleStats) -> String {
        let mean = Self::format_time(stats.mean_ns);
        let error = Self::format_time(stats.error_ns);
        format!("{} (+/- {})", mean, error)
    }

    fn format_ratio(ratio: f64) -> String {
        if ratio.is_finite() {
            format!("{:.2}x", ratio)
        } else {
            "NA".to_string()
        }
    }

    fn paint(&self, text: &str, verdict: ComparisonVerdict) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        match verdict {
            ComparisonVerdict::Faster => text.green().bold().to_string(),
            ComparisonVerdict::Slower => text.red().bold().to_string(),
            ComparisonVerdict::Same => text.to_string(),
            ComparisonVerdict::Inconclusive => text.yellow().to_string(),
        }
    }

    fn truncate_name(name: &str) -> String {
        if name.chars().count() > 38 {
            let head: String = name.chars().take(35).collect();
            format!("{}...", head)
        } else {
            name.to_string()
        }
    }

    fn print_title(&self, writer: &mut impl Write, header: &str, width: usize) -> io::Result<()> {
        writeln!(writer)?;
        if self.use_colors {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }
        writeln!(writer, "{}", "-".repeat(width))?;
        Ok(())
    }

    fn print_summary_header(&self, writer: &mut impl Write) -> io::Result<()> {
        let header = format!(
            "{:<40} {:>14} {:>14} {:>14} {:>14} {:>6} {:>9}",
            "Benchmark", "Mean", "Error", "StdDev", "Median", "N", "Outliers"
        );
        self.print_title(writer, &header, 117)
    }

    fn print_summary_row(&self, writer: &mut impl Write, report: &BenchmarkReport) -> io::Result<()> {
        let stats = SampleStats::from(report);
        writeln!(
            writer,
            "{:<40} {:>14} {:>14} {:>14} {:>14} {:>6} {:>9}",
            Self::truncate_name(&report.name),
            Self::format_time(stats.mean_ns),
            Self::format_time(stats.error_ns),
            Self::format_time(stats.std_dev_ns),
            Self::format_time(stats.median_ns),
            stats.sample_count,
            format!(
                "{}/{}",
                report.removed_outlier_count(),
                report.detected_outlier_count()
            ),
        )
    }

    fn print_conclusions(&self, writer: &mut impl Write, conclusions: &[Conclusion]) -> io::Result<()> {
        if conclusions.is_empty() {
            return Ok(());
        }
        writeln!(writer)?;
        for conclusion in conclusions {
            let label = format!("[{}]", conclusion.kind);
            let label = if self.use_colors {
                match conclusion.kind {
                    ConclusionKind::Hint => label.cyan().to_string(),
                    ConclusionKind::Warning => label.yellow().to_string(),
                    ConclusionKind::Error => label.red().bold().to_string(),
                }
            } else {
                label
            };
            writeln!(
                writer,
                "{} {}: {}",
                label, conclusion.benchmark, conclusion.message
            )?;
        }
        Ok(())
    }

    /// Print the comparison table header.
    fn print_comparison_header(&self, writer: &mut impl Write) -> io::Result<()> {
        let header = format!(
            "{:<40} {:>26} {:>26} {:>8} {:>14}",
            "Benchmark", "Baseline", "Candidate", "Ratio", "Result"
        );
        self.print_title(writer, &header, 118)
    }

    /// Print a single comparison row.
    fn print_comparison_row(
        &self,
        writer: &mut impl Write,
        comparison: &BenchmarkComparison,
    ) -> io::Result<()> {
        let verdict = comparison.comparison.verdict;
        let baseline = Self::format_time_with_error(&comparison.baseline_stats);
        let candidate = Self::format_time_with_error(&comparison.candidate_stats);
        let ratio = Self::format_ratio(comparison.ratio());

        // Pad before painting so ANSI escape codes do not break alignment
        let ratio = self.paint(&format!("{:>8}", ratio), verdict);
        let result = self.paint(&format!("{:>14}", verdict.as_str()), verdict);

        writeln!(
            writer,
            "{:<40} {:>26} {:>26} {} {}",
            Self::truncate_name(&comparison.name),
            baseline,
            candidate,
            ratio,
            result,
        )
    }

    /// Print the comparison summary footer.
    fn print_comparison_summary(
        &self,
        writer: &mut impl Write,
        results: &[BenchmarkComparison],
    ) -> io::Result<()> {
        let count = |verdict: ComparisonVerdict| {
            results
                .iter()
                .filter(|c| c.comparison.verdict == verdict)
                .count()
        };

        writeln!(writer)?;
        writeln!(writer, "{}", "-".repeat(118))?;

        let summary_label = "Summary:";
        if self.use_colors {
            write!(writer, "{} ", summary_label.bold())?;
        } else {
            write!(writer, "{} ", summary_label)?;
        }

        let parts = [
            ComparisonVerdict::Faster,
            ComparisonVerdict::Slower,
            ComparisonVerdict::Same,
            ComparisonVerdict::Inconclusive,
        ]
        .map(|verdict| self.paint(&format!("{} {}", count(verdict), verdict), verdict));
        writeln!(writer, "{}", parts.join(", "))?;

        writeln!(writer)?;
        Ok(())
    }

    pub fn write_summaries(
        &self,
        writer: &mut impl Write,
        reports: &[BenchmarkReport],
        conclusions: &[Conclusion],
    ) -> io::Result<()> {
        self.print_summary_header(writer)?;
        for report in reports {
            self.print_summary_row(writer, report)?;
        }
        self.print_conclusions(writer, conclusions)?;
        writeln!(writer)?;
        Ok(())
    }

    pub fn write_comparisons(
        &self,
        writer: &mut impl Write,
        results: &[BenchmarkComparison],
    ) -> io::Result<()> {
        self.print_comparison_header(writer)?;
        for comparison in results {
            self.print_comparison_row(writer, comparison)?;
        }
        self.print_comparison_summary(writer, results)
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for TerminalReporter {
    fn report_summaries(
        &self,
        reports: &[BenchmarkReport],
        conclusions: &[Conclusion],
    ) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        self.write_summaries(&mut writer, reports, conclusions)?;
        Ok(())
    }

    fn report_comparisons(&self, results: &[BenchmarkComparison]) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        self.write_comparisons(&mut writer, results)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{IterationMode, IterationStage, Measurement};
    use crate::stats::{ConfidenceLevel, OutlierMode, Threshold};

    fn make_report(name: &str, base: f64) -> BenchmarkReport {
        let measurements = (0..30)
            .map(|i| {
                Measurement::new(
                    0,
                    IterationMode::Workload,
                    IterationStage::Actual,
                    i + 1,
                    1,
                    base + (i % 5) as f64,
                )
            })
            .collect();
        BenchmarkReport::from_measurements(
            name,
            measurements,
            OutlierMode::RemoveUpper,
            ConfidenceLevel::L99,
        )
        .unwrap()
    }

    #[test]
    fn test_format_time_nanoseconds() {
        assert_eq!(TerminalReporter::format_time(123.456), "123.456 ns");
        assert_eq!(TerminalReporter::format_time(999.999), "999.999 ns");
    }

    #[test]
    fn test_format_time_microseconds() {
        assert_eq!(TerminalReporter::format_time(1234.567), "1.235 us");
        assert_eq!(TerminalReporter::format_time(999_999.0), "999.999 us");
    }

    #[test]
    fn test_format_time_milliseconds() {
        assert_eq!(TerminalReporter::format_time(1_234_567.0), "1.235 ms");
        assert_eq!(TerminalReporter::format_time(999_999_999.0), "1000.000 ms");
    }

    #[test]
    fn test_format_time_seconds() {
        assert_eq!(TerminalReporter::format_time(1_234_567_890.0), "1.235 s");
        assert_eq!(TerminalReporter::format_time(f64::NAN), "NA");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(TerminalReporter::format_ratio(1.5), "1.50x");
        assert_eq!(TerminalReporter::format_ratio(f64::NAN), "NA");
    }

    #[test]
    fn test_truncate_long_name() {
        let name = "a".repeat(50);
        assert_eq!(TerminalReporter::truncate_name(&name).len(), 38);
    }

    #[test]
    fn test_summaries_to_buffer() {
        let reporter = TerminalReporter::without_colors();
        let reports = vec![make_report("bench_sum", 100.0)];
        let conclusions = vec![Conclusion::new(
            "Outliers",
            ConclusionKind::Hint,
            "bench_sum",
            "1 outliers were removed",
        )];

        let mut buffer = Vec::new();
        reporter
            .write_summaries(&mut buffer, &reports, &conclusions)
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("Mean"));
        assert!(output.contains("bench_sum"));
        assert!(output.contains("102.000 ns"));
        assert!(output.contains("[hint] bench_sum: 1 outliers were removed"));
    }

    #[test]
    fn test_comparisons_to_buffer() {
        let reporter = TerminalReporter::without_colors();
        let results = vec![
            BenchmarkComparison::new(
                &make_report("bench_same", 100.0),
                &make_report("bench_same", 100.0),
                Threshold::Relative(0.05),
                0.05,
            ),
            BenchmarkComparison::new(
                &make_report("bench_slow", 100.0),
                &make_report("bench_slow", 200.0),
                Threshold::Relative(0.05),
                0.05,
            ),
        ];

        let mut buffer = Vec::new();
        reporter.write_comparisons(&mut buffer, &results).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("Baseline"));
        assert!(output.contains("Candidate"));
        assert!(output.contains("bench_same"));
        assert!(output.contains("bench_slow"));
        assert!(output.contains("Summary:"));
        assert!(output.contains("0 faster"));
        assert!(output.contains("1 slower"));
        assert!(output.contains("1 same"));
        assert!(output.contains("1.98x"));
    }

    #[test]
    fn test_default_uses_colors() {
        assert!(TerminalReporter::default().use_colors);
        assert!(!TerminalReporter::without_colors().use_colors);
    }
}
