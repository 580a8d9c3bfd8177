//! Core types and statistics for stagebench.
//!
//! This crate holds the measurement records shared by the harness runtime and
//! the CLI, the line protocol between them, descriptive statistics, hypothesis
//! tests and the analysers that turn reports into conclusions.

pub mod analysis;
pub mod measurement;
pub mod protocol;
pub mod report;
pub mod results;
pub mod stats;

// Re-export main types for convenience
pub use analysis::{Analyser, AnalysisSettings, Conclusion, ConclusionKind};
pub use measurement::{IterationData, IterationMode, IterationStage, Measurement, Timing};
pub use protocol::{format_line, parse_line, parse_log_line, LogLine, ParseError};
pub use report::{
    BenchmarkComparison, BenchmarkReport, ReportError, Reporter, SampleStats, TerminalReporter,
};
pub use results::RunResults;
pub use stats::{
    compare_samples, ComparisonVerdict, ConfidenceInterval, ConfidenceLevel, OutlierMode,
    SampleComparison, StatisticalTest, Statistics, StatisticsError, Threshold, WelchTTest,
};
