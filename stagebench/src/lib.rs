//! stagebench: summarize and compare staged micro-benchmark measurements.
//!
//! Harness binaries built on `stagebench-harness` print line-protocol logs;
//! this crate folds those logs into reports, runs the diagnostics and
//! decides whether a candidate is faster, slower or equivalent to a
//! baseline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logs;

// Re-export core types for convenience
pub use stagebench_core::protocol;
pub use stagebench_core::report::{
    BenchmarkComparison, BenchmarkReport, ReportError, Reporter, SampleStats, TerminalReporter,
};
pub use stagebench_core::stats::{ComparisonVerdict, OutlierMode, Threshold};

// Re-export main types from this crate
pub use cli::{Cli, Command};
pub use commands::{compare, load_reports, settings, summarize, Summary};
pub use config::Config;
pub use logs::{parse_log, BenchmarkLog, LogCollector};
