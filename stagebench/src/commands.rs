//! The work behind each subcommand, independent of terminal output.

use anyhow::{Context, Result};
use serde::Serialize;
use stagebench_core::analysis::{analyse_all, default_analysers};
use stagebench_core::report::{BenchmarkComparison, BenchmarkReport, ReportError};
use stagebench_core::Conclusion;
use stagebench_harness::{DefaultResolver, EngineSettings};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::logs::LogCollector;

/// Reports plus every analyser conclusion about them.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub reports: Vec<BenchmarkReport>,
    pub conclusions: Vec<Conclusion>,
}

/// Read every log file and fold each benchmark into a report.
///
/// Benchmarks without a single actual workload measurement are skipped.
pub fn load_reports(paths: &[PathBuf], config: &Config) -> Result<Vec<BenchmarkReport>> {
    let mut collector = LogCollector::new();
    for path in paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read log file: {}", path.display()))?;
        collector.feed(&text, &default_name(path));
    }

    let mut reports = Vec::new();
    for log in collector.finish() {
        let count = log.measurements.len();
        match BenchmarkReport::from_measurements(
            log.name.clone(),
            log.measurements,
            config.analysis.outlier_mode,
            config.analysis.confidence_level,
        ) {
            Ok(report) => {
                info!(benchmark = %log.name, measurements = count, "Loaded benchmark");
                reports.push(report);
            }
            Err(ReportError::EmptyActualStage(name)) => {
                warn!(benchmark = %name, "No actual workload measurements, skipping");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to build report for {}", log.name))
            }
        }
    }
    Ok(reports)
}

pub fn summarize(paths: &[PathBuf], config: &Config) -> Result<Summary> {
    let reports = load_reports(paths, config)?;
    let analysers = default_analysers(&config.analysis_settings());
    let conclusions = analyse_all(&analysers, &reports);
    Ok(Summary {
        reports,
        conclusions,
    })
}

/// Compare every benchmark present on both sides.
pub fn compare(
    baseline: &[PathBuf],
    candidate: &[PathBuf],
    config: &Config,
) -> Result<Vec<BenchmarkComparison>> {
    let baseline = load_reports(baseline, config).context("Failed to load baseline logs")?;
    let candidate = load_reports(candidate, config).context("Failed to load candidate logs")?;

    for report in &candidate {
        if !baseline.iter().any(|b| b.name == report.name) {
            warn!(benchmark = %report.name, "Benchmark missing from baseline");
        }
    }

    let comparisons = baseline
        .iter()
        .filter_map(|base| match candidate.iter().find(|c| c.name == base.name) {
            Some(cand) => Some(BenchmarkComparison::new(
                base,
                cand,
                config.hypothesis.threshold,
                config.hypothesis.alpha,
            )),
            None => {
                warn!(benchmark = %base.name, "Benchmark missing from candidate");
                None
            }
        })
        .collect();
    Ok(comparisons)
}

/// Resolve the `[engine]` section against the built-in defaults.
pub fn settings(config: &Config) -> Result<EngineSettings> {
    config
        .engine
        .resolve(&DefaultResolver)
        .context("Invalid engine configuration")
}

fn default_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "benchmark".to_string())
}
