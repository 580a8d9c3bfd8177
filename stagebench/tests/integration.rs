//! Integration tests for stagebench.
//!
//! Logs are written the way a harness binary writes them, then folded back
//! through the same paths `stagebench summarize` and `compare` use.

use stagebench::protocol::{benchmark_header, format_line, launch_header};
use stagebench::{commands, ComparisonVerdict, Config, TerminalReporter, Threshold};
use stagebench_core::{ConclusionKind, IterationMode, IterationStage, Measurement};
use stagebench_harness::{
    run_harness, Benchmark, BenchmarkRegistry, CancellationToken, DefaultResolver, EngineConfig,
};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// One launch of `count` actual iterations near `base` ns each.
fn write_log(benchmarks: &[(&str, f64)], count: u32) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for (name, base) in benchmarks {
        writeln!(file, "{}", benchmark_header(name)).unwrap();
        writeln!(file, "{}", launch_header(0)).unwrap();
        for index in 1..=count {
            let ns = base + (index % 5) as f64;
            let m = Measurement::new(0, IterationMode::Workload, IterationStage::Actual, index, 1, ns);
            writeln!(file, "{}", format_line(&m, 1e9)).unwrap();
        }
    }
    file.flush().unwrap();
    file
}

fn path_of(file: &NamedTempFile) -> Vec<PathBuf> {
    vec![file.path().to_path_buf()]
}

#[test]
fn test_summarize_builds_reports_and_conclusions() {
    let log = write_log(&[("parse", 100.0), ("render", 1000.0)], 30);
    let summary = commands::summarize(&path_of(&log), &Config::default()).unwrap();

    assert_eq!(summary.reports.len(), 2);
    assert_eq!(summary.reports[0].name, "parse");
    assert_eq!(summary.reports[0].statistics.n, 30);
    assert!((summary.reports[0].statistics.mean - 102.0).abs() < 0.5);

    // every iteration is far below 100 ms
    assert!(summary
        .conclusions
        .iter()
        .any(|c| c.kind == ConclusionKind::Warning && c.benchmark == "parse"));

    let mut out = Vec::new();
    TerminalReporter::without_colors()
        .write_summaries(&mut out, &summary.reports, &summary.conclusions)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("parse"));
    assert!(text.contains("render"));
}

#[test]
fn test_compare_detects_regression_and_equivalence() {
    let baseline = write_log(&[("fast", 100.0), ("steady", 500.0)], 30);
    let candidate = write_log(&[("fast", 200.0), ("steady", 500.0)], 30);

    let mut config = Config::default();
    config.hypothesis.threshold = Threshold::Relative(0.05);

    let comparisons =
        commands::compare(&path_of(&baseline), &path_of(&candidate), &config).unwrap();

    assert_eq!(comparisons.len(), 2);
    assert_eq!(comparisons[0].name, "fast");
    assert_eq!(comparisons[0].comparison.verdict, ComparisonVerdict::Slower);
    assert_eq!(comparisons[1].name, "steady");
    assert_eq!(comparisons[1].comparison.verdict, ComparisonVerdict::Same);
}

#[test]
fn test_compare_skips_unmatched_benchmarks() {
    let baseline = write_log(&[("only_base", 100.0), ("shared", 100.0)], 20);
    let candidate = write_log(&[("shared", 100.0), ("only_candidate", 100.0)], 20);

    let comparisons =
        commands::compare(&path_of(&baseline), &path_of(&candidate), &Config::default()).unwrap();

    assert_eq!(comparisons.len(), 1);
    assert_eq!(comparisons[0].name, "shared");
}

#[test]
fn test_missing_log_file_is_an_error() {
    let result = commands::summarize(
        &[PathBuf::from("/nonexistent/stagebench.log")],
        &Config::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_harness_output_round_trips_through_summarize() {
    let mut registry = BenchmarkRegistry::new();
    registry.register(Benchmark::new("sum", || {
        std::hint::black_box((0..64u64).sum::<u64>());
    }));

    let config = EngineConfig {
        launch_count: Some(2),
        ..EngineConfig::dry()
    };
    let mut log = NamedTempFile::new().unwrap();
    let runs = run_harness(
        &mut registry,
        &config,
        &DefaultResolver,
        None,
        &mut log,
        &CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(runs.len(), 1);

    let summary = commands::summarize(&path_of(&log), &Config::default()).unwrap();
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].name, "sum");
    assert_eq!(summary.reports[0].runs.len(), 2);
    assert_eq!(summary.reports[0].statistics.n, 2);
}

#[test]
fn test_settings_resolve_engine_section() {
    let mut config = Config::default();
    config.engine = EngineConfig::dry();
    let settings = commands::settings(&config).unwrap();
    assert_eq!(settings.launch_count, 1);
    assert!(!settings.has_jit());

    config.engine.launch_count = Some(0);
    assert!(commands::settings(&config).is_err());
}
