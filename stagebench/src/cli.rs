//! Command-line interface for stagebench.

use crate::config::Config;
use clap::{Parser, Subcommand};
use stagebench_core::stats::{ConfidenceLevel, OutlierMode, Threshold};
use stagebench_harness::RunStrategy;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "stagebench")]
#[command(about = "Summarize and compare staged micro-benchmark measurements")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (defaults to .stagebench.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Outlier mode: dont_remove, remove_lower, remove_upper or remove_all
    #[arg(long, global = true)]
    pub outlier_mode: Option<OutlierMode>,

    /// Confidence level of the reported error (0.0-1.0)
    #[arg(long, global = true, value_parser = parse_confidence_level)]
    pub confidence_level: Option<ConfidenceLevel>,

    /// Equivalence threshold, relative ("2%") or absolute ("5ns")
    #[arg(long, global = true, value_parser = parse_threshold)]
    pub threshold: Option<Threshold>,

    /// Significance level of the hypothesis tests
    #[arg(long, global = true)]
    pub alpha: Option<f64>,

    /// CPU frequency in GHz, used by the zero-measurement analyser
    #[arg(long, global = true)]
    pub cpu_frequency: Option<f64>,

    /// Print reports as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fold measurement logs into statistics and diagnostics
    Summarize {
        /// Log files written by a stagebench harness
        #[arg(required = true)]
        logs: Vec<PathBuf>,
    },
    /// Compare baseline logs against candidate logs
    Compare {
        /// Baseline log file
        baseline: PathBuf,
        /// Candidate log file
        candidate: PathBuf,
    },
    /// Show the engine settings resolved from the configuration
    Settings {
        /// Run strategy: throughput, cold_start or monitoring
        #[arg(long)]
        strategy: Option<RunStrategy>,
        /// Use the dry preset (one cold launch with one iteration)
        #[arg(long)]
        dry: bool,
    },
}

impl Cli {
    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values.
    /// Only non-None optional values will override the config.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(outlier_mode) = self.outlier_mode {
            config.analysis.outlier_mode = outlier_mode;
        }

        if let Some(confidence_level) = self.confidence_level {
            config.analysis.confidence_level = confidence_level;
        }

        if let Some(threshold) = self.threshold {
            config.hypothesis.threshold = threshold;
        }

        if let Some(alpha) = self.alpha {
            config.hypothesis.alpha = alpha;
        }

        if let Some(ghz) = self.cpu_frequency {
            config.analysis.cpu_frequency_ghz = Some(ghz);
        }

        if let Command::Settings { strategy, dry } = &self.command {
            if *dry {
                config.engine = config.engine.clone().or(stagebench_harness::EngineConfig::dry());
            }
            if let Some(strategy) = strategy {
                config.engine.strategy = Some(*strategy);
            }
        }
    }
}

fn parse_confidence_level(s: &str) -> Result<ConfidenceLevel, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    ConfidenceLevel::new(value).map_err(|e| e.to_string())
}

fn parse_threshold(s: &str) -> Result<Threshold, String> {
    let s = s.trim();
    let parse = |number: &str| -> Result<f64, String> {
        match number.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(format!("invalid threshold '{}'", s)),
        }
    };
    if let Some(percent) = s.strip_suffix('%') {
        Ok(Threshold::Relative(parse(percent)? / 100.0))
    } else if let Some(ns) = s.strip_suffix("ns") {
        Ok(Threshold::Absolute(parse(ns)?))
    } else {
        Err(format!("threshold '{}' needs a '%' or 'ns' suffix", s))
    }
}
