//! Engine configuration and its resolution into concrete settings.
//!
//! [`EngineConfig`] records only what the user asked for; every knob is
//! optional. A [`Resolver`] supplies the value of each knob left unset and
//! [`EngineConfig::resolve`] combines the two into validated
//! [`EngineSettings`]. Presence matters for a few knobs:
//!
//! * an explicit `invocation_count` skips the Pilot stage,
//! * an explicit `unroll_factor` is never adjusted by the engine,
//! * an explicit `iteration_time` selects the target-time pilot; without it
//!   the pilot grows the batch until the clock resolution error is small
//!   enough.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stagebench_core::stats::{ConfidenceLevel, OutlierMode};
use thiserror::Error;

use crate::stage::StoppingCriterion;

/// Largest invocation count the pilot will ever request.
pub const MAX_INVOKE_COUNT: u64 = ((i64::MAX / 2 + 1) / 2) as u64;

/// Actual workload iterations run when convergence is not evaluated.
pub const DEFAULT_WORKLOAD_COUNT: u32 = 10;

/// Per-op relative error accepted for the overhead estimate.
pub const MAX_OVERHEAD_RELATIVE_ERROR: f64 = 0.05;

const MAX_OVERHEAD_WARMUP_COUNT: u32 = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid {what} bounds: min {min} exceeds max {max}")]
    InvalidBounds { what: &'static str, min: u32, max: u32 },

    #[error("{0} must be positive")]
    NotPositive(&'static str),

    #[error("invocation count {invocation_count} is not a multiple of unroll factor {unroll_factor}")]
    InvocationNotMultipleOfUnroll {
        invocation_count: u64,
        unroll_factor: u64,
    },

    #[error("relative error must be in (0, 1), got {0}")]
    InvalidRelativeError(f64),

    #[error("unknown run strategy '{0}'")]
    UnknownStrategy(String),
}

/// How the engine spends its iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStrategy {
    /// Steady-state throughput of a micro-benchmark.
    #[default]
    Throughput,
    /// First-call cost: no Jit, Pilot or Warmup, one invocation per iteration.
    ColdStart,
    /// Macro-benchmarks without a steady state: no Jit, Pilot or overhead,
    /// a fixed number of actual iterations.
    Monitoring,
}

impl FromStr for RunStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "throughput" => Ok(RunStrategy::Throughput),
            "coldstart" => Ok(RunStrategy::ColdStart),
            "monitoring" => Ok(RunStrategy::Monitoring),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for RunStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunStrategy::Throughput => "throughput",
            RunStrategy::ColdStart => "cold_start",
            RunStrategy::Monitoring => "monitoring",
        };
        f.write_str(text)
    }
}

/// Rule used to end the Warmup stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupCriterion {
    /// Confidence interval of the mean within the relative error.
    #[default]
    Convergence,
    /// Enough direction changes between consecutive iterations.
    Fluctuation,
}

/// How the Pilot stage picks the invocation count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PilotMode {
    /// Scale the batch until one iteration takes about `iteration_time`.
    TargetTime { iteration_time: Duration },
    /// Grow the batch until the clock resolution error per operation is
    /// within the relative error and one iteration lasts `min_iteration_time`.
    Accuracy { min_iteration_time: Duration },
}

/// User-facing engine configuration; unset fields fall back to a [`Resolver`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: Option<RunStrategy>,
    /// Number of independent engine runs per benchmark.
    pub launch_count: Option<u32>,
    pub warmup_count: Option<u32>,
    pub min_warmup_count: Option<u32>,
    pub max_warmup_count: Option<u32>,
    pub warmup_criterion: Option<WarmupCriterion>,
    /// Fixed number of actual workload iterations.
    pub iteration_count: Option<u32>,
    pub min_iteration_count: Option<u32>,
    pub max_iteration_count: Option<u32>,
    /// Overhead warmup bounds; default to the workload ones, capped at 10.
    pub min_overhead_warmup_count: Option<u32>,
    pub max_overhead_warmup_count: Option<u32>,
    pub min_overhead_iteration_count: Option<u32>,
    pub max_overhead_iteration_count: Option<u32>,
    pub invocation_count: Option<u64>,
    pub unroll_factor: Option<u64>,
    #[serde(with = "duration_ms")]
    pub iteration_time: Option<Duration>,
    #[serde(with = "duration_ms")]
    pub min_iteration_time: Option<Duration>,
    pub min_invoke_count: Option<u64>,
    pub evaluate_overhead: Option<bool>,
    pub outlier_mode: Option<OutlierMode>,
    pub max_relative_error: Option<f64>,
    #[serde(with = "duration_ms")]
    pub max_absolute_error: Option<Duration>,
    pub confidence_level: Option<ConfidenceLevel>,
}

impl EngineConfig {
    /// A single cold-start iteration of a single launch, for smoke-testing benchmarks.
    pub fn dry() -> Self {
        Self {
            strategy: Some(RunStrategy::ColdStart),
            launch_count: Some(1),
            iteration_count: Some(1),
            ..Self::default()
        }
    }

    /// Fill every unset knob from `other`.
    pub fn or(self, other: EngineConfig) -> Self {
        Self {
            strategy: self.strategy.or(other.strategy),
            launch_count: self.launch_count.or(other.launch_count),
            warmup_count: self.warmup_count.or(other.warmup_count),
            min_warmup_count: self.min_warmup_count.or(other.min_warmup_count),
            max_warmup_count: self.max_warmup_count.or(other.max_warmup_count),
            warmup_criterion: self.warmup_criterion.or(other.warmup_criterion),
            iteration_count: self.iteration_count.or(other.iteration_count),
            min_iteration_count: self.min_iteration_count.or(other.min_iteration_count),
            max_iteration_count: self.max_iteration_count.or(other.max_iteration_count),
            min_overhead_warmup_count: self
                .min_overhead_warmup_count
                .or(other.min_overhead_warmup_count),
            max_overhead_warmup_count: self
                .max_overhead_warmup_count
                .or(other.max_overhead_warmup_count),
            min_overhead_iteration_count: self
                .min_overhead_iteration_count
                .or(other.min_overhead_iteration_count),
            max_overhead_iteration_count: self
                .max_overhead_iteration_count
                .or(other.max_overhead_iteration_count),
            invocation_count: self.invocation_count.or(other.invocation_count),
            unroll_factor: self.unroll_factor.or(other.unroll_factor),
            iteration_time: self.iteration_time.or(other.iteration_time),
            min_iteration_time: self.min_iteration_time.or(other.min_iteration_time),
            min_invoke_count: self.min_invoke_count.or(other.min_invoke_count),
            evaluate_overhead: self.evaluate_overhead.or(other.evaluate_overhead),
            outlier_mode: self.outlier_mode.or(other.outlier_mode),
            max_relative_error: self.max_relative_error.or(other.max_relative_error),
            max_absolute_error: self.max_absolute_error.or(other.max_absolute_error),
            confidence_level: self.confidence_level.or(other.confidence_level),
        }
    }

    /// Resolve every knob and validate the result.
    pub fn resolve(&self, resolver: &dyn Resolver) -> Result<EngineSettings, ConfigError> {
        let strategy = self.strategy.unwrap_or_else(|| resolver.strategy());
        let launch_count = self.launch_count.unwrap_or_else(|| resolver.launch_count(strategy));
        if launch_count == 0 {
            return Err(ConfigError::NotPositive("launch count"));
        }

        let max_relative_error = self
            .max_relative_error
            .unwrap_or_else(|| resolver.max_relative_error());
        if !(max_relative_error > 0.0 && max_relative_error < 1.0) {
            return Err(ConfigError::InvalidRelativeError(max_relative_error));
        }
        let max_absolute_error = self.max_absolute_error.or_else(|| resolver.max_absolute_error());
        let confidence_level = self
            .confidence_level
            .unwrap_or_else(|| resolver.confidence_level());

        let unroll_factor_pinned = self.unroll_factor.is_some();
        let mut unroll_factor = self
            .unroll_factor
            .unwrap_or_else(|| resolver.unroll_factor(strategy));
        if unroll_factor == 0 {
            return Err(ConfigError::NotPositive("unroll factor"));
        }
        if let Some(invocation_count) = self.invocation_count {
            if invocation_count == 0 {
                return Err(ConfigError::NotPositive("invocation count"));
            }
            if invocation_count % unroll_factor != 0 {
                if unroll_factor_pinned {
                    return Err(ConfigError::InvocationNotMultipleOfUnroll {
                        invocation_count,
                        unroll_factor,
                    });
                }
                unroll_factor = 1;
            }
        }

        let min_invoke_count = self
            .min_invoke_count
            .unwrap_or_else(|| resolver.min_invoke_count());
        if min_invoke_count == 0 {
            return Err(ConfigError::NotPositive("min invoke count"));
        }

        let iteration_time = self.iteration_time.unwrap_or_else(|| resolver.iteration_time());
        if iteration_time.is_zero() {
            return Err(ConfigError::NotPositive("iteration time"));
        }
        let pilot = match self.iteration_time {
            Some(iteration_time) => PilotMode::TargetTime { iteration_time },
            None => PilotMode::Accuracy {
                min_iteration_time: self
                    .min_iteration_time
                    .unwrap_or_else(|| resolver.min_iteration_time()),
            },
        };

        let evaluate_overhead = strategy == RunStrategy::Throughput
            && self
                .evaluate_overhead
                .unwrap_or_else(|| resolver.evaluate_overhead(strategy));

        let (min_warmup, max_warmup) = bounds(
            "warmup",
            self.min_warmup_count,
            self.max_warmup_count,
            resolver.warmup_bounds(),
        )?;
        let warmup_criterion = self
            .warmup_criterion
            .unwrap_or_else(|| resolver.warmup_criterion());
        let warmup = match self.warmup_count {
            Some(count) => StoppingCriterion::Fixed(count),
            None => match warmup_criterion {
                WarmupCriterion::Convergence => StoppingCriterion::Convergence {
                    min: min_warmup,
                    max: max_warmup,
                    max_relative_error,
                    max_absolute_error,
                },
                WarmupCriterion::Fluctuation => StoppingCriterion::fluctuation(min_warmup, max_warmup),
            },
        };
        let (min_overhead_warmup, max_overhead_warmup) = bounds(
            "overhead warmup",
            self.min_overhead_warmup_count,
            self.max_overhead_warmup_count,
            (
                min_warmup.min(MAX_OVERHEAD_WARMUP_COUNT),
                max_warmup.min(MAX_OVERHEAD_WARMUP_COUNT),
            ),
        )?;
        let overhead_warmup = match warmup {
            StoppingCriterion::Fixed(count) => StoppingCriterion::Fixed(count),
            _ => StoppingCriterion::fluctuation(min_overhead_warmup, max_overhead_warmup),
        };

        let (min_actual, max_actual) = bounds(
            "iteration",
            self.min_iteration_count,
            self.max_iteration_count,
            resolver.workload_bounds(),
        )?;
        let workload_actual = match (self.iteration_count, strategy) {
            (Some(count), _) => StoppingCriterion::Fixed(count),
            (None, RunStrategy::Monitoring) => StoppingCriterion::Fixed(DEFAULT_WORKLOAD_COUNT),
            (None, _) => StoppingCriterion::Convergence {
                min: min_actual,
                max: max_actual,
                max_relative_error,
                max_absolute_error,
            },
        };
        let (default_min_overhead, default_max_overhead) = resolver.overhead_bounds();
        let (min_overhead, max_overhead) = bounds(
            "overhead iteration",
            self.min_overhead_iteration_count,
            self.max_overhead_iteration_count,
            (
                default_min_overhead.min(max_actual),
                default_max_overhead.min(max_actual),
            ),
        )?;
        let overhead_actual = match self.iteration_count {
            Some(count) => StoppingCriterion::Fixed(count),
            None => StoppingCriterion::Convergence {
                min: min_overhead,
                max: max_overhead,
                max_relative_error: MAX_OVERHEAD_RELATIVE_ERROR,
                max_absolute_error,
            },
        };

        Ok(EngineSettings {
            strategy,
            launch_count,
            invocation_count: self.invocation_count,
            unroll_factor,
            unroll_factor_pinned,
            iteration_time,
            pilot,
            min_invoke_count,
            max_invoke_count: resolver.max_invoke_count(),
            evaluate_overhead,
            warmup,
            overhead_warmup,
            workload_actual,
            overhead_actual,
            outlier_mode: self.outlier_mode.unwrap_or_else(|| resolver.outlier_mode()),
            confidence_level,
        })
    }
}

fn bounds(
    what: &'static str,
    min: Option<u32>,
    max: Option<u32>,
    (default_min, default_max): (u32, u32),
) -> Result<(u32, u32), ConfigError> {
    let (min, max) = match (min, max) {
        (Some(min), Some(max)) => (min, max),
        (Some(min), None) => (min, default_max.max(min)),
        (None, Some(max)) => (default_min.min(max), max),
        (None, None) => (default_min, default_max),
    };
    if max == 0 {
        return Err(ConfigError::NotPositive(what));
    }
    if min > max {
        return Err(ConfigError::InvalidBounds { what, min, max });
    }
    Ok((min, max))
}

/// Source of the value used for every knob an [`EngineConfig`] leaves unset.
pub trait Resolver {
    fn strategy(&self) -> RunStrategy {
        RunStrategy::Throughput
    }

    fn launch_count(&self, _strategy: RunStrategy) -> u32 {
        1
    }

    fn iteration_time(&self) -> Duration {
        Duration::from_millis(500)
    }

    fn min_iteration_time(&self) -> Duration {
        Duration::from_millis(500)
    }

    fn unroll_factor(&self, strategy: RunStrategy) -> u64 {
        match strategy {
            RunStrategy::Throughput => 16,
            RunStrategy::ColdStart | RunStrategy::Monitoring => 1,
        }
    }

    fn min_invoke_count(&self) -> u64 {
        4
    }

    fn max_invoke_count(&self) -> u64 {
        MAX_INVOKE_COUNT
    }

    fn evaluate_overhead(&self, strategy: RunStrategy) -> bool {
        strategy == RunStrategy::Throughput
    }

    fn warmup_bounds(&self) -> (u32, u32) {
        (6, 50)
    }

    fn warmup_criterion(&self) -> WarmupCriterion {
        WarmupCriterion::Convergence
    }

    fn workload_bounds(&self) -> (u32, u32) {
        (15, 100)
    }

    fn overhead_bounds(&self) -> (u32, u32) {
        (15, 20)
    }

    fn max_relative_error(&self) -> f64 {
        0.02
    }

    fn max_absolute_error(&self) -> Option<Duration> {
        None
    }

    fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::L999
    }

    fn outlier_mode(&self) -> OutlierMode {
        OutlierMode::RemoveUpper
    }
}

/// The built-in defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

impl Resolver for DefaultResolver {}

/// Fully resolved, validated engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSettings {
    pub strategy: RunStrategy,
    pub launch_count: u32,
    /// Explicit invocation count; the Pilot stage is skipped when set.
    pub invocation_count: Option<u64>,
    pub unroll_factor: u64,
    /// Whether the unroll factor was set explicitly.
    pub unroll_factor_pinned: bool,
    pub iteration_time: Duration,
    pub pilot: PilotMode,
    pub min_invoke_count: u64,
    pub max_invoke_count: u64,
    pub evaluate_overhead: bool,
    pub warmup: StoppingCriterion,
    pub overhead_warmup: StoppingCriterion,
    pub workload_actual: StoppingCriterion,
    pub overhead_actual: StoppingCriterion,
    pub outlier_mode: OutlierMode,
    pub confidence_level: ConfidenceLevel,
}

impl EngineSettings {
    pub fn has_jit(&self) -> bool {
        self.strategy == RunStrategy::Throughput
    }

    pub fn has_pilot(&self) -> bool {
        self.strategy == RunStrategy::Throughput && self.invocation_count.is_none()
    }

    pub fn has_warmup(&self) -> bool {
        self.strategy != RunStrategy::ColdStart
    }

    /// Invocation count used when the Pilot stage does not run.
    pub fn fixed_invocation_count(&self) -> u64 {
        self.invocation_count.unwrap_or(self.unroll_factor)
    }
}

/// Optional durations as (fractional) milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        value
            .map(|d| d.as_secs_f64() * 1e3)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let millis = Option::<f64>::deserialize(deserializer)?;
        match millis {
            Some(ms) if !ms.is_finite() || ms < 0.0 => Err(serde::de::Error::custom(format!(
                "duration must be a non-negative number of milliseconds, got {}",
                ms
            ))),
            Some(ms) => Ok(Some(Duration::from_secs_f64(ms / 1e3))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resolution() {
        let settings = EngineConfig::default().resolve(&DefaultResolver).unwrap();

        assert_eq!(settings.strategy, RunStrategy::Throughput);
        assert_eq!(settings.launch_count, 1);
        assert_eq!(settings.unroll_factor, 16);
        assert!(!settings.unroll_factor_pinned);
        assert!(settings.evaluate_overhead);
        assert_eq!(settings.max_invoke_count, MAX_INVOKE_COUNT);
        assert_eq!(settings.outlier_mode, OutlierMode::RemoveUpper);
        assert_eq!(settings.confidence_level, ConfidenceLevel::L999);
        assert_eq!(
            settings.pilot,
            PilotMode::Accuracy {
                min_iteration_time: Duration::from_millis(500)
            }
        );
        assert_eq!(
            settings.workload_actual,
            StoppingCriterion::Convergence {
                min: 15,
                max: 100,
                max_relative_error: 0.02,
                max_absolute_error: None,
            }
        );
        assert!(settings.has_jit());
        assert!(settings.has_pilot());
    }

    #[test]
    fn test_explicit_iteration_time_selects_target_time_pilot() {
        let config = EngineConfig {
            iteration_time: Some(Duration::from_millis(100)),
            ..Default::default()
        };
        let settings = config.resolve(&DefaultResolver).unwrap();
        assert_eq!(
            settings.pilot,
            PilotMode::TargetTime {
                iteration_time: Duration::from_millis(100)
            }
        );
    }

    #[test]
    fn test_invocation_count_skips_pilot() {
        let config = EngineConfig {
            invocation_count: Some(10),
            ..Default::default()
        };
        let settings = config.resolve(&DefaultResolver).unwrap();

        assert!(!settings.has_pilot());
        // 10 is not a multiple of the default unroll factor
        assert_eq!(settings.unroll_factor, 1);
        assert_eq!(settings.fixed_invocation_count(), 10);
    }

    #[test]
    fn test_pinned_unroll_must_divide_invocation_count() {
        let config = EngineConfig {
            invocation_count: Some(10),
            unroll_factor: Some(4),
            ..Default::default()
        };
        assert_eq!(
            config.resolve(&DefaultResolver),
            Err(ConfigError::InvocationNotMultipleOfUnroll {
                invocation_count: 10,
                unroll_factor: 4
            })
        );
    }

    #[test]
    fn test_dry_preset() {
        let settings = EngineConfig::dry().resolve(&DefaultResolver).unwrap();

        assert_eq!(settings.strategy, RunStrategy::ColdStart);
        assert_eq!(settings.workload_actual, StoppingCriterion::Fixed(1));
        assert_eq!(settings.unroll_factor, 1);
        assert!(!settings.evaluate_overhead);
        assert!(!settings.has_jit());
        assert!(!settings.has_warmup());
    }

    #[test]
    fn test_monitoring_uses_fixed_count() {
        let config = EngineConfig {
            strategy: Some(RunStrategy::Monitoring),
            evaluate_overhead: Some(true),
            ..Default::default()
        };
        let settings = config.resolve(&DefaultResolver).unwrap();

        assert_eq!(
            settings.workload_actual,
            StoppingCriterion::Fixed(DEFAULT_WORKLOAD_COUNT)
        );
        assert!(!settings.evaluate_overhead);
        assert!(settings.has_warmup());
    }

    #[test]
    fn test_invalid_bounds() {
        let config = EngineConfig {
            min_warmup_count: Some(10),
            max_warmup_count: Some(5),
            ..Default::default()
        };
        assert_eq!(
            config.resolve(&DefaultResolver),
            Err(ConfigError::InvalidBounds {
                what: "warmup",
                min: 10,
                max: 5
            })
        );

        let only_max = EngineConfig {
            max_iteration_count: Some(5),
            ..Default::default()
        };
        let settings = only_max.resolve(&DefaultResolver).unwrap();
        assert!(matches!(
            settings.workload_actual,
            StoppingCriterion::Convergence { min: 5, max: 5, .. }
        ));
    }

    #[test]
    fn test_overhead_bounds_are_configurable() {
        let defaults = EngineConfig::default().resolve(&DefaultResolver).unwrap();
        assert!(matches!(
            defaults.overhead_warmup,
            StoppingCriterion::Fluctuation { min: 6, max: 10, .. }
        ));
        assert!(matches!(
            defaults.overhead_actual,
            StoppingCriterion::Convergence { min: 15, max: 20, .. }
        ));

        let config = EngineConfig {
            min_overhead_warmup_count: Some(2),
            max_overhead_warmup_count: Some(30),
            min_overhead_iteration_count: Some(5),
            max_overhead_iteration_count: Some(40),
            ..Default::default()
        };
        let settings = config.resolve(&DefaultResolver).unwrap();
        assert!(matches!(
            settings.overhead_warmup,
            StoppingCriterion::Fluctuation { min: 2, max: 30, .. }
        ));
        assert!(matches!(
            settings.overhead_actual,
            StoppingCriterion::Convergence { min: 5, max: 40, max_relative_error, .. }
                if max_relative_error == MAX_OVERHEAD_RELATIVE_ERROR
        ));
        // workload bounds are untouched
        assert!(matches!(
            settings.workload_actual,
            StoppingCriterion::Convergence { min: 15, max: 100, .. }
        ));

        let inverted = EngineConfig {
            min_overhead_iteration_count: Some(30),
            max_overhead_iteration_count: Some(10),
            ..Default::default()
        };
        assert_eq!(
            inverted.resolve(&DefaultResolver),
            Err(ConfigError::InvalidBounds {
                what: "overhead iteration",
                min: 30,
                max: 10
            })
        );
    }

    #[test]
    fn test_or_merges_overhead_bounds() {
        let merged = EngineConfig {
            max_overhead_iteration_count: Some(25),
            ..Default::default()
        }
        .or(EngineConfig {
            max_overhead_iteration_count: Some(50),
            min_overhead_warmup_count: Some(3),
            ..Default::default()
        });
        assert_eq!(merged.max_overhead_iteration_count, Some(25));
        assert_eq!(merged.min_overhead_warmup_count, Some(3));
    }

    #[test]
    fn test_invalid_relative_error() {
        let config = EngineConfig {
            max_relative_error: Some(0.0),
            ..Default::default()
        };
        assert_eq!(
            config.resolve(&DefaultResolver),
            Err(ConfigError::InvalidRelativeError(0.0))
        );
    }

    #[test]
    fn test_custom_resolver() {
        struct Quick;
        impl Resolver for Quick {
            fn workload_bounds(&self) -> (u32, u32) {
                (3, 5)
            }
            fn launch_count(&self, _strategy: RunStrategy) -> u32 {
                2
            }
        }

        let settings = EngineConfig::default().resolve(&Quick).unwrap();
        assert_eq!(settings.launch_count, 2);
        assert!(matches!(
            settings.workload_actual,
            StoppingCriterion::Convergence { min: 3, max: 5, .. }
        ));
    }

    #[test]
    fn test_or_prefers_self() {
        let cli = EngineConfig {
            launch_count: Some(3),
            ..Default::default()
        };
        let file = EngineConfig {
            launch_count: Some(1),
            warmup_count: Some(2),
            ..Default::default()
        };
        let merged = cli.or(file);
        assert_eq!(merged.launch_count, Some(3));
        assert_eq!(merged.warmup_count, Some(2));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("ColdStart".parse::<RunStrategy>().unwrap(), RunStrategy::ColdStart);
        assert_eq!("cold-start".parse::<RunStrategy>().unwrap(), RunStrategy::ColdStart);
        assert!("fast".parse::<RunStrategy>().is_err());
    }

    #[test]
    fn test_config_deserializes_milliseconds() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"iteration_time": 250.0, "launch_count": 2}"#).unwrap();
        assert_eq!(config.iteration_time, Some(Duration::from_millis(250)));
        assert_eq!(config.launch_count, Some(2));
        assert_eq!(config.unroll_factor, None);
    }
}
