//! The stage state machine.
//!
//! A run is a fixed sequence of stages: Jit, Pilot, overhead Warmup and
//! Actual, workload Warmup and Actual. Each [`Stage`] is pulled for its next
//! iteration with the measurements it has produced so far and answers `None`
//! once it is done. [`Pipeline`] decides which stage comes next from the
//! outcome of the previous ones.

use std::time::Duration;

use serde::Serialize;
use stagebench_core::measurement::{IterationData, IterationMode, IterationStage, Measurement};
use stagebench_core::stats::{ConfidenceLevel, Statistics};

use crate::config::{EngineSettings, PilotMode};

const DEFAULT_MIN_FLUCTUATION_COUNT: u32 = 4;

/// Invocation counts below this grow by one in the accuracy pilot when nothing is unrolled.
const LINEAR_PILOT_LIMIT: u64 = 16;

/// Rule that ends a Warmup or Actual stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingCriterion {
    /// Exactly this many iterations.
    Fixed(u32),
    /// Stop once `min` iterations ran and the confidence interval half-width
    /// of the per-op mean is within the allowed error, or at `max`.
    Convergence {
        min: u32,
        max: u32,
        max_relative_error: f64,
        max_absolute_error: Option<Duration>,
    },
    /// Stop once `min` iterations ran and the timings changed direction at
    /// least `min_fluctuations` times, or at `max`.
    Fluctuation {
        min: u32,
        max: u32,
        min_fluctuations: u32,
    },
}

impl StoppingCriterion {
    pub fn fluctuation(min: u32, max: u32) -> Self {
        StoppingCriterion::Fluctuation {
            min,
            max,
            min_fluctuations: DEFAULT_MIN_FLUCTUATION_COUNT,
        }
    }

    /// Upper bound on the iterations this criterion can request.
    pub fn max_iterations(&self) -> u32 {
        match *self {
            StoppingCriterion::Fixed(n) => n,
            StoppingCriterion::Convergence { max, .. } | StoppingCriterion::Fluctuation { max, .. } => max,
        }
    }

    /// Reason the stage is finished, or `None` when more iterations are needed.
    pub fn evaluate(&self, measurements: &[Measurement], level: ConfidenceLevel) -> Option<String> {
        let n = measurements.len() as u32;
        match *self {
            StoppingCriterion::Fixed(count) => {
                (n >= count).then(|| format!("the fixed iteration count ({}) is reached", count))
            }
            StoppingCriterion::Convergence {
                min,
                max,
                max_relative_error,
                max_absolute_error,
            } => {
                if n >= max {
                    return Some(format!("the maximum iteration count ({}) is reached", max));
                }
                if n < min {
                    return None;
                }
                let stats = Statistics::with_confidence_level(
                    measurements.iter().map(Measurement::nanoseconds_per_op),
                    level,
                )
                .ok()?;
                let allowed = match max_absolute_error {
                    Some(abs) => (max_relative_error * stats.mean).min(abs.as_nanos() as f64),
                    None => max_relative_error * stats.mean,
                };
                let margin = stats.confidence_interval.margin;
                (margin <= allowed).then(|| {
                    format!(
                        "the error ({:.4} ns) is within {:.4} ns after {} iterations",
                        margin, allowed, n
                    )
                })
            }
            StoppingCriterion::Fluctuation {
                min,
                max,
                min_fluctuations,
            } => {
                if n >= max {
                    return Some(format!("the maximum iteration count ({}) is reached", max));
                }
                if n < min {
                    return None;
                }
                let fluctuations = count_fluctuations(measurements);
                (fluctuations >= min_fluctuations).then(|| {
                    format!(
                        "{} fluctuations observed after {} iterations",
                        fluctuations, n
                    )
                })
            }
        }
    }
}

/// Direction changes between consecutive timings; a flat step always counts.
fn count_fluctuations(measurements: &[Measurement]) -> u32 {
    // Start out "decreasing".
    let mut direction = -1.0;
    let mut count = 0;
    for pair in measurements.windows(2) {
        let diff = pair[1].nanoseconds() - pair[0].nanoseconds();
        let next = if diff > 0.0 {
            1.0
        } else if diff < 0.0 {
            -1.0
        } else {
            0.0
        };
        if next != direction || next == 0.0 {
            direction = next;
            count += 1;
        }
    }
    count
}

/// Round `count` up to a multiple of `unroll_factor`.
pub fn autocorrect(count: u64, unroll_factor: u64) -> u64 {
    count.div_ceil(unroll_factor) * unroll_factor
}

/// Warm-up calls outside any timed sample.
#[derive(Debug, Clone)]
pub struct JitStage {
    plan: Vec<IterationData>,
    iteration_time_ns: f64,
    may_stop_early: bool,
    stopped_early: bool,
}

impl JitStage {
    /// `may_stop_early` allows the stage to give up on batching when one
    /// call already exceeds the iteration time.
    pub fn new(
        evaluate_overhead: bool,
        unroll_factor: u64,
        iteration_time: Duration,
        may_stop_early: bool,
    ) -> Self {
        let mut plan = Vec::with_capacity(3);
        if evaluate_overhead {
            plan.push((IterationMode::Overhead, 1, 1));
        }
        plan.push((IterationMode::Workload, 1, 1));
        if unroll_factor > 1 {
            plan.push((IterationMode::Workload, unroll_factor, unroll_factor));
        }
        let plan = plan
            .into_iter()
            .enumerate()
            .map(|(i, (mode, invoke, unroll))| {
                IterationData::new(mode, IterationStage::Jit, i as u32 + 1, invoke, unroll)
            })
            .collect();
        Self {
            plan,
            iteration_time_ns: iteration_time.as_nanos() as f64,
            may_stop_early,
            stopped_early: false,
        }
    }

    fn next_iteration(&mut self, measurements: &[Measurement]) -> Option<IterationData> {
        if let Some(last) = measurements.last() {
            if self.may_stop_early
                && last.mode() == IterationMode::Workload
                && last.operations() == 1
                && last.nanoseconds() > self.iteration_time_ns
            {
                self.stopped_early = true;
                return None;
            }
        }
        self.plan.get(measurements.len()).copied()
    }

    /// Whether a single call took longer than the iteration time.
    pub fn stopped_early(&self) -> bool {
        self.stopped_early
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PilotRule {
    TargetTime { target_ns: f64, down_count: u32 },
    Accuracy {
        resolution_ns: f64,
        max_relative_error: f64,
        max_absolute_error_ns: f64,
        min_iteration_ns: f64,
    },
}

/// Searches for the invocation count of one timed iteration.
#[derive(Debug, Clone)]
pub struct PilotStage {
    rule: PilotRule,
    unroll_factor: u64,
    min_invoke_count: u64,
    max_invoke_count: u64,
    invoke_count: u64,
    finished: bool,
}

impl PilotStage {
    pub fn new(settings: &EngineSettings, unroll_factor: u64, resolution_ns: f64) -> Self {
        let rule = match settings.pilot {
            PilotMode::TargetTime { iteration_time } => PilotRule::TargetTime {
                target_ns: iteration_time.as_nanos() as f64,
                down_count: 0,
            },
            PilotMode::Accuracy { min_iteration_time } => PilotRule::Accuracy {
                resolution_ns,
                max_relative_error: workload_relative_error(settings),
                max_absolute_error_ns: workload_absolute_error(settings)
                    .map(|d| d.as_nanos() as f64)
                    .unwrap_or(f64::MAX),
                min_iteration_ns: min_iteration_time.as_nanos() as f64,
            },
        };
        let max_invoke_count = settings.max_invoke_count.max(unroll_factor);
        Self {
            rule,
            unroll_factor,
            min_invoke_count: settings.min_invoke_count,
            max_invoke_count,
            invoke_count: autocorrect(settings.min_invoke_count, unroll_factor).min(max_invoke_count),
            finished: false,
        }
    }

    fn next_iteration(&mut self, measurements: &[Measurement]) -> Option<IterationData> {
        if self.finished {
            return None;
        }
        if let Some(last) = measurements.last() {
            match self.next_invoke_count(last.nanoseconds()) {
                Some(next) => self.invoke_count = next,
                None => {
                    self.finished = true;
                    return None;
                }
            }
        }
        Some(IterationData::new(
            IterationMode::Workload,
            IterationStage::Pilot,
            measurements.len() as u32 + 1,
            self.invoke_count,
            self.unroll_factor,
        ))
    }

    /// Next invocation count after an iteration of `actual_ns`, or `None` to stop.
    fn next_invoke_count(&mut self, actual_ns: f64) -> Option<u64> {
        let invoke_count = self.invoke_count;
        if invoke_count >= self.max_invoke_count {
            return None;
        }
        match &mut self.rule {
            PilotRule::TargetTime {
                target_ns,
                down_count,
            } => {
                let scaled = if actual_ns > 0.0 {
                    (invoke_count as f64 * *target_ns / actual_ns).round() as u64
                } else {
                    invoke_count.saturating_mul(2)
                };
                let next = autocorrect(
                    scaled.max(self.min_invoke_count).min(self.max_invoke_count),
                    self.unroll_factor,
                );
                if next < invoke_count {
                    *down_count += 1;
                }
                if next.abs_diff(invoke_count) <= 1 || *down_count >= 3 {
                    return None;
                }
                Some(next)
            }
            PilotRule::Accuracy {
                resolution_ns,
                max_relative_error,
                max_absolute_error_ns,
                min_iteration_ns,
            } => {
                let operation_error = 2.0 * *resolution_ns / invoke_count as f64;
                let allowed = (actual_ns / invoke_count as f64 * *max_relative_error)
                    .min(*max_absolute_error_ns);
                if operation_error < allowed && actual_ns >= *min_iteration_ns {
                    return None;
                }
                let next = if self.unroll_factor == 1 && invoke_count < LINEAR_PILOT_LIMIT {
                    invoke_count + 1
                } else {
                    invoke_count.saturating_mul(2)
                };
                Some(next.min(self.max_invoke_count))
            }
        }
    }

    /// The chosen invocation count; final once the stage is done.
    pub fn invoke_count(&self) -> u64 {
        self.invoke_count
    }
}

fn workload_relative_error(settings: &EngineSettings) -> f64 {
    match settings.workload_actual {
        StoppingCriterion::Convergence {
            max_relative_error, ..
        } => max_relative_error,
        _ => 0.02,
    }
}

fn workload_absolute_error(settings: &EngineSettings) -> Option<Duration> {
    match settings.workload_actual {
        StoppingCriterion::Convergence {
            max_absolute_error, ..
        } => max_absolute_error,
        _ => None,
    }
}

/// A Warmup or Actual stage running one batch per iteration until its criterion holds.
#[derive(Debug, Clone)]
pub struct MeasurementStage {
    mode: IterationMode,
    stage: IterationStage,
    criterion: StoppingCriterion,
    level: ConfidenceLevel,
    invoke_count: u64,
    unroll_factor: u64,
    stop_reason: Option<String>,
}

impl MeasurementStage {
    pub fn new(
        mode: IterationMode,
        stage: IterationStage,
        criterion: StoppingCriterion,
        level: ConfidenceLevel,
        invoke_count: u64,
        unroll_factor: u64,
    ) -> Self {
        Self {
            mode,
            stage,
            criterion,
            level,
            invoke_count,
            unroll_factor,
            stop_reason: None,
        }
    }

    fn next_iteration(&mut self, measurements: &[Measurement]) -> Option<IterationData> {
        if let Some(reason) = self.criterion.evaluate(measurements, self.level) {
            self.stop_reason = Some(reason);
            return None;
        }
        Some(IterationData::new(
            self.mode,
            self.stage,
            measurements.len() as u32 + 1,
            self.invoke_count,
            self.unroll_factor,
        ))
    }

    pub fn criterion(&self) -> StoppingCriterion {
        self.criterion
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }
}

/// One stage of a run.
#[derive(Debug, Clone)]
pub enum Stage {
    Jit(JitStage),
    Pilot(PilotStage),
    Measure(MeasurementStage),
}

impl Stage {
    /// The next iteration to time given this stage's measurements, or `None` when done.
    pub fn next_iteration(&mut self, measurements: &[Measurement]) -> Option<IterationData> {
        match self {
            Stage::Jit(stage) => stage.next_iteration(measurements),
            Stage::Pilot(stage) => stage.next_iteration(measurements),
            Stage::Measure(stage) => stage.next_iteration(measurements),
        }
    }

    pub fn mode(&self) -> IterationMode {
        match self {
            Stage::Jit(_) | Stage::Pilot(_) => IterationMode::Workload,
            Stage::Measure(stage) => stage.mode,
        }
    }

    pub fn stage(&self) -> IterationStage {
        match self {
            Stage::Jit(_) => IterationStage::Jit,
            Stage::Pilot(_) => IterationStage::Pilot,
            Stage::Measure(stage) => stage.stage,
        }
    }

    /// Human-readable summary of why the stage ended.
    pub fn stop_reason(&self) -> String {
        match self {
            Stage::Jit(stage) if stage.stopped_early() => {
                "a single invocation exceeded the iteration time".to_string()
            }
            Stage::Jit(_) => "all warm-up calls done".to_string(),
            Stage::Pilot(stage) => format!("invocation count {} selected", stage.invoke_count()),
            Stage::Measure(stage) => stage
                .stop_reason()
                .unwrap_or("stopped before its criterion was met")
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Jit,
    Pilot,
    OverheadWarmup,
    OverheadActual,
    WorkloadWarmup,
    WorkloadActual,
    Done,
}

/// Decides the stage sequence and carries batching decisions between stages.
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: EngineSettings,
    resolution_ns: f64,
    step: Step,
    invoke_count: u64,
    unroll_factor: u64,
    evaluate_overhead: bool,
    run_pilot: bool,
}

impl Pipeline {
    pub fn new(settings: EngineSettings, resolution_ns: f64) -> Self {
        let invoke_count = settings.fixed_invocation_count();
        let unroll_factor = settings.unroll_factor;
        let evaluate_overhead = settings.evaluate_overhead;
        let run_pilot = settings.has_pilot();
        let step = if settings.has_jit() {
            Step::Jit
        } else if settings.has_warmup() {
            Step::WorkloadWarmup
        } else {
            Step::WorkloadActual
        };
        Self {
            settings,
            resolution_ns,
            step,
            invoke_count,
            unroll_factor,
            evaluate_overhead,
            run_pilot,
        }
    }

    /// Batching for the Warmup and Actual stages: `(invoke_count, unroll_factor)`.
    pub fn batching(&self) -> (u64, u64) {
        (self.invoke_count, self.unroll_factor)
    }

    pub fn evaluates_overhead(&self) -> bool {
        self.evaluate_overhead
    }

    fn measure(&self, mode: IterationMode, stage: IterationStage, criterion: StoppingCriterion) -> Stage {
        Stage::Measure(MeasurementStage::new(
            mode,
            stage,
            criterion,
            self.settings.confidence_level,
            self.invoke_count,
            self.unroll_factor,
        ))
    }

    /// The next stage to run, or `None` when the run is complete.
    pub fn next_stage(&mut self) -> Option<Stage> {
        loop {
            let step = self.step;
            let stage = match step {
                Step::Jit => {
                    self.step = Step::Pilot;
                    let may_stop_early =
                        !self.settings.unroll_factor_pinned && self.settings.invocation_count.is_none();
                    Some(Stage::Jit(JitStage::new(
                        self.evaluate_overhead,
                        self.unroll_factor,
                        self.settings.iteration_time,
                        may_stop_early,
                    )))
                }
                Step::Pilot => {
                    self.step = Step::OverheadWarmup;
                    self.run_pilot.then(|| {
                        Stage::Pilot(PilotStage::new(
                            &self.settings,
                            self.unroll_factor,
                            self.resolution_ns,
                        ))
                    })
                }
                Step::OverheadWarmup => {
                    self.step = Step::OverheadActual;
                    self.evaluate_overhead.then(|| {
                        self.measure(
                            IterationMode::Overhead,
                            IterationStage::Warmup,
                            self.settings.overhead_warmup,
                        )
                    })
                }
                Step::OverheadActual => {
                    self.step = Step::WorkloadWarmup;
                    self.evaluate_overhead.then(|| {
                        self.measure(
                            IterationMode::Overhead,
                            IterationStage::Actual,
                            self.settings.overhead_actual,
                        )
                    })
                }
                Step::WorkloadWarmup => {
                    self.step = Step::WorkloadActual;
                    Some(self.measure(
                        IterationMode::Workload,
                        IterationStage::Warmup,
                        self.settings.warmup,
                    ))
                }
                Step::WorkloadActual => {
                    self.step = Step::Done;
                    Some(self.measure(
                        IterationMode::Workload,
                        IterationStage::Actual,
                        self.settings.workload_actual,
                    ))
                }
                Step::Done => return None,
            };
            if stage.is_some() {
                return stage;
            }
        }
    }

    /// Record the outcome of a finished stage.
    pub fn complete(&mut self, stage: &Stage) {
        match stage {
            Stage::Jit(jit) if jit.stopped_early() => {
                self.invoke_count = 1;
                self.unroll_factor = 1;
                self.evaluate_overhead = false;
                self.run_pilot = false;
            }
            Stage::Pilot(pilot) => self.invoke_count = pilot.invoke_count(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DefaultResolver, EngineConfig, RunStrategy};

    fn settings(config: EngineConfig) -> EngineSettings {
        config.resolve(&DefaultResolver).unwrap()
    }

    /// Drive a stage with synthetic timings instead of a real invoker.
    fn drive(stage: &mut Stage, mut timing: impl FnMut(&IterationData) -> f64) -> Vec<Measurement> {
        let mut measurements = Vec::new();
        while let Some(data) = stage.next_iteration(&measurements) {
            assert!(measurements.len() < 10_000, "stage did not terminate");
            let ns = timing(&data);
            measurements.push(Measurement::new(
                0,
                data.mode,
                data.stage,
                data.index,
                data.invoke_count,
                ns,
            ));
        }
        measurements
    }

    fn actual(criterion: StoppingCriterion) -> Stage {
        Stage::Measure(MeasurementStage::new(
            IterationMode::Workload,
            IterationStage::Actual,
            criterion,
            ConfidenceLevel::L999,
            16,
            16,
        ))
    }

    fn convergence(min: u32, max: u32) -> StoppingCriterion {
        StoppingCriterion::Convergence {
            min,
            max,
            max_relative_error: 0.02,
            max_absolute_error: None,
        }
    }

    #[test]
    fn test_steady_workload_stops_at_min() {
        for criterion in [
            convergence(15, 100),
            convergence(6, 50),
            StoppingCriterion::fluctuation(6, 50),
        ] {
            let mut stage = actual(criterion);
            let measurements = drive(&mut stage, |_| 1600.0);
            let min = match criterion {
                StoppingCriterion::Convergence { min, .. } | StoppingCriterion::Fluctuation { min, .. } => min,
                StoppingCriterion::Fixed(n) => n,
            };
            assert_eq!(measurements.len(), min as usize, "{:?}", criterion);
        }
    }

    #[test]
    fn test_growing_workload_stops_at_max() {
        for criterion in [
            convergence(15, 100),
            convergence(6, 50),
            StoppingCriterion::fluctuation(6, 50),
        ] {
            let mut stage = actual(criterion);
            let measurements = drive(&mut stage, |data| 1000.0 * data.index as f64);
            assert_eq!(
                measurements.len(),
                criterion.max_iterations() as usize,
                "{:?}",
                criterion
            );
        }
    }

    #[test]
    fn test_fixed_criterion() {
        let mut stage = actual(StoppingCriterion::Fixed(7));
        assert_eq!(drive(&mut stage, |_| 10.0).len(), 7);

        let mut empty = actual(StoppingCriterion::Fixed(0));
        assert!(drive(&mut empty, |_| 10.0).is_empty());
    }

    #[test]
    fn test_iterations_are_numbered_from_one() {
        let mut stage = actual(StoppingCriterion::Fixed(3));
        let measurements = drive(&mut stage, |_| 10.0);
        let indices: Vec<u32> = measurements.iter().map(|m| m.iteration_index()).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(stage.stop_reason().contains("fixed iteration count"));
    }

    #[test]
    fn test_fluctuation_counting() {
        let make = |values: &[f64]| -> Vec<Measurement> {
            values
                .iter()
                .map(|&v| Measurement::new(0, IterationMode::Workload, IterationStage::Warmup, 1, 1, v))
                .collect()
        };
        assert_eq!(count_fluctuations(&make(&[5.0, 4.0, 3.0, 2.0])), 0);
        assert_eq!(count_fluctuations(&make(&[1.0, 2.0, 3.0, 4.0])), 1);
        assert_eq!(count_fluctuations(&make(&[1.0, 2.0, 1.0, 2.0, 1.0])), 4);
        assert_eq!(count_fluctuations(&make(&[1.0, 1.0, 1.0])), 2);
    }

    #[test]
    fn test_autocorrect() {
        assert_eq!(autocorrect(4, 16), 16);
        assert_eq!(autocorrect(16, 16), 16);
        assert_eq!(autocorrect(17, 16), 32);
        assert_eq!(autocorrect(5, 1), 5);
    }

    #[test]
    fn test_jit_iterations() {
        let mut stage = Stage::Jit(JitStage::new(true, 16, Duration::from_millis(500), true));
        let measurements = drive(&mut stage, |_| 100.0);

        let plan: Vec<(IterationMode, u64)> = measurements
            .iter()
            .map(|m| (m.mode(), m.operations()))
            .collect();
        assert_eq!(
            plan,
            vec![
                (IterationMode::Overhead, 1),
                (IterationMode::Workload, 1),
                (IterationMode::Workload, 16),
            ]
        );
    }

    #[test]
    fn test_slow_jit_stops_early() {
        let mut jit = JitStage::new(false, 16, Duration::from_millis(1), true);
        let mut stage = Stage::Jit(jit.clone());
        let measurements = drive(&mut stage, |_| 5e6);
        assert_eq!(measurements.len(), 1);
        assert!(matches!(&stage, Stage::Jit(j) if j.stopped_early()));

        // Without permission to stop early every call runs.
        jit.may_stop_early = false;
        let mut stage = Stage::Jit(jit);
        assert_eq!(drive(&mut stage, |_| 5e6).len(), 2);
    }

    #[test]
    fn test_target_time_pilot_converges() {
        let settings = settings(EngineConfig {
            iteration_time: Some(Duration::from_micros(100)),
            ..Default::default()
        });
        let mut stage = Stage::Pilot(PilotStage::new(&settings, 16, 1.0));
        // 10 ns per call
        let measurements = drive(&mut stage, |data| data.invoke_count as f64 * 10.0);

        let Stage::Pilot(pilot) = &stage else {
            unreachable!()
        };
        assert_eq!(pilot.invoke_count(), 10_000);
        assert_eq!(pilot.invoke_count() % 16, 0);
        assert!(measurements.len() <= 3);
    }

    #[test]
    fn test_accuracy_pilot_grows_until_long_enough() {
        let settings = settings(EngineConfig {
            min_iteration_time: Some(Duration::from_micros(10)),
            ..Default::default()
        });
        let mut stage = Stage::Pilot(PilotStage::new(&settings, 16, 1.0));
        let _ = drive(&mut stage, |data| data.invoke_count as f64 * 10.0);

        let Stage::Pilot(pilot) = &stage else {
            unreachable!()
        };
        // 16, 32, ... doubling until 10 us at 10 ns per call
        assert_eq!(pilot.invoke_count(), 1024);
    }

    #[test]
    fn test_accuracy_pilot_linear_growth_without_unroll() {
        let settings = settings(EngineConfig {
            min_iteration_time: Some(Duration::from_nanos(60)),
            unroll_factor: Some(1),
            ..Default::default()
        });
        let mut stage = Stage::Pilot(PilotStage::new(&settings, 1, 0.01));
        let measurements = drive(&mut stage, |data| data.invoke_count as f64 * 10.0);
        let counts: Vec<u64> = measurements.iter().map(|m| m.operations()).collect();
        assert_eq!(counts, vec![4, 5, 6]);
    }

    #[test]
    fn test_pilot_terminates_on_zero_cost_workload() {
        let settings = settings(EngineConfig {
            iteration_time: Some(Duration::from_millis(500)),
            ..Default::default()
        });
        let mut stage = Stage::Pilot(PilotStage::new(&settings, 16, 1.0));
        let measurements = drive(&mut stage, |_| 0.0);

        let Stage::Pilot(pilot) = &stage else {
            unreachable!()
        };
        assert_eq!(pilot.invoke_count() % 16, 0);
        assert!(pilot.invoke_count() <= settings.max_invoke_count);
        assert!(measurements.len() < 70);
    }

    fn stage_sequence(settings: EngineSettings) -> Vec<(IterationMode, IterationStage)> {
        let mut pipeline = Pipeline::new(settings, 1.0);
        let mut sequence = Vec::new();
        while let Some(mut stage) = pipeline.next_stage() {
            sequence.push((stage.mode(), stage.stage()));
            let _ = drive(&mut stage, |data| data.invoke_count as f64 * 10.0);
            pipeline.complete(&stage);
        }
        sequence
    }

    #[test]
    fn test_throughput_sequence() {
        let sequence = stage_sequence(settings(EngineConfig {
            iteration_time: Some(Duration::from_micros(100)),
            ..Default::default()
        }));
        assert_eq!(
            sequence,
            vec![
                (IterationMode::Workload, IterationStage::Jit),
                (IterationMode::Workload, IterationStage::Pilot),
                (IterationMode::Overhead, IterationStage::Warmup),
                (IterationMode::Overhead, IterationStage::Actual),
                (IterationMode::Workload, IterationStage::Warmup),
                (IterationMode::Workload, IterationStage::Actual),
            ]
        );
    }

    #[test]
    fn test_cold_start_sequence() {
        let sequence = stage_sequence(settings(EngineConfig {
            strategy: Some(RunStrategy::ColdStart),
            ..Default::default()
        }));
        assert_eq!(sequence, vec![(IterationMode::Workload, IterationStage::Actual)]);
    }

    #[test]
    fn test_monitoring_sequence() {
        let sequence = stage_sequence(settings(EngineConfig {
            strategy: Some(RunStrategy::Monitoring),
            ..Default::default()
        }));
        assert_eq!(
            sequence,
            vec![
                (IterationMode::Workload, IterationStage::Warmup),
                (IterationMode::Workload, IterationStage::Actual),
            ]
        );
    }

    #[test]
    fn test_invocation_count_skips_pilot() {
        let cfg = settings(EngineConfig {
            invocation_count: Some(64),
            evaluate_overhead: Some(false),
            ..Default::default()
        });
        let mut pipeline = Pipeline::new(cfg.clone(), 1.0);
        let sequence = stage_sequence(cfg);
        assert!(!sequence.iter().any(|(_, s)| *s == IterationStage::Pilot));
        assert_eq!(pipeline.batching(), (64, 16));
        assert!(pipeline.next_stage().is_some());
    }

    #[test]
    fn test_slow_jit_disables_pilot_and_overhead() {
        let cfg = settings(EngineConfig::default());
        let mut pipeline = Pipeline::new(cfg, 1.0);

        let mut jit = pipeline.next_stage().unwrap();
        let _ = drive(&mut jit, |_| 1e9);
        pipeline.complete(&jit);

        assert_eq!(pipeline.batching(), (1, 1));
        assert!(!pipeline.evaluates_overhead());
        let next = pipeline.next_stage().unwrap();
        assert_eq!(next.stage(), IterationStage::Warmup);
        assert_eq!(next.mode(), IterationMode::Workload);
    }
}
