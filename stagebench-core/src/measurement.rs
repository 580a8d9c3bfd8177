//! Timing records and the per-iteration control data exchanged with the
//! invocation primitive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether a timed batch measures the invocation machinery alone or the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IterationMode {
    /// Dispatch and loop cost with an empty body; subtracted from workload timings.
    Overhead,
    /// The benchmarked workload.
    Workload,
}

impl IterationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IterationMode::Overhead => "Overhead",
            IterationMode::Workload => "Workload",
        }
    }
}

impl fmt::Display for IterationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IterationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Overhead" | "Idle" => Ok(IterationMode::Overhead),
            "Workload" | "Main" => Ok(IterationMode::Workload),
            other => Err(format!("unknown iteration mode '{}'", other)),
        }
    }
}

/// Pipeline phase a measurement was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IterationStage {
    Jit,
    Pilot,
    Warmup,
    Actual,
    /// Post-processed Actual measurements (overhead subtracted, outliers removed).
    Result,
}

impl IterationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IterationStage::Jit => "Jit",
            IterationStage::Pilot => "Pilot",
            IterationStage::Warmup => "Warmup",
            IterationStage::Actual => "Actual",
            IterationStage::Result => "Result",
        }
    }
}

impl fmt::Display for IterationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IterationStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Jit" | "Jitting" => Ok(IterationStage::Jit),
            "Pilot" => Ok(IterationStage::Pilot),
            "Warmup" => Ok(IterationStage::Warmup),
            "Actual" | "Target" => Ok(IterationStage::Actual),
            "Result" => Ok(IterationStage::Result),
            other => Err(format!("unknown iteration stage '{}'", other)),
        }
    }
}

/// Request for a single timed iteration, produced by the stage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationData {
    pub mode: IterationMode,
    pub stage: IterationStage,
    /// One-based index within the stage.
    pub index: u32,
    /// Number of logical workload calls in the timed batch.
    pub invoke_count: u64,
    /// Number of calls replicated per loop step; always divides `invoke_count`.
    pub unroll_factor: u64,
}

impl IterationData {
    pub fn new(
        mode: IterationMode,
        stage: IterationStage,
        index: u32,
        invoke_count: u64,
        unroll_factor: u64,
    ) -> Self {
        Self {
            mode,
            stage,
            index,
            invoke_count,
            unroll_factor,
        }
    }

    /// Number of outer loop steps the invoker performs.
    pub fn loop_count(&self) -> u64 {
        self.invoke_count / self.unroll_factor.max(1)
    }
}

/// Raw outcome of one timed batch as reported by the invocation primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub operations: u64,
    pub nanoseconds: f64,
}

impl Timing {
    pub fn new(operations: u64, nanoseconds: f64) -> Self {
        Self {
            operations,
            nanoseconds,
        }
    }
}

/// An immutable timing record.
///
/// The operation count is at least one and the duration is finite and never
/// negative; [`Measurement::new`] maps out-of-range durations to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    launch_index: u32,
    mode: IterationMode,
    stage: IterationStage,
    iteration_index: u32,
    operations: u64,
    nanoseconds: f64,
}

impl Measurement {
    pub fn new(
        launch_index: u32,
        mode: IterationMode,
        stage: IterationStage,
        iteration_index: u32,
        operations: u64,
        nanoseconds: f64,
    ) -> Self {
        let nanoseconds = if !nanoseconds.is_finite() || nanoseconds < 0.0 {
            0.0
        } else {
            nanoseconds
        };
        Self {
            launch_index,
            mode,
            stage,
            iteration_index,
            operations: operations.max(1),
            nanoseconds,
        }
    }

    /// Build the record for a completed iteration.
    pub fn from_iteration(launch_index: u32, data: &IterationData, timing: Timing) -> Self {
        Self::new(
            launch_index,
            data.mode,
            data.stage,
            data.index,
            timing.operations,
            timing.nanoseconds,
        )
    }

    pub fn launch_index(&self) -> u32 {
        self.launch_index
    }

    pub fn mode(&self) -> IterationMode {
        self.mode
    }

    pub fn stage(&self) -> IterationStage {
        self.stage
    }

    pub fn iteration_index(&self) -> u32 {
        self.iteration_index
    }

    pub fn operations(&self) -> u64 {
        self.operations
    }

    pub fn nanoseconds(&self) -> f64 {
        self.nanoseconds
    }

    /// Average duration of a single operation in nanoseconds.
    pub fn nanoseconds_per_op(&self) -> f64 {
        self.nanoseconds / self.operations as f64
    }

    pub fn is(&self, mode: IterationMode, stage: IterationStage) -> bool {
        self.mode == mode && self.stage == stage
    }

    /// Copy of this record relabelled with a different stage and duration.
    pub(crate) fn with_stage_and_nanoseconds(&self, stage: IterationStage, nanoseconds: f64) -> Self {
        Self::new(
            self.launch_index,
            self.mode,
            stage,
            self.iteration_index,
            self.operations,
            nanoseconds,
        )
    }
}
