//! Drives an [`Invoker`] through the stage pipeline of one launch.

use stagebench_core::measurement::{IterationMode, Measurement};
use stagebench_core::results::RunResults;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::clock::Clock;
use crate::config::{ConfigError, EngineConfig, EngineSettings, Resolver};
use crate::invoker::{InvokeError, Invoker};
use crate::stage::Pipeline;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("workload failed: {0}")]
    Workload(#[source] InvokeError),

    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Single-threaded, synchronous measurement engine.
#[derive(Debug, Clone)]
pub struct Engine {
    settings: EngineSettings,
    resolution_ns: f64,
}

impl Engine {
    pub fn new(settings: EngineSettings, resolution_ns: f64) -> Self {
        Self {
            settings,
            resolution_ns,
        }
    }

    pub fn from_config(
        config: &EngineConfig,
        resolver: &dyn Resolver,
        clock: &dyn Clock,
    ) -> Result<Self, EngineError> {
        let settings = config.resolve(resolver)?;
        Ok(Self::new(settings, clock.resolution_ns()))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run every stage once against `invoker`.
    ///
    /// Global setup runs before the first stage and global cleanup after
    /// the last one, also when a stage fails. A workload error aborts the
    /// run and is returned; a cancelled run returns what was measured so far.
    pub fn run(
        &self,
        invoker: &mut dyn Invoker,
        launch_index: u32,
        token: &CancellationToken,
    ) -> Result<RunResults, EngineError> {
        invoker.global_setup().map_err(EngineError::Workload)?;
        let outcome = self.run_stages(invoker, launch_index, token);
        let cleanup = invoker.global_cleanup();

        let (measurements, cancelled) = outcome?;
        cleanup.map_err(EngineError::Workload)?;

        Ok(RunResults::new(
            launch_index,
            measurements,
            self.settings.outlier_mode,
            cancelled,
        ))
    }

    fn run_stages(
        &self,
        invoker: &mut dyn Invoker,
        launch_index: u32,
        token: &CancellationToken,
    ) -> Result<(Vec<Measurement>, bool), EngineError> {
        let mut pipeline = Pipeline::new(self.settings.clone(), self.resolution_ns);
        let mut all = Vec::new();

        while let Some(mut stage) = pipeline.next_stage() {
            let mut measurements = Vec::new();
            let mut cancelled = false;

            while let Some(data) = stage.next_iteration(&measurements) {
                if token.is_cancelled() {
                    cancelled = true;
                    break;
                }

                let workload = data.mode == IterationMode::Workload;
                if workload {
                    invoker.iteration_setup().map_err(EngineError::Workload)?;
                }
                let timing = invoker.invoke(&data).map_err(EngineError::Workload)?;
                if workload {
                    invoker.iteration_cleanup().map_err(EngineError::Workload)?;
                }

                let measurement = Measurement::from_iteration(launch_index, &data, timing);
                debug!(
                    mode = %data.mode,
                    stage = %data.stage,
                    index = data.index,
                    invoke_count = data.invoke_count,
                    unroll_factor = data.unroll_factor,
                    ns = measurement.nanoseconds(),
                    "Iteration done"
                );
                measurements.push(measurement);
            }

            all.extend(measurements);
            if cancelled {
                warn!(
                    mode = %stage.mode(),
                    stage = %stage.stage(),
                    measurements = all.len(),
                    "Run cancelled"
                );
                return Ok((all, true));
            }

            info!(
                mode = %stage.mode(),
                stage = %stage.stage(),
                reason = %stage.stop_reason(),
                "Stage finished"
            );
            pipeline.complete(&stage);
        }

        let (invoke_count, unroll_factor) = pipeline.batching();
        info!(
            launch = launch_index,
            invoke_count,
            unroll_factor,
            measurements = all.len(),
            "Run finished"
        );
        Ok((all, false))
    }
}
