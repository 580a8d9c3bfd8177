use stagebench_core::measurement::{IterationData, Timing};

/// Error raised by a workload or one of its hooks.
pub type InvokeError = Box<dyn std::error::Error + Send + Sync>;

/// The invocation primitive driven by the engine.
///
/// `invoke` must run exactly `data.invoke_count` calls of the requested mode
/// in `data.loop_count()` steps of `data.unroll_factor` calls and report the
/// elapsed time. The hooks are never called while a batch is being timed.
pub trait Invoker {
    /// Called once before the first stage.
    fn global_setup(&mut self) -> Result<(), InvokeError> {
        Ok(())
    }

    /// Called once after the last stage, also when a stage failed.
    fn global_cleanup(&mut self) -> Result<(), InvokeError> {
        Ok(())
    }

    /// Called before every workload iteration.
    fn iteration_setup(&mut self) -> Result<(), InvokeError> {
        Ok(())
    }

    /// Called after every workload iteration.
    fn iteration_cleanup(&mut self) -> Result<(), InvokeError> {
        Ok(())
    }

    fn invoke(&mut self, data: &IterationData) -> Result<Timing, InvokeError>;
}
