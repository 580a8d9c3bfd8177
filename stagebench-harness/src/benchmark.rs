use std::fmt;
use std::hint::black_box;
use std::sync::Arc;

use stagebench_core::measurement::{IterationData, IterationMode, Timing};

use crate::clock::{Clock, InstantClock};
use crate::invoker::{InvokeError, Invoker};

type Workload = Box<dyn FnMut() -> Result<(), InvokeError> + Send>;
type Hook = Box<dyn FnMut() -> Result<(), InvokeError> + Send>;

/// A named workload closure with optional lifecycle hooks.
///
/// Overhead iterations call an empty closure through the same boxed
/// indirection so that the dispatch cost subtracted later matches the one
/// paid by the workload.
pub struct Benchmark {
    name: String,
    workload: Workload,
    overhead: Workload,
    global_setup: Option<Hook>,
    global_cleanup: Option<Hook>,
    iteration_setup: Option<Hook>,
    iteration_cleanup: Option<Hook>,
    clock: Arc<dyn Clock>,
}

impl Benchmark {
    /// # Example
    ///
    /// ```ignore
    /// let bench = Benchmark::new("sum_1k", || {
    ///     black_box((0..1000u64).sum::<u64>());
    /// });
    /// ```
    pub fn new<F>(name: impl Into<String>, mut f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::try_new(name, move || {
            f();
            Ok(())
        })
    }

    /// A workload that may fail; the first error aborts the engine run.
    pub fn try_new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut() -> Result<(), InvokeError> + Send + 'static,
    {
        Self {
            name: name.into(),
            workload: Box::new(f),
            overhead: Box::new(|| Ok(())),
            global_setup: None,
            global_cleanup: None,
            iteration_setup: None,
            iteration_cleanup: None,
            clock: Arc::new(InstantClock::new()),
        }
    }

    pub fn with_global_setup<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> Result<(), InvokeError> + Send + 'static,
    {
        self.global_setup = Some(Box::new(f));
        self
    }

    pub fn with_global_cleanup<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> Result<(), InvokeError> + Send + 'static,
    {
        self.global_cleanup = Some(Box::new(f));
        self
    }

    pub fn with_iteration_setup<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> Result<(), InvokeError> + Send + 'static,
    {
        self.iteration_setup = Some(Box::new(f));
        self
    }

    pub fn with_iteration_cleanup<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> Result<(), InvokeError> + Send + 'static,
    {
        self.iteration_cleanup = Some(Box::new(f));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

fn run_hook(hook: &mut Option<Hook>) -> Result<(), InvokeError> {
    match hook {
        Some(f) => f(),
        None => Ok(()),
    }
}

impl Invoker for Benchmark {
    fn global_setup(&mut self) -> Result<(), InvokeError> {
        run_hook(&mut self.global_setup)
    }

    fn global_cleanup(&mut self) -> Result<(), InvokeError> {
        run_hook(&mut self.global_cleanup)
    }

    fn iteration_setup(&mut self) -> Result<(), InvokeError> {
        run_hook(&mut self.iteration_setup)
    }

    fn iteration_cleanup(&mut self) -> Result<(), InvokeError> {
        run_hook(&mut self.iteration_cleanup)
    }

    fn invoke(&mut self, data: &IterationData) -> Result<Timing, InvokeError> {
        let body = match data.mode {
            IterationMode::Overhead => &mut self.overhead,
            IterationMode::Workload => &mut self.workload,
        };
        let unroll = data.unroll_factor.max(1);
        let loops = data.loop_count();

        let start = self.clock.now_ns();
        for _ in 0..loops {
            for _ in 0..unroll {
                black_box(&mut *body)()?;
            }
        }
        let elapsed = self.clock.now_ns().saturating_sub(start);

        Ok(Timing::new(loops * unroll, elapsed as f64))
    }
}

impl fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Benchmark")
            .field("name", &self.name)
            .field("global_setup", &self.global_setup.is_some())
            .field("global_cleanup", &self.global_cleanup.is_some())
            .field("iteration_setup", &self.iteration_setup.is_some())
            .field("iteration_cleanup", &self.iteration_cleanup.is_some())
            .finish()
    }
}
