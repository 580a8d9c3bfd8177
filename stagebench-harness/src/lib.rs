//! In-process harness runtime for stagebench.
//!
//! Benchmarks are registered as closures, run through the staged
//! measurement engine and reported on a writer using the line protocol, so
//! that the `stagebench` CLI can summarize and compare the output.

pub mod benchmark;
pub mod cancel;
pub mod clock;
pub mod config;
pub mod engine;
pub mod invoker;
mod runner;
pub mod stage;

pub use benchmark::Benchmark;
pub use cancel::CancellationToken;
pub use clock::{Clock, InstantClock};
pub use config::{DefaultResolver, EngineConfig, EngineSettings, Resolver, RunStrategy};
pub use engine::{Engine, EngineError};
pub use invoker::{InvokeError, Invoker};
pub use runner::{run_harness, BenchmarkRun, HarnessError};

use std::collections::BTreeMap;

/// Registry of benchmarks, kept in name order.
pub struct BenchmarkRegistry {
    benchmarks: BTreeMap<String, Benchmark>,
}

impl BenchmarkRegistry {
    /// Create a new empty benchmark registry.
    pub fn new() -> Self {
        Self {
            benchmarks: BTreeMap::new(),
        }
    }

    /// Register a benchmark, replacing any previous one with the same name.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut registry = BenchmarkRegistry::new();
    /// registry.register(Benchmark::new("my_benchmark", || {
    ///     std::hint::black_box((0..100u32).sum::<u32>());
    /// }));
    /// ```
    pub fn register(&mut self, benchmark: Benchmark) {
        self.benchmarks.insert(benchmark.name().to_string(), benchmark);
    }

    /// List all registered benchmark names.
    pub fn list(&self) -> Vec<String> {
        self.benchmarks.keys().cloned().collect()
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Benchmark> {
        self.benchmarks.get_mut(name)
    }

    /// Registered benchmarks whose name contains `filter` (all when `None`).
    pub(crate) fn matching_mut<'a>(
        &'a mut self,
        filter: Option<&'a str>,
    ) -> impl Iterator<Item = &'a mut Benchmark> + 'a {
        self.benchmarks
            .values_mut()
            .filter(move |b| filter.map_or(true, |f| b.name().contains(f)))
    }

    /// Check if a benchmark with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.benchmarks.contains_key(name)
    }

    /// Get the number of registered benchmarks.
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }
}

impl Default for BenchmarkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
