//! Runs every registered benchmark and writes line-protocol output.

use std::io::{self, Write};

use stagebench_core::protocol::{benchmark_header, format_line, launch_header};
use stagebench_core::results::RunResults;
use thiserror::Error;
use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::config::{EngineConfig, Resolver};
use crate::engine::{Engine, EngineError};
use crate::BenchmarkRegistry;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("benchmark '{name}' failed: {source}")]
    Benchmark {
        name: String,
        #[source]
        source: EngineError,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Every launch of one benchmark.
#[derive(Debug, Clone)]
pub struct BenchmarkRun {
    pub name: String,
    pub launches: Vec<RunResults>,
}

/// Run the benchmarks whose name contains `filter` (all when `None`).
///
/// Each benchmark gets a `// Benchmark:` header, every launch a
/// `// Launch:` header, followed by one line per measurement. The first
/// failing benchmark stops the harness; cancellation stops after the
/// current iteration and returns everything measured so far.
pub fn run_harness(
    registry: &mut BenchmarkRegistry,
    config: &EngineConfig,
    resolver: &dyn Resolver,
    filter: Option<&str>,
    out: &mut impl Write,
    token: &CancellationToken,
) -> Result<Vec<BenchmarkRun>, HarnessError> {
    let mut runs = Vec::new();

    for benchmark in registry.matching_mut(filter) {
        let name = benchmark.name().to_string();
        let failed = |source: EngineError| HarnessError::Benchmark {
            name: name.clone(),
            source,
        };

        let engine = Engine::from_config(config, resolver, benchmark.clock()).map_err(failed)?;
        let frequency = benchmark.clock().frequency_hz();
        info!(benchmark = %name, launches = engine.settings().launch_count, "Running benchmark");
        writeln!(out, "{}", benchmark_header(&name))?;

        let mut launches = Vec::new();
        for launch in 0..engine.settings().launch_count {
            writeln!(out, "{}", launch_header(launch))?;
            let results = engine
                .run(&mut *benchmark, launch, token)
                .map_err(failed)?;
            for measurement in results.measurements() {
                writeln!(out, "{}", format_line(measurement, frequency))?;
            }
            let cancelled = results.is_cancelled();
            launches.push(results);
            if cancelled {
                break;
            }
        }
        out.flush()?;

        runs.push(BenchmarkRun { name, launches });
        if token.is_cancelled() {
            warn!("Harness cancelled, skipping remaining benchmarks");
            break;
        }
    }

    Ok(runs)
}
