//! Harness binary measuring a character counter at several input sizes.
//!
//! ```text
//! cargo run --release -p stagebench-harness --example char_count > base.log
//! stagebench summarize base.log
//! ```
//!
//! An optional first argument filters benchmarks by name.

use std::error::Error;
use std::hint::black_box;
use std::io;

use stagebench_harness::{
    run_harness, Benchmark, BenchmarkRegistry, CancellationToken, DefaultResolver, EngineConfig,
};

fn count_char(s: &str, c: char) -> usize {
    s.chars().filter(|&ch| ch == c).count()
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = std::env::args().nth(1);

    let mut registry = BenchmarkRegistry::new();
    for size in [100, 1000, 10000] {
        let input: String = "a".repeat(size);
        let name = format!("char_counting/count_char/{}", size);
        registry.register(Benchmark::new(name, move || {
            black_box(count_char(black_box(&input), 'a'));
        }));
    }

    let config = EngineConfig {
        launch_count: Some(3),
        ..EngineConfig::default()
    };
    let stdout = io::stdout();
    run_harness(
        &mut registry,
        &config,
        &DefaultResolver,
        filter.as_deref(),
        &mut stdout.lock(),
        &CancellationToken::new(),
    )?;
    Ok(())
}
