//! Folding line-protocol logs back into per-benchmark measurement streams.

use std::collections::BTreeMap;

use stagebench_core::protocol::{parse_log_line, LogLine};
use stagebench_core::Measurement;

/// Every measurement recorded for one benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkLog {
    pub name: String,
    pub measurements: Vec<Measurement>,
}

/// Collects benchmarks across any number of log texts.
///
/// A benchmark seen again (later in the same text or in another file) is
/// treated as further launches of the same benchmark, so its launch
/// indices are shifted past the ones already collected.
#[derive(Debug, Default)]
pub struct LogCollector {
    logs: Vec<BenchmarkLog>,
    next_launch: BTreeMap<String, u32>,
}

impl LogCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one log text. Measurements before any `// Benchmark:` header
    /// belong to `default_name`.
    pub fn feed(&mut self, text: &str, default_name: &str) {
        let mut current: Option<usize> = None;
        // headerless lines continue after the default benchmark's launches
        let mut offset = self.next_launch.get(default_name).copied().unwrap_or(0);
        let mut launch = 0;

        for line in text.lines() {
            match parse_log_line(line, offset + launch) {
                Some(LogLine::Benchmark(name)) => {
                    offset = self.next_launch.get(&name).copied().unwrap_or(0);
                    launch = 0;
                    current = Some(self.index_of(&name));
                }
                Some(LogLine::Launch(index)) => launch = index,
                Some(LogLine::Measurement(measurement)) => {
                    let index = match current {
                        Some(index) => index,
                        None => {
                            let index = self.index_of(default_name);
                            current = Some(index);
                            index
                        }
                    };
                    self.record(index, measurement);
                }
                None => {}
            }
        }
    }

    pub fn finish(self) -> Vec<BenchmarkLog> {
        self.logs
    }

    fn index_of(&mut self, name: &str) -> usize {
        match self.logs.iter().position(|log| log.name == name) {
            Some(index) => index,
            None => {
                self.logs.push(BenchmarkLog {
                    name: name.to_string(),
                    measurements: Vec::new(),
                });
                self.logs.len() - 1
            }
        }
    }

    fn record(&mut self, index: usize, measurement: Measurement) {
        let log = &mut self.logs[index];
        let next = self.next_launch.entry(log.name.clone()).or_insert(0);
        *next = (*next).max(measurement.launch_index() + 1);
        log.measurements.push(measurement);
    }
}

/// Parse a single log text.
pub fn parse_log(text: &str, default_name: &str) -> Vec<BenchmarkLog> {
    let mut collector = LogCollector::new();
    collector.feed(text, default_name);
    collector.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagebench_core::protocol::{benchmark_header, format_line, launch_header};
    use stagebench_core::{IterationMode, IterationStage};

    fn line(index: u32, ns: f64) -> String {
        let m = Measurement::new(0, IterationMode::Workload, IterationStage::Actual, index, 10, ns);
        format_line(&m, 1e9)
    }

    #[test]
    fn test_parse_log_groups_by_benchmark_and_launch() {
        let text = [
            benchmark_header("alpha"),
            launch_header(0),
            line(1, 100.0),
            line(2, 110.0),
            launch_header(1),
            line(1, 120.0),
            benchmark_header("beta"),
            line(1, 50.0),
        ]
        .join("\n");

        let logs = parse_log(&text, "unused");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].name, "alpha");
        let launches: Vec<u32> = logs[0].measurements.iter().map(|m| m.launch_index()).collect();
        assert_eq!(launches, vec![0, 0, 1]);
        assert_eq!(logs[1].name, "beta");
        assert_eq!(logs[1].measurements.len(), 1);
    }

    #[test]
    fn test_headerless_log_uses_default_name() {
        let text = format!("some build output\n{}\n{}\n", line(1, 10.0), line(2, 12.0));
        let logs = parse_log(&text, "fallback");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].name, "fallback");
        assert_eq!(logs[0].measurements.len(), 2);
    }

    #[test]
    fn test_repeated_benchmark_shifts_launches() {
        let first = [benchmark_header("alpha"), launch_header(0), line(1, 100.0)].join("\n");
        let second = [
            benchmark_header("alpha"),
            launch_header(0),
            line(1, 101.0),
            launch_header(1),
            line(1, 102.0),
        ]
        .join("\n");

        let mut collector = LogCollector::new();
        collector.feed(&first, "a");
        collector.feed(&second, "b");
        let logs = collector.finish();

        assert_eq!(logs.len(), 1);
        let launches: Vec<u32> = logs[0].measurements.iter().map(|m| m.launch_index()).collect();
        assert_eq!(launches, vec![0, 1, 2]);
    }

    #[test]
    fn test_repeated_headerless_log_shifts_launches() {
        let text = format!("{}\n{}\n", line(1, 10.0), line(2, 12.0));

        let mut collector = LogCollector::new();
        collector.feed(&text, "run");
        collector.feed(&text, "run");
        let logs = collector.finish();

        assert_eq!(logs.len(), 1);
        let launches: Vec<u32> = logs[0].measurements.iter().map(|m| m.launch_index()).collect();
        assert_eq!(launches, vec![0, 0, 1, 1]);
    }
}
