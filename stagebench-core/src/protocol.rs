//! Line-based textual encoding of measurements for cross-process reporting.
//!
//! A measurement line looks like
//!
//! ```text
//! WorkloadActual  3: 1024 op, 0.512340 ms, 512340.00 ns, 512340 ticks, 500.33 ns/op, 1998680.53 op/s
//! ```
//!
//! Only the `op` and `ns` fields are read back; the other fields are for
//! humans. A bare stage label (`Target 3: ...`) is read as a workload
//! measurement.

use thiserror::Error;

use crate::measurement::{IterationMode, IterationStage, Measurement};

/// Prefix of the line announcing the benchmark that subsequent lines belong to.
pub const BENCHMARK_HEADER: &str = "// Benchmark: ";
/// Prefix of the line announcing a new launch of the current benchmark.
pub const LAUNCH_HEADER: &str = "// Launch: ";

const OP_SYMBOL: &str = "op";
const NS_SYMBOL: &str = "ns";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("missing ':' separator")]
    MissingSeparator,

    #[error("invalid iteration label '{0}'")]
    InvalidLabel(String),

    #[error("invalid iteration index '{0}'")]
    InvalidIndex(String),

    #[error("invalid field '{0}'")]
    InvalidField(String),

    #[error("invalid {unit} value '{value}'")]
    InvalidValue { unit: String, value: String },

    #[error("missing '{0}' field")]
    MissingField(&'static str),
}

/// One line of a measurement log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogLine {
    Benchmark(String),
    Launch(u32),
    Measurement(Measurement),
}

/// Render `measurement` as a protocol line; `ticks_per_second` is the clock frequency.
pub fn format_line(measurement: &Measurement, ticks_per_second: f64) -> String {
    let ns = measurement.nanoseconds();
    let ops = measurement.operations();
    let per_op = measurement.nanoseconds_per_op();
    let ops_per_second = if ns > 0.0 {
        ops as f64 * 1e9 / ns
    } else {
        f64::INFINITY
    };
    let ticks = (ns * ticks_per_second / 1e9).round() as u64;

    let label = format!("{}{}", measurement.mode(), measurement.stage());
    format!(
        "{:<16} {:>2}: {} {}, {:.6} ms, {:.2} {}, {} ticks, {:.2} ns/op, {:.2} op/s",
        label,
        measurement.iteration_index(),
        ops,
        OP_SYMBOL,
        ns / 1e6,
        ns,
        NS_SYMBOL,
        ticks,
        per_op,
        ops_per_second,
    )
}

fn parse_label(label: &str) -> Result<(IterationMode, IterationStage), ParseError> {
    let invalid = || ParseError::InvalidLabel(label.to_string());

    // `WorkloadActual` splits at the second capital letter.
    let split = label
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_ascii_uppercase())
        .map(|(i, _)| i);

    match split {
        Some(i) => {
            let mode = label[..i].parse().map_err(|_| invalid())?;
            let stage = label[i..].parse().map_err(|_| invalid())?;
            Ok((mode, stage))
        }
        None => {
            let stage = label.parse().map_err(|_| invalid())?;
            Ok((IterationMode::Workload, stage))
        }
    }
}

/// Parse a measurement line, tagging it with `launch_index`.
pub fn parse_line(line: &str, launch_index: u32) -> Result<Measurement, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let (info, fields) = line.split_once(':').ok_or(ParseError::MissingSeparator)?;
    let mut info_parts = info.split_whitespace();
    let label = info_parts.next().ok_or(ParseError::MissingSeparator)?;
    let (mode, stage) = parse_label(label)?;
    let index_text = info_parts.next().unwrap_or("0");
    let iteration_index: u32 = index_text
        .parse()
        .map_err(|_| ParseError::InvalidIndex(index_text.to_string()))?;

    let mut operations: Option<u64> = None;
    let mut nanoseconds: Option<f64> = None;
    for field in fields.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        let (value, unit) = field
            .split_once(' ')
            .ok_or_else(|| ParseError::InvalidField(field.to_string()))?;
        let unit = unit.trim();
        let invalid_value = || ParseError::InvalidValue {
            unit: unit.to_string(),
            value: value.to_string(),
        };
        match unit {
            OP_SYMBOL => operations = Some(value.parse().map_err(|_| invalid_value())?),
            NS_SYMBOL => {
                let ns: f64 = value.parse().map_err(|_| invalid_value())?;
                if !ns.is_finite() || ns < 0.0 {
                    return Err(invalid_value());
                }
                nanoseconds = Some(ns);
            }
            _ => {}
        }
    }

    let nanoseconds = nanoseconds.ok_or(ParseError::MissingField(NS_SYMBOL))?;
    Ok(Measurement::new(
        launch_index,
        mode,
        stage,
        iteration_index,
        operations.unwrap_or(1),
        nanoseconds,
    ))
}

impl Measurement {
    /// Render this measurement as a protocol line at nanosecond tick resolution.
    pub fn to_output_line(&self) -> String {
        format_line(self, 1e9)
    }

    /// Parse a protocol line, logging and discarding malformed input.
    pub fn parse(line: &str, launch_index: u32) -> Option<Measurement> {
        match parse_line(line, launch_index) {
            Ok(measurement) => Some(measurement),
            Err(e) => {
                tracing::error!(line = %line, error = %e, "Parse error in measurement line");
                None
            }
        }
    }
}

/// Classify a log line; lines that are neither headers nor measurements yield `None`.
///
/// Malformed measurement-looking lines are logged at error level.
pub fn parse_log_line(line: &str, launch_index: u32) -> Option<LogLine> {
    let trimmed = line.trim();
    if let Some(name) = trimmed.strip_prefix(BENCHMARK_HEADER) {
        return Some(LogLine::Benchmark(name.trim().to_string()));
    }
    if let Some(index) = trimmed.strip_prefix(LAUNCH_HEADER) {
        return match index.trim().parse() {
            Ok(index) => Some(LogLine::Launch(index)),
            Err(_) => {
                tracing::error!(line = %line, "Invalid launch header");
                None
            }
        };
    }
    if trimmed.is_empty() || trimmed.starts_with("//") {
        return None;
    }
    Measurement::parse(trimmed, launch_index).map(LogLine::Measurement)
}

pub fn benchmark_header(name: &str) -> String {
    format!("{}{}", BENCHMARK_HEADER, name)
}

pub fn launch_header(launch_index: u32) -> String {
    format!("{}{}", LAUNCH_HEADER, launch_index)
}
