//! Human-readable report lines.

use std::io::{self, Write};

use crate::runner::BenchmarkResult;
use crate::strategy::CopyStrategy;

pub fn banner(strategy: CopyStrategy) -> String {
    format!("=== Using {} ===", strategy.label())
}

pub fn gpu_line(device_name: &str) -> String {
    format!("GPU: {}", device_name)
}

pub fn duration_line(result: &BenchmarkResult) -> String {
    format!("Duration:  {} us", result.elapsed_us)
}

/// Bandwidth line; a zero duration prints as `inf`.
pub fn bandwidth_line(result: &BenchmarkResult) -> String {
    format!("Bandwidth: {} MB/s", result.bandwidth_mb_s())
}

/// Writes the duration and bandwidth lines.
pub fn write_result<W: Write>(out: &mut W, result: &BenchmarkResult) -> io::Result<()> {
    writeln!(out, "{}", duration_line(result))?;
    writeln!(out, "{}", bandwidth_line(result))
}
