//! Timed copy runner
//!
//! Performs exactly one timed copy per run. No warm-up, no repetition and
//! no averaging: the number reported is a single sample and carries the
//! noise of one measurement.

use std::hint::black_box;
use std::time::Instant;

use tracing::debug;

use crate::allocator::MemoryAllocator;
use crate::buffer::REQUESTED_BUFFER_SIZE;
use crate::context::GpuContext;
use crate::error::Result;
use crate::strategy::CopyStrategy;

/// Fill byte for host buffers. Zeroed vectors come straight from calloc and
/// would take their page faults inside the timed copy.
const HOST_FILL: u8 = 0xA5;

/// Outcome of one timed copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BenchmarkResult {
    pub strategy: CopyStrategy,
    /// Bytes moved by the copy
    pub bytes: u64,
    /// Wall-clock time of the copy, truncated to whole microseconds
    pub elapsed_us: u64,
}

impl BenchmarkResult {
    /// Effective bandwidth in MB/s (10^6 bytes per second).
    ///
    /// `f64::INFINITY` when the clock did not advance a full microsecond.
    pub fn bandwidth_mb_s(&self) -> f64 {
        bandwidth_mb_s(self.bytes, self.elapsed_us)
    }
}

/// `bytes * 1e-6 / (elapsed_us * 1e-6)`, with a zero duration mapped to
/// `f64::INFINITY` instead of a division by zero.
pub fn bandwidth_mb_s(bytes: u64, elapsed_us: u64) -> f64 {
    if elapsed_us == 0 {
        return f64::INFINITY;
    }
    (bytes as f64 * 1e-6) / (elapsed_us as f64 * 1e-6)
}

/// Whole-block copy. Panics if the lengths differ.
#[inline]
pub fn bulk_copy(dst: &mut [u8], src: &[u8]) {
    dst.copy_from_slice(src);
}

/// One byte per iteration, ascending. Panics if the lengths differ.
///
/// Source reads are volatile so the loop is not turned back into a block
/// copy or widened into vector loads.
#[inline(never)]
pub fn byte_loop_copy(dst: &mut [u8], src: &[u8]) {
    assert_eq!(dst.len(), src.len(), "byte_loop_copy length mismatch");
    let src = src.as_ptr();
    for (i, byte) in dst.iter_mut().enumerate() {
        // SAFETY: i < dst.len() == src.len()
        *byte = unsafe { std::ptr::read_volatile(src.add(i)) };
    }
}

/// Allocates an ordinary host buffer with every page already touched.
pub fn host_buffer(len: usize) -> Vec<u8> {
    vec![HOST_FILL; len]
}

/// Copies `mapped` once with `strategy` and times only the copy.
///
/// The destination, and the reference source for
/// [`CopyStrategy::ReferenceBaseline`], are sized to `mapped.len()` and
/// allocated before the clock starts.
pub fn time_copy(strategy: CopyStrategy, mapped: &[u8]) -> BenchmarkResult {
    let (result, _) = time_copy_into(strategy, mapped);
    result
}

/// Same as [`time_copy`], also returning the destination buffer.
pub fn time_copy_into(strategy: CopyStrategy, mapped: &[u8]) -> (BenchmarkResult, Vec<u8>) {
    let size = mapped.len();
    let mut dst = host_buffer(size);
    let reference_src;
    let src: &[u8] = if strategy.reads_mapped_memory() {
        mapped
    } else {
        reference_src = host_buffer(size);
        &reference_src
    };
    black_box(&mut dst);

    let start = Instant::now();
    match strategy {
        CopyStrategy::ByteLoopCopy => byte_loop_copy(&mut dst, src),
        CopyStrategy::BulkCopy | CopyStrategy::ReferenceBaseline => bulk_copy(&mut dst, src),
    }
    black_box(&dst);
    let elapsed = start.elapsed();

    let result = BenchmarkResult {
        strategy,
        bytes: size as u64,
        elapsed_us: elapsed.as_micros() as u64,
    };
    debug!(
        strategy = %strategy,
        bytes = result.bytes,
        elapsed_ns = elapsed.as_nanos() as u64,
        "Timed copy finished"
    );
    (result, dst)
}

/// Provisions the mapped buffer on `ctx` and runs one timed copy.
///
/// The allocator and buffer are released before returning.
pub fn run_on(ctx: &GpuContext, strategy: CopyStrategy) -> Result<BenchmarkResult> {
    let allocator = MemoryAllocator::new(ctx)?;
    let buffer = allocator.create_mapped_buffer(REQUESTED_BUFFER_SIZE)?;
    let result = time_copy(strategy, buffer.as_bytes());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 56) as u8
            })
            .collect()
    }

    #[test]
    fn test_bandwidth_formula() {
        let mbps = bandwidth_mb_s(5_242_880, 1_000);
        assert!((mbps - 5242.88).abs() < 1e-9, "got {}", mbps);

        let mbps = bandwidth_mb_s(5_242_880, 437);
        let expected = 5_242_880.0 * 1e-6 / (437.0 * 1e-6);
        assert!((mbps - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_zero_duration_is_infinite_not_nan() {
        let mbps = bandwidth_mb_s(5_242_880, 0);
        assert!(mbps.is_infinite() && mbps > 0.0);
        assert!(!bandwidth_mb_s(0, 0).is_nan());
        assert_eq!(bandwidth_mb_s(0, 10), 0.0);
    }

    #[test]
    fn test_byte_loop_matches_bulk() {
        let src = pattern(4097, 7);
        let mut a = vec![0u8; src.len()];
        let mut b = vec![0u8; src.len()];
        bulk_copy(&mut a, &src);
        byte_loop_copy(&mut b, &src);
        assert_eq!(a, src);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_copies() {
        let mut dst: Vec<u8> = Vec::new();
        bulk_copy(&mut dst, &[]);
        byte_loop_copy(&mut dst, &[]);
        let result = time_copy(CopyStrategy::ByteLoopCopy, &[]);
        assert_eq!(result.bytes, 0);
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn test_byte_loop_rejects_mismatched_lengths() {
        let mut dst = vec![0u8; 3];
        byte_loop_copy(&mut dst, &[1, 2]);
    }

    #[test]
    fn test_time_copy_sizes_to_source() {
        let src = pattern(REQUESTED_BUFFER_SIZE as usize + 256, 3);
        for strategy in CopyStrategy::ALL {
            let (result, dst) = time_copy_into(strategy, &src);
            assert_eq!(result.strategy, strategy);
            assert_eq!(result.bytes, src.len() as u64);
            assert_eq!(dst.len(), src.len());
            assert!(result.bandwidth_mb_s() >= 0.0);
        }
    }

    #[test]
    fn test_reference_does_not_read_source() {
        let src = vec![0x11u8; 1024];
        let (_, dst) = time_copy_into(CopyStrategy::ReferenceBaseline, &src);
        assert!(dst.iter().all(|&b| b == HOST_FILL));

        let (_, dst) = time_copy_into(CopyStrategy::BulkCopy, &src);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_only_mapped_strategies_copy_the_source() {
        let src = pattern(3000, 11);
        for strategy in CopyStrategy::ALL {
            let (result, dst) = time_copy_into(strategy, &src);
            assert_eq!(result.bytes, src.len() as u64);
            if strategy.reads_mapped_memory() {
                assert_eq!(dst, src, "{} did not copy the source", strategy);
            } else {
                assert!(dst.iter().all(|&b| b == HOST_FILL), "{} read the source", strategy);
            }
        }
    }
}
