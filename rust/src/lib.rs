//! # mapcopy
//!
//! Measures what it costs to read bytes out of host-mapped Vulkan memory.
//! One run copies a 5 MiB persistently mapped buffer once, with one of three
//! strategies, and reports the duration and bandwidth.
//!
//! ```rust,no_run
//! use mapcopy::{report, runner, CopyStrategy, GpuContext};
//!
//! let ctx = GpuContext::new()?;
//! println!("{}", report::gpu_line(ctx.device_name()));
//! let result = runner::run_on(&ctx, CopyStrategy::BulkCopy)?;
//! println!("{}", report::bandwidth_line(&result));
//! # Ok::<(), mapcopy::Error>(())
//! ```
//!
//! Objects are released in reverse creation order: buffer, allocator,
//! device, instance.

pub mod allocator;
pub mod buffer;
pub mod context;
pub mod error;
pub mod report;
pub mod runner;
pub mod strategy;

pub use allocator::MemoryAllocator;
pub use buffer::{MappedBuffer, REQUESTED_BUFFER_SIZE};
pub use context::GpuContext;
pub use error::{Error, Result, UsageError};
pub use runner::BenchmarkResult;
pub use strategy::CopyStrategy;
