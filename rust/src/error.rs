//! Error type for the benchmark.
//!
//! Two classes exist: usage errors from the command line, and fatal
//! infrastructure errors from the Vulkan loader, driver or allocator.
//! Every stage returns [`Result`]; only the binary decides how to report
//! and which exit code to use.

use ash::vk;
use gpu_allocator::AllocationError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Bad or missing command-line argument
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// No argument, or more than one
    #[error("Missing arg")]
    Missing,

    /// A single argument that names no strategy
    #[error("Unknown arg")]
    Unknown(String),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("Fatal : VkResult is \"{}\" in {file} at line {line}", status_name(.result))]
    Vulkan {
        result: vk::Result,
        file: &'static str,
        line: u32,
    },

    #[error("Fatal : VkResult is \"{}\" in {file} at line {line} ({source})", status_name(.result))]
    Allocation {
        result: vk::Result,
        #[source]
        source: AllocationError,
        file: &'static str,
        line: u32,
    },

    #[error("Fatal : VkResult is \"ERROR_MEMORY_MAP_FAILED\" in {file} at line {line} (allocation is not host mapped)")]
    MissingHostMapping { file: &'static str, line: u32 },

    #[error("Fatal : failed to load the Vulkan loader: {0}")]
    Loader(#[from] ash::LoadingError),

    #[error("Fatal : no Vulkan physical device available")]
    NoPhysicalDevice,

    #[error("Fatal : failed to write the report: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Usage errors exit with -1 (255 as seen by a POSIX shell), every
    /// infrastructure failure with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => -1,
            _ => 1,
        }
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }

    /// The Vulkan status behind a fatal error, if there is one.
    pub fn vk_result(&self) -> Option<vk::Result> {
        match self {
            Error::Vulkan { result, .. } | Error::Allocation { result, .. } => Some(*result),
            Error::MissingHostMapping { .. } => Some(vk::Result::ERROR_MEMORY_MAP_FAILED),
            _ => None,
        }
    }

    #[doc(hidden)]
    pub fn allocation(source: AllocationError, file: &'static str, line: u32) -> Self {
        Error::Allocation {
            result: allocation_status(&source),
            source,
            file,
            line,
        }
    }
}

/// Wraps an `ash` call returning `VkResult<T>`, tagging failures with the
/// call site.
///
/// ```ignore
/// let device = vk_check!(unsafe { instance.create_device(pd, &info, None) })?;
/// ```
#[macro_export]
macro_rules! vk_check {
    ($call:expr) => {
        $call.map_err(|result| $crate::Error::Vulkan {
            result,
            file: file!(),
            line: line!(),
        })
    };
}

/// Same as [`vk_check!`] for `gpu-allocator` calls.
#[macro_export]
macro_rules! alloc_check {
    ($call:expr) => {
        $call.map_err(|source| $crate::Error::allocation(source, file!(), line!()))
    };
}

/// Decodes a Vulkan status into its short name, e.g. `ERROR_DEVICE_LOST`.
pub fn vk_result_name(result: vk::Result) -> &'static str {
    match result {
        vk::Result::NOT_READY => "NOT_READY",
        vk::Result::TIMEOUT => "TIMEOUT",
        vk::Result::EVENT_SET => "EVENT_SET",
        vk::Result::EVENT_RESET => "EVENT_RESET",
        vk::Result::INCOMPLETE => "INCOMPLETE",
        vk::Result::ERROR_OUT_OF_HOST_MEMORY => "ERROR_OUT_OF_HOST_MEMORY",
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => "ERROR_OUT_OF_DEVICE_MEMORY",
        vk::Result::ERROR_INITIALIZATION_FAILED => "ERROR_INITIALIZATION_FAILED",
        vk::Result::ERROR_DEVICE_LOST => "ERROR_DEVICE_LOST",
        vk::Result::ERROR_MEMORY_MAP_FAILED => "ERROR_MEMORY_MAP_FAILED",
        vk::Result::ERROR_LAYER_NOT_PRESENT => "ERROR_LAYER_NOT_PRESENT",
        vk::Result::ERROR_EXTENSION_NOT_PRESENT => "ERROR_EXTENSION_NOT_PRESENT",
        vk::Result::ERROR_FEATURE_NOT_PRESENT => "ERROR_FEATURE_NOT_PRESENT",
        vk::Result::ERROR_INCOMPATIBLE_DRIVER => "ERROR_INCOMPATIBLE_DRIVER",
        vk::Result::ERROR_TOO_MANY_OBJECTS => "ERROR_TOO_MANY_OBJECTS",
        vk::Result::ERROR_FORMAT_NOT_SUPPORTED => "ERROR_FORMAT_NOT_SUPPORTED",
        vk::Result::ERROR_SURFACE_LOST_KHR => "ERROR_SURFACE_LOST_KHR",
        vk::Result::ERROR_NATIVE_WINDOW_IN_USE_KHR => "ERROR_NATIVE_WINDOW_IN_USE_KHR",
        vk::Result::SUBOPTIMAL_KHR => "SUBOPTIMAL_KHR",
        vk::Result::ERROR_OUT_OF_DATE_KHR => "ERROR_OUT_OF_DATE_KHR",
        vk::Result::ERROR_INCOMPATIBLE_DISPLAY_KHR => "ERROR_INCOMPATIBLE_DISPLAY_KHR",
        vk::Result::ERROR_VALIDATION_FAILED_EXT => "ERROR_VALIDATION_FAILED_EXT",
        vk::Result::ERROR_INVALID_SHADER_NV => "ERROR_INVALID_SHADER_NV",
        _ => "UNKNOWN_ERROR",
    }
}

fn status_name(result: &vk::Result) -> &'static str {
    vk_result_name(*result)
}

/// Closest Vulkan status for an allocator failure.
pub fn allocation_status(err: &AllocationError) -> vk::Result {
    match err {
        AllocationError::OutOfMemory => vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
        AllocationError::FailedToMap(_) => vk::Result::ERROR_MEMORY_MAP_FAILED,
        AllocationError::NoCompatibleMemoryTypeFound => vk::Result::ERROR_FEATURE_NOT_PRESENT,
        _ => vk::Result::ERROR_INITIALIZATION_FAILED,
    }
}
