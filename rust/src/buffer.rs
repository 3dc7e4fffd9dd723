//! Persistently host-mapped storage buffer.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use tracing::{debug, info};

use crate::allocator::MemoryAllocator;
use crate::error::{Error, Result};
use crate::vk_check;

/// Size requested for the mapped buffer: 5 MiB
pub const REQUESTED_BUFFER_SIZE: u64 = 5 * 1024 * 1024;

/// A storage buffer whose memory stays mapped into the host address space.
///
/// The memory is requested as [`MemoryLocation::GpuToCpu`]: device local
/// where possible, always host visible. The actual allocation size comes
/// from the driver's memory requirements and may exceed the requested
/// size. Dropping the buffer destroys the handle and frees the allocation.
pub struct MappedBuffer<'a> {
    allocator: &'a MemoryAllocator<'a>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    requested_size: u64,
}

impl<'a> MappedBuffer<'a> {
    pub(crate) fn new(allocator: &'a MemoryAllocator<'a>, size: u64) -> Result<Self> {
        let device = allocator.context().device();

        let info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(vk::BufferUsageFlags::STORAGE_BUFFER)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = vk_check!(unsafe { device.create_buffer(&info, None) })?;

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let allocation = match allocator.allocate(&AllocationCreateDesc {
            name: "mapped copy source",
            requirements,
            location: MemoryLocation::GpuToCpu,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        }) {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let memory = unsafe { allocation.memory() };
        let offset = allocation.offset();
        let is_mapped = allocation.mapped_ptr().is_some();

        // From here on Drop releases both the handle and the memory.
        let mapped = Self {
            allocator,
            buffer,
            allocation: Some(allocation),
            requested_size: size,
        };

        vk_check!(unsafe { device.bind_buffer_memory(buffer, memory, offset) })?;

        if !is_mapped {
            return Err(Error::MissingHostMapping {
                file: file!(),
                line: line!(),
            });
        }

        info!(
            requested = size,
            actual = mapped.size(),
            "Provisioned host-mapped buffer"
        );
        Ok(mapped)
    }

    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    /// Size passed at creation
    pub fn requested_size(&self) -> u64 {
        self.requested_size
    }

    /// Actual allocation size, at least [`Self::requested_size`]
    pub fn size(&self) -> u64 {
        self.allocation.as_ref().map_or(0, Allocation::size)
    }

    /// The mapped allocation, [`Self::size`] bytes long.
    pub fn as_bytes(&self) -> &[u8] {
        self.allocation
            .as_ref()
            .and_then(Allocation::mapped_slice)
            .unwrap_or_default()
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.allocation
            .as_mut()
            .and_then(Allocation::mapped_slice_mut)
            .unwrap_or_default()
    }
}

impl Drop for MappedBuffer<'_> {
    fn drop(&mut self) {
        debug!(size = self.size(), "Releasing host-mapped buffer");
        unsafe {
            self.allocator
                .context()
                .device()
                .destroy_buffer(self.buffer, None)
        };
        if let Some(allocation) = self.allocation.take() {
            self.allocator.free(allocation);
        }
    }
}
