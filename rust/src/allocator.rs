//! General-purpose device memory allocator bound to a [`GpuContext`].

use std::cell::RefCell;

use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, Allocator, AllocatorCreateDesc};
use gpu_allocator::{AllocationSizes, AllocatorDebugSettings};
use tracing::{info, warn};

use crate::alloc_check;
use crate::buffer::MappedBuffer;
use crate::context::GpuContext;
use crate::error::Result;

/// Sub-allocates and maps device memory for buffers.
///
/// Borrows the context so the device cannot be destroyed while memory
/// blocks are still alive. Freeing needs `&mut Allocator` while buffers only
/// hold `&MemoryAllocator`, hence the `RefCell`; the benchmark is single
/// threaded.
pub struct MemoryAllocator<'ctx> {
    ctx: &'ctx GpuContext,
    inner: RefCell<Allocator>,
}

impl<'ctx> MemoryAllocator<'ctx> {
    pub fn new(ctx: &'ctx GpuContext) -> Result<Self> {
        let desc = AllocatorCreateDesc {
            instance: ctx.instance().clone(),
            device: ctx.device().clone(),
            physical_device: ctx.physical_device(),
            debug_settings: AllocatorDebugSettings::default(),
            buffer_device_address: false,
            allocation_sizes: AllocationSizes::default(),
        };
        let inner = alloc_check!(Allocator::new(&desc))?;
        info!(device = %ctx.device_name(), "Created device memory allocator");
        Ok(Self {
            ctx,
            inner: RefCell::new(inner),
        })
    }

    pub fn context(&self) -> &'ctx GpuContext {
        self.ctx
    }

    /// Creates a persistently mapped buffer of at least `size` bytes.
    pub fn create_mapped_buffer(&self, size: u64) -> Result<MappedBuffer<'_>> {
        MappedBuffer::new(self, size)
    }

    pub(crate) fn allocate(&self, desc: &AllocationCreateDesc<'_>) -> Result<Allocation> {
        alloc_check!(self.inner.borrow_mut().allocate(desc))
    }

    pub(crate) fn free(&self, allocation: Allocation) {
        if let Err(e) = self.inner.borrow_mut().free(allocation) {
            warn!(error = %e, "Failed to free device allocation");
        }
    }
}
