//! Vulkan instance and device context.

use std::ffi::{c_char, CStr};

use ash::{vk, Device, Entry, Instance};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::vk_check;

/// Application name reported to the driver
pub const APPLICATION_NAME: &CStr = c"Vulkan memory test";

/// Validation layer enabled when it is installed
pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_LUNARG_standard_validation";

/// Owns the instance and logical device for one benchmark run.
///
/// The physical device is always the first one the loader enumerates.
/// Dropping the context destroys the device, then the instance, so every
/// allocator and buffer built on top of it must be gone first. The borrow
/// on [`crate::MemoryAllocator`] enforces that.
pub struct GpuContext {
    // Keeps the loader library mapped for as long as the instance lives.
    _entry: Entry,
    instance: Instance,
    physical_device: vk::PhysicalDevice,
    device: Device,
    device_name: String,
    validation: bool,
}

impl GpuContext {
    /// Loads the system Vulkan loader and builds a context on the first device.
    pub fn new() -> Result<Self> {
        Self::new_observed(|_| {})
    }

    /// Like [`GpuContext::new`], calling `on_selected` with the device name
    /// once the physical device is chosen and before the logical device is
    /// created. It still runs when device creation then fails.
    pub fn new_observed(on_selected: impl FnOnce(&str)) -> Result<Self> {
        // SAFETY: the loader is only unloaded when `Entry` is dropped, which
        // happens after the instance is destroyed.
        let entry = unsafe { Entry::load()? };
        Self::with_entry_observed(entry, on_selected)
    }

    /// Builds a context from an already loaded entry point table.
    pub fn with_entry(entry: Entry) -> Result<Self> {
        Self::with_entry_observed(entry, |_| {})
    }

    pub fn with_entry_observed(entry: Entry, on_selected: impl FnOnce(&str)) -> Result<Self> {
        let validation = cfg!(feature = "validation") && validation_layer_available(&entry);

        let app_info = vk::ApplicationInfo::default()
            .application_name(APPLICATION_NAME)
            .api_version(vk::API_VERSION_1_2);

        let (layers, extensions): (Vec<*const c_char>, Vec<*const c_char>) = if validation {
            (
                vec![VALIDATION_LAYER.as_ptr()],
                vec![ash::ext::debug_report::NAME.as_ptr()],
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions);

        let instance = vk_check!(unsafe { entry.create_instance(&create_info, None) })?;

        let (physical_device, device, device_name) = match open_first_device(&instance, on_selected) {
            Ok(opened) => opened,
            Err(e) => {
                unsafe { instance.destroy_instance(None) };
                return Err(e);
            }
        };

        info!(device = %device_name, validation, "Initialized Vulkan context");

        Ok(Self {
            _entry: entry,
            instance,
            physical_device,
            device,
            device_name,
            validation,
        })
    }

    /// Name reported by the selected physical device.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Whether the validation layer was enabled on the instance.
    pub fn validation_enabled(&self) -> bool {
        self.validation
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        debug!(device = %self.device_name, "Destroying Vulkan context");
        // SAFETY: nothing created from the device or instance outlives the
        // context; no work was ever submitted, so the device is idle.
        unsafe {
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

fn validation_layer_available(entry: &Entry) -> bool {
    let available = match unsafe { entry.enumerate_instance_layer_properties() } {
        Ok(layers) => layers,
        Err(result) => {
            warn!(?result, "Could not enumerate instance layers, continuing without validation");
            return false;
        }
    };
    let found = wants_validation(available.iter().filter_map(|p| p.layer_name_as_c_str().ok()));
    if found {
        debug!(layer = ?VALIDATION_LAYER, "Enabling validation layer");
    } else {
        warn!(layer = ?VALIDATION_LAYER, "Validation layer not installed");
    }
    found
}

/// True when the preferred validation layer is among `available`.
pub fn wants_validation<'a>(available: impl IntoIterator<Item = &'a CStr>) -> bool {
    available.into_iter().any(|name| name == VALIDATION_LAYER)
}

/// Picks the first enumerated device. No scoring, no suitability checks.
pub fn select_physical_device(devices: &[vk::PhysicalDevice]) -> Result<vk::PhysicalDevice> {
    devices.first().copied().ok_or(Error::NoPhysicalDevice)
}

fn open_first_device(
    instance: &Instance,
    on_selected: impl FnOnce(&str),
) -> Result<(vk::PhysicalDevice, Device, String)> {
    let devices = vk_check!(unsafe { instance.enumerate_physical_devices() })?;
    debug!(count = devices.len(), "Enumerated physical devices");

    open_selected(
        &devices,
        |physical_device| {
            let properties = unsafe { instance.get_physical_device_properties(physical_device) };
            properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        },
        on_selected,
        |physical_device| {
            // One queue entry is required by the API; the queue itself is never fetched.
            let priorities = [1.0f32];
            let queue_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(0)
                .queue_priorities(&priorities)];
            let device_info = vk::DeviceCreateInfo::default().queue_create_infos(&queue_infos);
            vk_check!(unsafe { instance.create_device(physical_device, &device_info, None) })
        },
    )
}

/// Select, name, announce, then create. The name is announced even when
/// `create` fails.
fn open_selected<D>(
    devices: &[vk::PhysicalDevice],
    name_of: impl FnOnce(vk::PhysicalDevice) -> String,
    on_selected: impl FnOnce(&str),
    create: impl FnOnce(vk::PhysicalDevice) -> Result<D>,
) -> Result<(vk::PhysicalDevice, D, String)> {
    let physical_device = select_physical_device(devices)?;
    let device_name = name_of(physical_device);
    on_selected(&device_name);

    let device = create(physical_device)?;
    Ok((physical_device, device, device_name))
}
