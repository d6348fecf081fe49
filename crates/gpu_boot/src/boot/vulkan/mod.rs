//! ash implementation of the context backend
//!
//! Everything API-specific lives here: the entry loader, builder-struct
//! ceremony, C string handling, and the count-then-fill dance the raw API
//! wants for layer-scoped queries. The sequencer above only ever sees the
//! record types and opaque handles.

mod debug;
mod present;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use ash::extensions::{ext::DebugUtils, khr};
use ash::vk;

use super::backend::{
    AppDescriptor, ContextBackend, CreationError, CreationStage, DeviceRequest, EnumerationError,
    TeardownError,
};
use super::records::{
    DeviceClass, ExtensionRecord, FeatureRecord, LayerRecord, MemoryAttributes,
    MemoryHeapAttributes, MemoryHeapRecord, MemoryProfile, MemoryTypeRecord, PhysicalDeviceRecord,
    QueueCapabilities, QueueFamilyRecord,
};
use super::sequence::GraphicsContext;
use crate::window::Window;

/// Engine name reported to the driver
const ENGINE_NAME: &str = "gpu_boot";

/// Production backend wrapping the ash Vulkan binding
pub struct VulkanBackend {
    entry: ash::Entry,
    physical_devices: Vec<vk::PhysicalDevice>,
}

/// Surface handle bundled with the extension loader that destroys it
pub struct SurfaceHandle {
    loader: khr::Surface,
    raw: vk::SurfaceKHR,
}

impl SurfaceHandle {
    /// Raw surface handle
    pub fn raw(&self) -> vk::SurfaceKHR {
        self.raw
    }

    /// Surface extension loader
    pub fn loader(&self) -> &khr::Surface {
        &self.loader
    }
}

/// Debug messenger handle bundled with its extension loader
pub struct MessengerHandle {
    loader: DebugUtils,
    raw: vk::DebugUtilsMessengerEXT,
}

impl VulkanBackend {
    /// Load the Vulkan library
    pub fn load() -> Result<Self, CreationError> {
        let entry = unsafe { ash::Entry::load() }.map_err(|error| CreationError {
            stage: CreationStage::Loader,
            code: 0,
            reason: format!("failed to load Vulkan library: {error}"),
        })?;
        Ok(Self {
            entry,
            physical_devices: Vec::new(),
        })
    }

    fn physical(
        &self,
        index: usize,
        query: &'static str,
    ) -> Result<vk::PhysicalDevice, EnumerationError> {
        self.physical_devices
            .get(index)
            .copied()
            .ok_or(EnumerationError { query, code: 0 })
    }
}

fn enumeration_error(query: &'static str, result: vk::Result) -> EnumerationError {
    EnumerationError {
        query,
        code: result.as_raw(),
    }
}

fn creation_error(stage: CreationStage, result: vk::Result) -> CreationError {
    CreationError {
        stage,
        code: result.as_raw(),
        reason: format!("{result:?}"),
    }
}

fn fixed_cstr_to_string(raw: &[c_char]) -> String {
    unsafe { CStr::from_ptr(raw.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

fn to_cstrings(names: &[String], stage: CreationStage) -> Result<Vec<CString>, CreationError> {
    names
        .iter()
        .map(|name| {
            CString::new(name.as_str()).map_err(|_| CreationError {
                stage,
                code: 0,
                reason: format!("capability name contains interior NUL: {name:?}"),
            })
        })
        .collect()
}

fn layer_records(props: &[vk::LayerProperties]) -> Vec<LayerRecord> {
    props
        .iter()
        .enumerate()
        .map(|(index, prop)| LayerRecord {
            index,
            name: fixed_cstr_to_string(&prop.layer_name),
            spec_version: prop.spec_version,
            implementation_version: prop.implementation_version,
            description: fixed_cstr_to_string(&prop.description),
            enabled: false,
        })
        .collect()
}

fn extension_records(props: &[vk::ExtensionProperties]) -> Vec<ExtensionRecord> {
    props
        .iter()
        .enumerate()
        .map(|(index, prop)| ExtensionRecord {
            index,
            name: fixed_cstr_to_string(&prop.extension_name),
            spec_version: prop.spec_version,
            enabled: false,
        })
        .collect()
}

fn device_class(device_type: vk::PhysicalDeviceType) -> DeviceClass {
    match device_type {
        vk::PhysicalDeviceType::INTEGRATED_GPU => DeviceClass::IntegratedGpu,
        vk::PhysicalDeviceType::DISCRETE_GPU => DeviceClass::DiscreteGpu,
        vk::PhysicalDeviceType::VIRTUAL_GPU => DeviceClass::VirtualGpu,
        vk::PhysicalDeviceType::CPU => DeviceClass::Cpu,
        _ => DeviceClass::Other,
    }
}

fn queue_capabilities(flags: vk::QueueFlags) -> QueueCapabilities {
    let mut capabilities = QueueCapabilities::empty();
    for (vk_flag, capability) in [
        (vk::QueueFlags::GRAPHICS, QueueCapabilities::GRAPHICS),
        (vk::QueueFlags::COMPUTE, QueueCapabilities::COMPUTE),
        (vk::QueueFlags::TRANSFER, QueueCapabilities::TRANSFER),
        (
            vk::QueueFlags::SPARSE_BINDING,
            QueueCapabilities::SPARSE_BINDING,
        ),
        (vk::QueueFlags::PROTECTED, QueueCapabilities::PROTECTED),
    ] {
        if flags.contains(vk_flag) {
            capabilities |= capability;
        }
    }
    capabilities
}

fn memory_attributes(flags: vk::MemoryPropertyFlags) -> MemoryAttributes {
    let mut attributes = MemoryAttributes::empty();
    for (vk_flag, attribute) in [
        (
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            MemoryAttributes::DEVICE_LOCAL,
        ),
        (
            vk::MemoryPropertyFlags::HOST_VISIBLE,
            MemoryAttributes::HOST_VISIBLE,
        ),
        (
            vk::MemoryPropertyFlags::HOST_COHERENT,
            MemoryAttributes::HOST_COHERENT,
        ),
        (
            vk::MemoryPropertyFlags::HOST_CACHED,
            MemoryAttributes::HOST_CACHED,
        ),
        (
            vk::MemoryPropertyFlags::LAZILY_ALLOCATED,
            MemoryAttributes::LAZILY_ALLOCATED,
        ),
        (
            vk::MemoryPropertyFlags::PROTECTED,
            MemoryAttributes::PROTECTED,
        ),
    ] {
        if flags.contains(vk_flag) {
            attributes |= attribute;
        }
    }
    attributes
}

fn heap_attributes(flags: vk::MemoryHeapFlags) -> MemoryHeapAttributes {
    let mut attributes = MemoryHeapAttributes::empty();
    if flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL) {
        attributes |= MemoryHeapAttributes::DEVICE_LOCAL;
    }
    if flags.contains(vk::MemoryHeapFlags::MULTI_INSTANCE) {
        attributes |= MemoryHeapAttributes::MULTI_INSTANCE;
    }
    attributes
}

impl ContextBackend for VulkanBackend {
    type Instance = ash::Instance;
    type Device = ash::Device;
    type Surface = SurfaceHandle;
    type Messenger = MessengerHandle;
    type Window = Window;

    fn instance_version(&mut self) -> Result<Option<u32>, EnumerationError> {
        self.entry
            .try_enumerate_instance_version()
            .map_err(|error| enumeration_error("instance version", error))
    }

    fn instance_layers(&mut self) -> Result<Vec<LayerRecord>, EnumerationError> {
        let props = self
            .entry
            .enumerate_instance_layer_properties()
            .map_err(|error| enumeration_error("instance layers", error))?;
        Ok(layer_records(&props))
    }

    fn instance_extensions(
        &mut self,
        layer: Option<&str>,
    ) -> Result<Vec<ExtensionRecord>, EnumerationError> {
        let layer_name = match layer {
            Some(name) => Some(CString::new(name).map_err(|_| EnumerationError {
                query: "instance extensions",
                code: 0,
            })?),
            None => None,
        };
        let props = self
            .entry
            .enumerate_instance_extension_properties(layer_name.as_deref())
            .map_err(|error| enumeration_error("instance extensions", error))?;
        Ok(extension_records(&props))
    }

    fn surface_extensions(&mut self, window: &Window) -> Result<Vec<String>, EnumerationError> {
        window.required_instance_extensions().map_err(|error| {
            log::error!("{error}");
            EnumerationError {
                query: "window surface extensions",
                code: 0,
            }
        })
    }

    fn create_instance(
        &mut self,
        app: &AppDescriptor,
        layers: &[String],
        extensions: &[String],
    ) -> Result<ash::Instance, CreationError> {
        let app_name = CString::new(app.name.as_str()).map_err(|_| CreationError {
            stage: CreationStage::Instance,
            code: 0,
            reason: "application name contains interior NUL".to_owned(),
        })?;
        let engine_name = CString::new(ENGINE_NAME).map_err(|_| CreationError {
            stage: CreationStage::Instance,
            code: 0,
            reason: "invalid engine name".to_owned(),
        })?;

        let (major, minor, patch) = app.version;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_0);

        let layer_names = to_cstrings(layers, CreationStage::Instance)?;
        let extension_names = to_cstrings(extensions, CreationStage::Instance)?;
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|n| n.as_ptr()).collect();
        let extension_ptrs: Vec<*const c_char> =
            extension_names.iter().map(|n| n.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_ptrs);

        unsafe { self.entry.create_instance(&create_info, None) }
            .map_err(|error| creation_error(CreationStage::Instance, error))
    }

    fn destroy_instance(&mut self, instance: ash::Instance) -> Result<(), TeardownError> {
        unsafe { instance.destroy_instance(None) };
        Ok(())
    }

    fn physical_devices(
        &mut self,
        instance: &ash::Instance,
    ) -> Result<Vec<PhysicalDeviceRecord>, EnumerationError> {
        let devices = unsafe { instance.enumerate_physical_devices() }
            .map_err(|error| enumeration_error("physical devices", error))?;
        let records = devices
            .iter()
            .enumerate()
            .map(|(index, &device)| {
                let props = unsafe { instance.get_physical_device_properties(device) };
                PhysicalDeviceRecord {
                    index,
                    name: fixed_cstr_to_string(&props.device_name),
                    class: device_class(props.device_type),
                    api_version: props.api_version,
                    driver_version: props.driver_version,
                    vendor_id: props.vendor_id,
                    device_id: props.device_id,
                }
            })
            .collect();
        self.physical_devices = devices;
        Ok(records)
    }

    fn device_layers(
        &mut self,
        instance: &ash::Instance,
        device: usize,
    ) -> Result<Vec<LayerRecord>, EnumerationError> {
        let physical = self.physical(device, "device layers")?;
        let props = unsafe { instance.enumerate_device_layer_properties(physical) }
            .map_err(|error| enumeration_error("device layers", error))?;
        Ok(layer_records(&props))
    }

    fn device_extensions(
        &mut self,
        instance: &ash::Instance,
        device: usize,
        layer: Option<&str>,
    ) -> Result<Vec<ExtensionRecord>, EnumerationError> {
        let physical = self.physical(device, "device extensions")?;
        let Some(layer) = layer else {
            let props = unsafe { instance.enumerate_device_extension_properties(physical) }
                .map_err(|error| enumeration_error("device extensions", error))?;
            return Ok(extension_records(&props));
        };

        // Layer-scoped device extension queries have no safe wrapper, so
        // this is the one place the count-then-fill ceremony surfaces.
        let layer_name = CString::new(layer).map_err(|_| EnumerationError {
            query: "device extensions",
            code: 0,
        })?;
        let enumerate = instance.fp_v1_0().enumerate_device_extension_properties;
        let mut count = 0u32;
        let result =
            unsafe { enumerate(physical, layer_name.as_ptr(), &mut count, std::ptr::null_mut()) };
        if result != vk::Result::SUCCESS {
            return Err(enumeration_error("device extensions", result));
        }
        let mut props = vec![vk::ExtensionProperties::default(); count as usize];
        let result =
            unsafe { enumerate(physical, layer_name.as_ptr(), &mut count, props.as_mut_ptr()) };
        if result != vk::Result::SUCCESS && result != vk::Result::INCOMPLETE {
            return Err(enumeration_error("device extensions", result));
        }
        props.truncate(count as usize);
        Ok(extension_records(&props))
    }

    fn queue_families(
        &mut self,
        instance: &ash::Instance,
        device: usize,
        window: &Window,
    ) -> Result<Vec<QueueFamilyRecord>, EnumerationError> {
        let physical = self.physical(device, "queue families")?;
        let props = unsafe { instance.get_physical_device_queue_family_properties(physical) };
        Ok(props
            .iter()
            .enumerate()
            .map(|(index, family)| QueueFamilyRecord {
                index,
                capabilities: queue_capabilities(family.queue_flags),
                queue_count: family.queue_count,
                presentable: present::presentation_support(
                    &self.entry,
                    instance,
                    physical,
                    index as u32,
                    window,
                ),
            })
            .collect())
    }

    fn device_features(
        &mut self,
        instance: &ash::Instance,
        device: usize,
    ) -> Result<FeatureRecord, EnumerationError> {
        let physical = self.physical(device, "device features")?;
        let features = unsafe { instance.get_physical_device_features(physical) };
        Ok(FeatureRecord {
            geometry_shader: features.geometry_shader == vk::TRUE,
            tessellation_shader: features.tessellation_shader == vk::TRUE,
            multi_draw_indirect: features.multi_draw_indirect == vk::TRUE,
        })
    }

    fn memory_properties(
        &mut self,
        instance: &ash::Instance,
        device: usize,
    ) -> Result<MemoryProfile, EnumerationError> {
        let physical = self.physical(device, "memory properties")?;
        let props = unsafe { instance.get_physical_device_memory_properties(physical) };
        let types = props.memory_types[..props.memory_type_count as usize]
            .iter()
            .enumerate()
            .map(|(index, memory_type)| MemoryTypeRecord {
                index,
                attributes: memory_attributes(memory_type.property_flags),
                heap_index: memory_type.heap_index,
            })
            .collect();
        let heaps = props.memory_heaps[..props.memory_heap_count as usize]
            .iter()
            .enumerate()
            .map(|(index, heap)| MemoryHeapRecord {
                index,
                attributes: heap_attributes(heap.flags),
                size: heap.size,
            })
            .collect();
        Ok(MemoryProfile { types, heaps })
    }

    fn create_device(
        &mut self,
        instance: &ash::Instance,
        device: usize,
        request: &DeviceRequest,
    ) -> Result<ash::Device, CreationError> {
        let physical = self
            .physical(device, "logical device")
            .map_err(|error| CreationError {
                stage: CreationStage::Device,
                code: error.code,
                reason: "physical device index out of range".to_owned(),
            })?;

        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(request.queue_family)
            .queue_priorities(&request.queue_priorities)
            .build()];

        let extension_names = to_cstrings(&request.extensions, CreationStage::Device)?;
        let extension_ptrs: Vec<*const c_char> =
            extension_names.iter().map(|n| n.as_ptr()).collect();

        let features = vk::PhysicalDeviceFeatures::builder()
            .geometry_shader(request.features.geometry_shader)
            .tessellation_shader(request.features.tessellation_shader)
            .multi_draw_indirect(request.features.multi_draw_indirect)
            .build();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&features);

        unsafe { instance.create_device(physical, &create_info, None) }
            .map_err(|error| creation_error(CreationStage::Device, error))
    }

    fn wait_device_idle(&mut self, device: &ash::Device) -> Result<(), TeardownError> {
        unsafe { device.device_wait_idle() }
            .map_err(|error| TeardownError::WaitIdle {
                code: error.as_raw(),
            })
    }

    fn destroy_device(&mut self, device: ash::Device) -> Result<(), TeardownError> {
        unsafe { device.destroy_device(None) };
        Ok(())
    }

    fn create_surface(
        &mut self,
        instance: &ash::Instance,
        window: &Window,
    ) -> Result<SurfaceHandle, CreationError> {
        let raw = unsafe {
            ash_window::create_surface(
                &self.entry,
                instance,
                window.display_handle(),
                window.window_handle(),
                None,
            )
        }
        .map_err(|error| creation_error(CreationStage::Surface, error))?;

        Ok(SurfaceHandle {
            loader: khr::Surface::new(&self.entry, instance),
            raw,
        })
    }

    fn destroy_surface(
        &mut self,
        _instance: &ash::Instance,
        surface: SurfaceHandle,
    ) -> Result<(), TeardownError> {
        unsafe { surface.loader.destroy_surface(surface.raw, None) };
        Ok(())
    }

    fn create_debug_messenger(
        &mut self,
        instance: &ash::Instance,
    ) -> Result<MessengerHandle, CreationError> {
        let loader = DebugUtils::new(&self.entry, instance);
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug::messenger_callback));

        let raw = unsafe { loader.create_debug_utils_messenger(&create_info, None) }
            .map_err(|error| creation_error(CreationStage::DebugMessenger, error))?;
        Ok(MessengerHandle { loader, raw })
    }

    fn destroy_debug_messenger(
        &mut self,
        _instance: &ash::Instance,
        messenger: MessengerHandle,
    ) -> Result<(), TeardownError> {
        unsafe {
            messenger
                .loader
                .destroy_debug_utils_messenger(messenger.raw, None)
        };
        Ok(())
    }
}

impl GraphicsContext<VulkanBackend> {
    /// Raw surface handle, while the context is live
    pub fn surface_khr(&self) -> Option<vk::SurfaceKHR> {
        self.surface().map(SurfaceHandle::raw)
    }

    /// Queue handle from the selected family, while the context is live
    ///
    /// `index` must be below [`Self::queue_count`].
    pub fn queue(&self, index: u32) -> Option<vk::Queue> {
        self.device()
            .map(|device| unsafe { device.get_device_queue(self.queue_family_index(), index) })
    }
}
