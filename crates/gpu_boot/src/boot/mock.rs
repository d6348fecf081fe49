//! Scripted backend for sequencer tests
//!
//! Records every creation and destruction call so tests can assert the
//! exact rollback/teardown order, and injects failures at any step.

use std::cell::RefCell;
use std::rc::Rc;

use super::backend::{
    AppDescriptor, ContextBackend, CreationError, CreationStage, DeviceRequest, EnumerationError,
    TeardownError,
};
use super::records::{
    DeviceClass, ExtensionRecord, FeatureRecord, LayerRecord, MemoryProfile, PhysicalDeviceRecord,
    QueueCapabilities, QueueFamilyRecord,
};

/// Surface extension every mock "window system" requires
pub const MOCK_SURFACE_EXTENSION: &str = "VK_TEST_surface";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    CreateInstance,
    CreateDevice,
    CreateSurface,
    CreateMessenger,
    WaitIdle,
    DestroyMessenger,
    DestroySurface,
    DestroyDevice,
    DestroyInstance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Instance,
    Device,
    Surface,
    Messenger,
}

pub fn layer(index: usize, name: &str) -> LayerRecord {
    LayerRecord {
        index,
        name: name.to_owned(),
        spec_version: 1 << 22,
        implementation_version: 1,
        description: format!("mock layer {name}"),
        enabled: false,
    }
}

pub fn extension(index: usize, name: &str) -> ExtensionRecord {
    ExtensionRecord {
        index,
        name: name.to_owned(),
        spec_version: 1,
        enabled: false,
    }
}

pub fn device(index: usize, class: DeviceClass, name: &str) -> PhysicalDeviceRecord {
    PhysicalDeviceRecord {
        index,
        name: name.to_owned(),
        class,
        api_version: 1 << 22,
        driver_version: 1,
        vendor_id: 0x10DE,
        device_id: 0x10DE,
    }
}

pub fn family(
    index: usize,
    capabilities: QueueCapabilities,
    queue_count: u32,
    presentable: bool,
) -> QueueFamilyRecord {
    QueueFamilyRecord {
        index,
        capabilities,
        queue_count,
        presentable,
    }
}

#[derive(Debug)]
pub struct MockBackend {
    pub layers: Vec<LayerRecord>,
    pub instance_extensions: Vec<ExtensionRecord>,
    pub device_extensions: Vec<ExtensionRecord>,
    pub devices: Vec<PhysicalDeviceRecord>,
    pub families: Vec<QueueFamilyRecord>,
    pub features: FeatureRecord,
    pub fail: Option<FailPoint>,
    pub events: Rc<RefCell<Vec<MockEvent>>>,
    pub last_device_request: Rc<RefCell<Option<DeviceRequest>>>,
    next_handle: u32,
}

impl MockBackend {
    /// A machine that can complete the whole sequence: validation layer,
    /// surface and debug extensions, one integrated plus one discrete GPU,
    /// and a qualifying queue family at index 1.
    pub fn with_defaults() -> Self {
        Self {
            layers: vec![layer(0, crate::config::VALIDATION_LAYER)],
            instance_extensions: vec![
                extension(0, MOCK_SURFACE_EXTENSION),
                extension(1, crate::config::DEBUG_UTILS_EXTENSION),
            ],
            device_extensions: vec![extension(0, crate::config::SWAPCHAIN_EXTENSION)],
            devices: vec![
                device(0, DeviceClass::IntegratedGpu, "mock-integrated"),
                device(1, DeviceClass::DiscreteGpu, "mock-discrete"),
            ],
            families: vec![
                family(0, QueueCapabilities::TRANSFER, 1, false),
                family(
                    1,
                    QueueCapabilities::GRAPHICS
                        | QueueCapabilities::COMPUTE
                        | QueueCapabilities::TRANSFER,
                    3,
                    true,
                ),
            ],
            features: FeatureRecord {
                geometry_shader: true,
                tessellation_shader: true,
                multi_draw_indirect: true,
            },
            fail: None,
            events: Rc::new(RefCell::new(Vec::new())),
            last_device_request: Rc::new(RefCell::new(None)),
            next_handle: 0,
        }
    }

    fn push(&self, event: MockEvent) {
        self.events.borrow_mut().push(event);
    }

    fn handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn injected(stage: CreationStage) -> CreationError {
        CreationError {
            stage,
            code: -1,
            reason: "injected failure".to_owned(),
        }
    }
}

impl ContextBackend for MockBackend {
    type Instance = u32;
    type Device = u32;
    type Surface = u32;
    type Messenger = u32;
    type Window = ();

    fn instance_version(&mut self) -> Result<Option<u32>, EnumerationError> {
        Ok(Some((1 << 22) | (1 << 12)))
    }

    fn instance_layers(&mut self) -> Result<Vec<LayerRecord>, EnumerationError> {
        Ok(self.layers.clone())
    }

    fn instance_extensions(
        &mut self,
        layer: Option<&str>,
    ) -> Result<Vec<ExtensionRecord>, EnumerationError> {
        if layer.is_none() {
            Ok(self.instance_extensions.clone())
        } else {
            Ok(Vec::new())
        }
    }

    fn surface_extensions(&mut self, _window: &()) -> Result<Vec<String>, EnumerationError> {
        Ok(vec![MOCK_SURFACE_EXTENSION.to_owned()])
    }

    fn create_instance(
        &mut self,
        _app: &AppDescriptor,
        _layers: &[String],
        _extensions: &[String],
    ) -> Result<u32, CreationError> {
        if self.fail == Some(FailPoint::Instance) {
            return Err(Self::injected(CreationStage::Instance));
        }
        self.push(MockEvent::CreateInstance);
        Ok(self.handle())
    }

    fn destroy_instance(&mut self, _instance: u32) -> Result<(), TeardownError> {
        self.push(MockEvent::DestroyInstance);
        Ok(())
    }

    fn physical_devices(
        &mut self,
        _instance: &u32,
    ) -> Result<Vec<PhysicalDeviceRecord>, EnumerationError> {
        Ok(self.devices.clone())
    }

    fn device_layers(
        &mut self,
        _instance: &u32,
        _device: usize,
    ) -> Result<Vec<LayerRecord>, EnumerationError> {
        Ok(Vec::new())
    }

    fn device_extensions(
        &mut self,
        _instance: &u32,
        _device: usize,
        layer: Option<&str>,
    ) -> Result<Vec<ExtensionRecord>, EnumerationError> {
        if layer.is_none() {
            Ok(self.device_extensions.clone())
        } else {
            Ok(Vec::new())
        }
    }

    fn queue_families(
        &mut self,
        _instance: &u32,
        _device: usize,
        _window: &(),
    ) -> Result<Vec<QueueFamilyRecord>, EnumerationError> {
        Ok(self.families.clone())
    }

    fn device_features(
        &mut self,
        _instance: &u32,
        _device: usize,
    ) -> Result<FeatureRecord, EnumerationError> {
        Ok(self.features)
    }

    fn memory_properties(
        &mut self,
        _instance: &u32,
        _device: usize,
    ) -> Result<MemoryProfile, EnumerationError> {
        Ok(MemoryProfile::default())
    }

    fn create_device(
        &mut self,
        _instance: &u32,
        _device: usize,
        request: &DeviceRequest,
    ) -> Result<u32, CreationError> {
        *self.last_device_request.borrow_mut() = Some(request.clone());
        if self.fail == Some(FailPoint::Device) {
            return Err(Self::injected(CreationStage::Device));
        }
        self.push(MockEvent::CreateDevice);
        Ok(self.handle())
    }

    fn wait_device_idle(&mut self, _device: &u32) -> Result<(), TeardownError> {
        self.push(MockEvent::WaitIdle);
        Ok(())
    }

    fn destroy_device(&mut self, _device: u32) -> Result<(), TeardownError> {
        self.push(MockEvent::DestroyDevice);
        Ok(())
    }

    fn create_surface(&mut self, _instance: &u32, _window: &()) -> Result<u32, CreationError> {
        if self.fail == Some(FailPoint::Surface) {
            return Err(Self::injected(CreationStage::Surface));
        }
        self.push(MockEvent::CreateSurface);
        Ok(self.handle())
    }

    fn destroy_surface(&mut self, _instance: &u32, _surface: u32) -> Result<(), TeardownError> {
        self.push(MockEvent::DestroySurface);
        Ok(())
    }

    fn create_debug_messenger(&mut self, _instance: &u32) -> Result<u32, CreationError> {
        if self.fail == Some(FailPoint::Messenger) {
            return Err(Self::injected(CreationStage::DebugMessenger));
        }
        self.push(MockEvent::CreateMessenger);
        Ok(self.handle())
    }

    fn destroy_debug_messenger(
        &mut self,
        _instance: &u32,
        _messenger: u32,
    ) -> Result<(), TeardownError> {
        self.push(MockEvent::DestroyMessenger);
        Ok(())
    }
}
