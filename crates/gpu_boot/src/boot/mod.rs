//! Context bootstrap
//!
//! Brings a graphics context online in one strictly ordered sequence —
//! capability enumeration, name negotiation, device and queue family
//! selection, logical device and surface creation, optional debug
//! messenger — and tears it down in exact reverse order, including on
//! partial failure.

pub mod backend;
pub mod names;
pub mod records;
pub mod select;
pub mod sequence;
pub mod vulkan;

pub(crate) mod report;

#[cfg(test)]
pub(crate) mod mock;

use crate::config::ContextConfig;
use crate::window::Window;

pub use backend::{
    AppDescriptor, ContextBackend, CreationError, CreationStage, DeviceRequest, EnumerationError,
    TeardownError,
};
pub use records::{
    DeviceClass, ExtensionRecord, FeatureRecord, LayerRecord, MemoryAttributes,
    MemoryHeapAttributes, MemoryHeapRecord, MemoryProfile, MemoryTypeRecord, PhysicalDeviceRecord,
    QueueCapabilities, QueueFamilyRecord, QueueSelection,
};
pub use sequence::{AcquisitionError, CapabilityKind, GraphicsContext};
pub use vulkan::VulkanBackend;

/// Graphics context over the production Vulkan backend
pub type VulkanContext = GraphicsContext<VulkanBackend>;

/// Bring a graphics context online for the given window
///
/// Runs the whole acquisition sequence to completion and returns the fully
/// populated context, or a single discriminated error after everything
/// created along the way has been unwound.
pub fn acquire(config: &ContextConfig, window: &Window) -> Result<VulkanContext, AcquisitionError> {
    let backend = VulkanBackend::load()?;
    sequence::acquire_with(backend, config, window)
}
