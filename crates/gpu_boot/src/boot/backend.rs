//! Backend abstraction for context acquisition
//!
//! The acquisition sequencer never talks to the graphics API directly; it
//! drives this trait. The production implementation wraps ash (see
//! [`super::vulkan`]); tests drive the same sequence against a scripted
//! backend. This keeps platform branches and the count-then-fill query
//! ceremony out of the core, which only ever sees finite record sequences
//! and opaque handles.

use thiserror::Error;

use super::records::{
    ExtensionRecord, FeatureRecord, LayerRecord, MemoryProfile, PhysicalDeviceRecord,
    QueueFamilyRecord,
};

/// A capability query the backend reported as failed
///
/// Carries the backend status code verbatim. Whether the failure is fatal
/// is the caller's decision; most enumerations legitimately recover to an
/// empty set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{query} query failed (backend status {code})")]
pub struct EnumerationError {
    /// Which query failed
    pub query: &'static str,
    /// Backend status code, zero when the backend has none
    pub code: i32,
}

/// Which creation call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStage {
    /// Loading the backend library itself
    Loader,
    /// Instance creation
    Instance,
    /// Logical device creation
    Device,
    /// Presentation surface creation
    Surface,
    /// Debug messenger registration
    DebugMessenger,
}

impl std::fmt::Display for CreationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Loader => "backend loader",
            Self::Instance => "instance",
            Self::Device => "logical device",
            Self::Surface => "presentation surface",
            Self::DebugMessenger => "debug messenger",
        };
        f.write_str(label)
    }
}

/// A creation call itself failed
///
/// Always fatal to the acquisition attempt (debug messenger registration
/// excepted) and always followed by a rollback of whatever already exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} creation failed: {reason} (backend status {code})")]
pub struct CreationError {
    /// Which creation call failed
    pub stage: CreationStage,
    /// Backend status code, zero when the backend has none
    pub code: i32,
    /// Short failure description
    pub reason: String,
}

/// A teardown step failed
///
/// Teardown never stops on these; remaining resources are still released
/// and the first failure is reported afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TeardownError {
    /// Waiting for the device to go idle failed
    #[error("device idle wait failed (backend status {code})")]
    WaitIdle {
        /// Backend status code
        code: i32,
    },
    /// A destroy call failed
    #[error("failed to destroy {what} (backend status {code})")]
    Destroy {
        /// Which resource failed to destroy
        what: &'static str,
        /// Backend status code
        code: i32,
    },
}

/// Application metadata baked into instance creation
#[derive(Debug, Clone)]
pub struct AppDescriptor {
    /// Application name
    pub name: String,
    /// Application version as (major, minor, patch)
    pub version: (u32, u32, u32),
}

/// Everything device creation needs beyond the device index
#[derive(Debug, Clone)]
pub struct DeviceRequest {
    /// Queue family to create queues on
    pub queue_family: u32,
    /// Number of queues to create
    pub queue_count: u32,
    /// Per-queue priorities; length equals `queue_count`
    pub queue_priorities: Vec<f32>,
    /// Device extensions to enable
    pub extensions: Vec<String>,
    /// Device features to enable
    pub features: FeatureRecord,
}

/// The seam between the acquisition sequencer and the graphics API
///
/// Queries return finite record sequences; an empty sequence is valid and
/// short-circuits dependent enumeration. Creation calls hand back opaque
/// handles the sequencer threads through teardown in reverse order.
/// Physical devices are addressed by their enumeration index from
/// [`Self::physical_devices`].
pub trait ContextBackend {
    /// Instance handle type
    type Instance;
    /// Logical device handle type
    type Device;
    /// Presentation surface handle type
    type Surface;
    /// Debug messenger handle type
    type Messenger;
    /// Native window the surface is created against
    type Window: ?Sized;

    /// Backend API version, when the backend can report one
    fn instance_version(&mut self) -> Result<Option<u32>, EnumerationError>;

    /// Enumerate instance layers
    fn instance_layers(&mut self) -> Result<Vec<LayerRecord>, EnumerationError>;

    /// Enumerate instance extensions, optionally scoped to one layer
    fn instance_extensions(
        &mut self,
        layer: Option<&str>,
    ) -> Result<Vec<ExtensionRecord>, EnumerationError>;

    /// Instance extensions the window system needs for surface creation
    fn surface_extensions(&mut self, window: &Self::Window)
        -> Result<Vec<String>, EnumerationError>;

    /// Create the instance with the negotiated layer/extension sets
    fn create_instance(
        &mut self,
        app: &AppDescriptor,
        layers: &[String],
        extensions: &[String],
    ) -> Result<Self::Instance, CreationError>;

    /// Destroy the instance
    fn destroy_instance(&mut self, instance: Self::Instance) -> Result<(), TeardownError>;

    /// Enumerate physical devices
    fn physical_devices(
        &mut self,
        instance: &Self::Instance,
    ) -> Result<Vec<PhysicalDeviceRecord>, EnumerationError>;

    /// Enumerate device layers (reporting only; enablement is vestigial)
    fn device_layers(
        &mut self,
        instance: &Self::Instance,
        device: usize,
    ) -> Result<Vec<LayerRecord>, EnumerationError>;

    /// Enumerate device extensions, optionally scoped to one layer
    fn device_extensions(
        &mut self,
        instance: &Self::Instance,
        device: usize,
        layer: Option<&str>,
    ) -> Result<Vec<ExtensionRecord>, EnumerationError>;

    /// Enumerate queue families, presentation probe included
    fn queue_families(
        &mut self,
        instance: &Self::Instance,
        device: usize,
        window: &Self::Window,
    ) -> Result<Vec<QueueFamilyRecord>, EnumerationError>;

    /// Query the feature subset this crate negotiates
    fn device_features(
        &mut self,
        instance: &Self::Instance,
        device: usize,
    ) -> Result<FeatureRecord, EnumerationError>;

    /// Query memory types and heaps
    fn memory_properties(
        &mut self,
        instance: &Self::Instance,
        device: usize,
    ) -> Result<MemoryProfile, EnumerationError>;

    /// Create the logical device
    fn create_device(
        &mut self,
        instance: &Self::Instance,
        device: usize,
        request: &DeviceRequest,
    ) -> Result<Self::Device, CreationError>;

    /// Block until the device has no work in flight
    fn wait_device_idle(&mut self, device: &Self::Device) -> Result<(), TeardownError>;

    /// Destroy the logical device
    fn destroy_device(&mut self, device: Self::Device) -> Result<(), TeardownError>;

    /// Create the presentation surface for the given window
    fn create_surface(
        &mut self,
        instance: &Self::Instance,
        window: &Self::Window,
    ) -> Result<Self::Surface, CreationError>;

    /// Destroy the presentation surface
    fn destroy_surface(
        &mut self,
        instance: &Self::Instance,
        surface: Self::Surface,
    ) -> Result<(), TeardownError>;

    /// Register the debug messenger
    fn create_debug_messenger(
        &mut self,
        instance: &Self::Instance,
    ) -> Result<Self::Messenger, CreationError>;

    /// Unregister the debug messenger
    fn destroy_debug_messenger(
        &mut self,
        instance: &Self::Instance,
        messenger: Self::Messenger,
    ) -> Result<(), TeardownError>;
}
