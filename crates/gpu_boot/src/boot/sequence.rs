//! The acquisition sequencer and ordered teardown
//!
//! One parameterized sequence brings a context online: instance →
//! physical device → logical device + queues → presentation surface →
//! optional debug messenger. Every fatal failure unwinds exactly the
//! resources created so far, in reverse creation order, before the error
//! reaches the caller; a partially acquired context never escapes.

use thiserror::Error;

use super::backend::{
    AppDescriptor, ContextBackend, CreationError, DeviceRequest, EnumerationError, TeardownError,
};
use super::names::NameRequestSet;
use super::records::{ExtensionRecord, FeatureRecord, LayerRecord, QueueSelection};
use super::{report, select};
use crate::config::{ContextConfig, DEBUG_UTILS_EXTENSION, VALIDATION_LAYER};

/// Which kind of capability a required name referred to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    /// Instance layer
    Layer,
    /// Instance extension
    InstanceExtension,
    /// Device extension
    DeviceExtension,
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Layer => "layer",
            Self::InstanceExtension => "instance extension",
            Self::DeviceExtension => "device extension",
        };
        f.write_str(label)
    }
}

/// Why context acquisition failed
///
/// Whatever was created before the failure has already been torn down by
/// the time the caller sees one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    /// A capability query the sequence cannot proceed without failed
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    /// No discrete GPU is present
    #[error("no suitable physical device: a discrete GPU is required")]
    NoSuitableDevice,

    /// No queue family covers graphics, compute, and presentation
    #[error("no queue family supports graphics, compute, and presentation")]
    NoSuitableQueueFamily,

    /// A required layer or extension is not available on this machine
    #[error("required {kind} unavailable: {name}")]
    RequiredCapabilityUnavailable {
        /// What kind of capability was missing
        kind: CapabilityKind,
        /// The missing name(s)
        name: String,
    },

    /// A creation call itself failed
    #[error(transparent)]
    Creation(#[from] CreationError),
}

/// Acquisition progress, used for tracing transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BootState {
    Empty,
    InstanceReady,
    DeviceSelected,
    LogicalDeviceReady,
    SurfaceReady,
    DebugReady,
    Complete,
}

fn advance(state: &mut BootState, next: BootState) {
    log::debug!("context state {state:?} -> {next:?}");
    *state = next;
}

/// The aggregate result of a successful acquisition
///
/// Owns the backend and every handle the sequence created. Handles live in
/// `Option`s that [`Self::release`] drains in reverse creation order, which
/// is what makes double release a harmless no-op and use-after-release
/// detectable through the accessors.
#[derive(Debug)]
pub struct GraphicsContext<B: ContextBackend> {
    backend: B,
    instance: Option<B::Instance>,
    device: Option<B::Device>,
    surface: Option<B::Surface>,
    messenger: Option<B::Messenger>,
    queue_family_index: u32,
    queue_count: u32,
    device_name: String,
}

impl<B: ContextBackend> GraphicsContext<B> {
    /// Instance handle, while the context is live
    pub fn instance(&self) -> Option<&B::Instance> {
        self.instance.as_ref()
    }

    /// Logical device handle, while the context is live
    pub fn device(&self) -> Option<&B::Device> {
        self.device.as_ref()
    }

    /// Presentation surface handle, while the context is live
    pub fn surface(&self) -> Option<&B::Surface> {
        self.surface.as_ref()
    }

    /// Selected queue family index
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// Number of queues created on the selected family
    pub fn queue_count(&self) -> u32 {
        self.queue_count
    }

    /// Name of the selected physical device
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Whether a debug messenger was registered
    pub fn has_debug_messenger(&self) -> bool {
        self.messenger.is_some()
    }

    /// Whether the context has already been released
    pub fn is_released(&self) -> bool {
        self.instance.is_none()
    }

    /// Tear the context down in reverse acquisition order
    ///
    /// Waits for the device to go idle first; the wait has no internal
    /// timeout, so callers needing bounded shutdown must wrap this call
    /// externally. Failing steps are logged and skipped over so the
    /// remaining resources still get released; the first failure is
    /// returned afterwards. Releasing an already-released context is a
    /// no-op success.
    pub fn release(&mut self) -> Result<(), TeardownError> {
        if self.is_released() {
            log::debug!("release called on an already-released context");
            return Ok(());
        }
        log::info!("releasing graphics context");
        teardown(
            &mut self.backend,
            &mut self.instance,
            &mut self.device,
            &mut self.surface,
            &mut self.messenger,
        )
    }
}

impl<B: ContextBackend> Drop for GraphicsContext<B> {
    fn drop(&mut self) {
        if !self.is_released() {
            log::warn!("graphics context dropped without release; tearing down now");
            if let Err(error) = self.release() {
                log::error!("implicit release failed: {error}");
            }
        }
    }
}

/// Destroy whatever subset of the context exists, in reverse creation order
///
/// Shared by the failure rollback during acquisition and by
/// [`GraphicsContext::release`]. Every step is attempted even when an
/// earlier one fails; the first failure is returned.
fn teardown<B: ContextBackend>(
    backend: &mut B,
    instance: &mut Option<B::Instance>,
    device: &mut Option<B::Device>,
    surface: &mut Option<B::Surface>,
    messenger: &mut Option<B::Messenger>,
) -> Result<(), TeardownError> {
    let mut first_error = None;
    let mut note = |result: Result<(), TeardownError>| {
        if let Err(error) = result {
            log::error!("teardown step failed: {error}");
            if first_error.is_none() {
                first_error = Some(error);
            }
        }
    };

    if let Some(dev) = device.as_ref() {
        note(backend.wait_device_idle(dev));
    }
    if let Some(m) = messenger.take() {
        match instance.as_ref() {
            Some(inst) => note(backend.destroy_debug_messenger(inst, m)),
            None => log::error!("debug messenger outlived its instance; skipping destroy"),
        }
    }
    if let Some(s) = surface.take() {
        match instance.as_ref() {
            Some(inst) => note(backend.destroy_surface(inst, s)),
            None => log::error!("surface outlived its instance; skipping destroy"),
        }
    }
    if let Some(d) = device.take() {
        note(backend.destroy_device(d));
    }
    if let Some(i) = instance.take() {
        note(backend.destroy_instance(i));
    }

    match first_error {
        None => Ok(()),
        Some(error) => Err(error),
    }
}

/// Partially acquired state, tracked so rollback knows what exists
struct Bootstrap<B: ContextBackend> {
    backend: B,
    instance: Option<B::Instance>,
    device: Option<B::Device>,
    surface: Option<B::Surface>,
    messenger: Option<B::Messenger>,
}

/// Run the acquisition sequence against the given backend
pub(crate) fn acquire_with<B: ContextBackend>(
    backend: B,
    config: &ContextConfig,
    window: &B::Window,
) -> Result<GraphicsContext<B>, AcquisitionError> {
    let mut boot = Bootstrap {
        backend,
        instance: None,
        device: None,
        surface: None,
        messenger: None,
    };

    match run(&mut boot, config, window) {
        Ok((queue_family_index, queue_count, device_name)) => Ok(GraphicsContext {
            backend: boot.backend,
            instance: boot.instance,
            device: boot.device,
            surface: boot.surface,
            messenger: boot.messenger,
            queue_family_index,
            queue_count,
            device_name,
        }),
        Err(error) => {
            log::error!("context acquisition failed: {error}");
            // Best-effort rollback; the acquisition error is what the
            // caller needs to see.
            let _ = teardown(
                &mut boot.backend,
                &mut boot.instance,
                &mut boot.device,
                &mut boot.surface,
                &mut boot.messenger,
            );
            Err(error)
        }
    }
}

fn run<B: ContextBackend>(
    boot: &mut Bootstrap<B>,
    config: &ContextConfig,
    window: &B::Window,
) -> Result<(u32, u32, String), AcquisitionError> {
    let diagnostics = config.diagnostics_enabled();
    let mut state = BootState::Empty;
    log::info!(
        "acquiring graphics context for \"{}\"",
        config.application_name
    );

    match boot.backend.instance_version() {
        Ok(Some(version)) => report::instance_version(version),
        Ok(None) => {}
        Err(error) => log::warn!("{error}"),
    }

    // Instance layer negotiation. The validation layer rides along as an
    // optional whenever diagnostics are on.
    let mut layer_records = recover(boot.backend.instance_layers(), "instance layers");
    let mut optional_layers = config.instance.optional_layers.clone();
    if diagnostics && !optional_layers.iter().any(|n| n == VALIDATION_LAYER) {
        optional_layers.push(VALIDATION_LAYER.to_owned());
    }
    let mut layer_set =
        NameRequestSet::new(optional_layers, config.instance.required_layers.clone());
    for record in &layer_records {
        layer_set.offer(&record.name);
    }

    // Extension negotiation runs over the base sweep plus one sweep per
    // available layer; layer-provided extensions count as available.
    let mut extension_records = recover(
        boot.backend.instance_extensions(None),
        "instance extensions",
    );
    for layer in &layer_records {
        let scoped = recover(
            boot.backend.instance_extensions(Some(&layer.name)),
            "instance extensions",
        );
        extension_records.extend(scoped);
    }

    let mut required_extensions = boot.backend.surface_extensions(window)?;
    for name in &config.instance.required_extensions {
        if !required_extensions.iter().any(|existing| existing == name) {
            required_extensions.push(name.clone());
        }
    }
    let mut optional_extensions = config.instance.optional_extensions.clone();
    if diagnostics && !optional_extensions.iter().any(|n| n == DEBUG_UTILS_EXTENSION) {
        optional_extensions.push(DEBUG_UTILS_EXTENSION.to_owned());
    }
    let mut extension_set = NameRequestSet::new(optional_extensions, required_extensions);
    for record in &extension_records {
        extension_set.offer(&record.name);
    }

    layer_set
        .finish()
        .map_err(|missing| required_unavailable(CapabilityKind::Layer, missing))?;
    extension_set
        .finish()
        .map_err(|missing| required_unavailable(CapabilityKind::InstanceExtension, missing))?;

    mark_enabled_layers(&mut layer_records, &layer_set);
    mark_enabled_extensions(&mut extension_records, &extension_set);
    if diagnostics {
        report::layers("instance", &layer_records);
        report::extensions("instance", &extension_records);
    }

    let app = AppDescriptor {
        name: config.application_name.clone(),
        version: config.application_version,
    };
    let instance = boot
        .backend
        .create_instance(&app, layer_set.enabled(), extension_set.enabled())?;
    let instance = &*boot.instance.insert(instance);
    advance(&mut state, BootState::InstanceReady);

    // Physical device selection.
    let device_records = boot.backend.physical_devices(instance)?;
    if diagnostics {
        report::physical_devices(&device_records);
    }
    let device_index = select::select_physical_device(&device_records)
        .ok_or(AcquisitionError::NoSuitableDevice)?;
    let device_name = device_records[device_index].name.clone();
    log::info!("selected physical device [{device_index}] \"{device_name}\"");
    advance(&mut state, BootState::DeviceSelected);

    // Device layers are enumerated for the report only; enabling them is
    // deprecated and skipped.
    if diagnostics {
        let device_layer_records = recover(
            boot.backend.device_layers(instance, device_index),
            "device layers",
        );
        if !device_layer_records.is_empty() {
            report::layers("device", &device_layer_records);
            for layer in &device_layer_records {
                let scoped = recover(
                    boot.backend
                        .device_extensions(instance, device_index, Some(&layer.name)),
                    "device extensions",
                );
                if !scoped.is_empty() {
                    report::extensions(&format!("device layer \"{}\"", layer.name), &scoped);
                }
            }
        }
    }

    let mut device_extension_records = recover(
        boot.backend.device_extensions(instance, device_index, None),
        "device extensions",
    );
    let mut device_extension_set = NameRequestSet::new(
        config.device.optional_extensions.clone(),
        config.device.required_extensions.clone(),
    );
    for record in &device_extension_records {
        device_extension_set.offer(&record.name);
    }
    device_extension_set
        .finish()
        .map_err(|missing| required_unavailable(CapabilityKind::DeviceExtension, missing))?;
    mark_enabled_extensions(&mut device_extension_records, &device_extension_set);
    if diagnostics {
        report::extensions("device", &device_extension_records);
    }

    // Queue family selection, presentation probe included in the records.
    let family_records = recover(
        boot.backend.queue_families(instance, device_index, window),
        "queue families",
    );
    if diagnostics {
        report::queue_families(&family_records);
    }
    let family_index = select::select_queue_family(&family_records)
        .ok_or(AcquisitionError::NoSuitableQueueFamily)?;
    let queue_selection = QueueSelection::for_family(&family_records[family_index]);
    log::info!(
        "selected queue family {family_index} ({} queues)",
        queue_selection.queue_count
    );

    let available_features = match boot.backend.device_features(instance, device_index) {
        Ok(features) => features,
        Err(error) => {
            log::warn!("{error}; assuming no optional features");
            FeatureRecord::default()
        }
    };
    // Geometry and tessellation shading are hard requirements of the
    // downstream renderer; multi-draw-indirect mirrors availability.
    let features = FeatureRecord {
        geometry_shader: true,
        tessellation_shader: true,
        multi_draw_indirect: available_features.multi_draw_indirect,
    };

    match boot.backend.memory_properties(instance, device_index) {
        Ok(profile) if diagnostics => report::memory_profile(&profile),
        Ok(_) => {}
        Err(error) => log::warn!("{error}"),
    }

    let request = DeviceRequest {
        queue_family: family_index as u32,
        queue_count: queue_selection.queue_count,
        queue_priorities: queue_selection.priorities.clone(),
        extensions: device_extension_set.enabled().to_vec(),
        features,
    };
    let device = boot.backend.create_device(instance, device_index, &request)?;
    boot.device = Some(device);
    advance(&mut state, BootState::LogicalDeviceReady);

    // Presentation surface.
    let surface = boot.backend.create_surface(instance, window)?;
    boot.surface = Some(surface);
    advance(&mut state, BootState::SurfaceReady);

    // Debug messenger, only when asked for and never fatal: the context is
    // fully usable without it.
    if diagnostics {
        match boot.backend.create_debug_messenger(instance) {
            Ok(messenger) => {
                boot.messenger = Some(messenger);
                advance(&mut state, BootState::DebugReady);
            }
            Err(error) => {
                log::warn!("debug messenger unavailable: {error}; continuing without it");
            }
        }
    }

    advance(&mut state, BootState::Complete);
    Ok((family_index as u32, queue_selection.queue_count, device_name))
}

fn recover<T>(result: Result<Vec<T>, EnumerationError>, what: &str) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(error) => {
            log::warn!("{what}: {error}; treating as empty");
            Vec::new()
        }
    }
}

fn required_unavailable(kind: CapabilityKind, missing: Vec<String>) -> AcquisitionError {
    AcquisitionError::RequiredCapabilityUnavailable {
        kind,
        name: missing.join(", "),
    }
}

fn mark_enabled_layers(records: &mut [LayerRecord], set: &NameRequestSet) {
    for record in records {
        record.enabled = set.is_enabled(&record.name);
    }
}

fn mark_enabled_extensions(records: &mut [ExtensionRecord], set: &NameRequestSet) {
    for record in records {
        record.enabled = set.is_enabled(&record.name);
    }
}
