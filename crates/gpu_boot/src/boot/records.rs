//! Read-only capability snapshots
//!
//! Everything the backend can enumerate is reported through one of these
//! record types: a plain description of the item, its position in the
//! enumeration, and (for layers and extensions) whether capability
//! negotiation ended up enabling it. Records are rebuilt on every
//! acquisition attempt and are not retained by the resulting context.

use bitflags::bitflags;

bitflags! {
    /// Command categories a queue family can execute
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct QueueCapabilities: u32 {
        /// Rasterization and draw commands
        const GRAPHICS = 1 << 0;
        /// Compute dispatch commands
        const COMPUTE = 1 << 1;
        /// Copy/blit commands
        const TRANSFER = 1 << 2;
        /// Sparse resource binding
        const SPARSE_BINDING = 1 << 3;
        /// Protected-memory submissions
        const PROTECTED = 1 << 4;
    }
}

bitflags! {
    /// Properties of a memory type
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryAttributes: u32 {
        /// Fastest for device access
        const DEVICE_LOCAL = 1 << 0;
        /// Mappable by the host
        const HOST_VISIBLE = 1 << 1;
        /// No explicit flush/invalidate needed
        const HOST_COHERENT = 1 << 2;
        /// Cached on the host side
        const HOST_CACHED = 1 << 3;
        /// Backed lazily by the implementation
        const LAZILY_ALLOCATED = 1 << 4;
        /// Only usable for protected resources
        const PROTECTED = 1 << 5;
    }
}

bitflags! {
    /// Properties of a memory heap
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryHeapAttributes: u32 {
        /// Local to the device
        const DEVICE_LOCAL = 1 << 0;
        /// Replicated across physical-device instances
        const MULTI_INSTANCE = 1 << 1;
    }
}

/// Broad classification of a physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Unrecognized device type
    Other,
    /// GPU sharing memory with the host
    IntegratedGpu,
    /// Dedicated GPU with its own memory
    DiscreteGpu,
    /// GPU exposed through a virtualization layer
    VirtualGpu,
    /// Software rasterizer running on the CPU
    Cpu,
}

impl DeviceClass {
    /// Human-readable label used by the capability report
    pub fn label(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::IntegratedGpu => "integrated gpu",
            Self::DiscreteGpu => "discrete gpu",
            Self::VirtualGpu => "virtual gpu",
            Self::Cpu => "cpu",
        }
    }
}

/// One enumerated layer
#[derive(Debug, Clone)]
pub struct LayerRecord {
    /// Position in the enumeration
    pub index: usize,
    /// Layer name as reported by the backend
    pub name: String,
    /// Specification version the layer was written against (packed)
    pub spec_version: u32,
    /// Layer implementation version (packed)
    pub implementation_version: u32,
    /// Free-form description
    pub description: String,
    /// Set once name negotiation decides to enable the layer
    pub enabled: bool,
}

/// One enumerated extension
#[derive(Debug, Clone)]
pub struct ExtensionRecord {
    /// Position in the enumeration
    pub index: usize,
    /// Extension name as reported by the backend
    pub name: String,
    /// Extension specification version (packed)
    pub spec_version: u32,
    /// Set once name negotiation decides to enable the extension
    pub enabled: bool,
}

/// One enumerated physical device
#[derive(Debug, Clone)]
pub struct PhysicalDeviceRecord {
    /// Position in the enumeration; later queries address the device by it
    pub index: usize,
    /// Device name as reported by the driver
    pub name: String,
    /// Broad device classification
    pub class: DeviceClass,
    /// Highest API version the device supports (packed)
    pub api_version: u32,
    /// Driver version (packed, vendor-specific encoding)
    pub driver_version: u32,
    /// PCI vendor identifier
    pub vendor_id: u32,
    /// Vendor-assigned device identifier
    pub device_id: u32,
}

/// One enumerated queue family
#[derive(Debug, Clone)]
pub struct QueueFamilyRecord {
    /// Family index on the owning physical device
    pub index: usize,
    /// Command categories the family supports
    pub capabilities: QueueCapabilities,
    /// Number of queues the family exposes
    pub queue_count: u32,
    /// Result of the platform presentation-support probe
    pub presentable: bool,
}

/// One enumerated memory type
#[derive(Debug, Clone)]
pub struct MemoryTypeRecord {
    /// Position in the enumeration
    pub index: usize,
    /// Memory type properties
    pub attributes: MemoryAttributes,
    /// Heap this type allocates from
    pub heap_index: u32,
}

/// One enumerated memory heap
#[derive(Debug, Clone)]
pub struct MemoryHeapRecord {
    /// Position in the enumeration
    pub index: usize,
    /// Heap properties
    pub attributes: MemoryHeapAttributes,
    /// Heap size in bytes
    pub size: u64,
}

/// Memory types and heaps of one physical device
#[derive(Debug, Clone, Default)]
pub struct MemoryProfile {
    /// Enumerated memory types
    pub types: Vec<MemoryTypeRecord>,
    /// Enumerated memory heaps
    pub heaps: Vec<MemoryHeapRecord>,
}

/// Subset of device features this crate negotiates
///
/// Geometry and tessellation shading are force-enabled at device creation;
/// multi-draw-indirect is mirrored from what the device reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureRecord {
    /// Geometry shader stage support
    pub geometry_shader: bool,
    /// Tessellation shader stage support
    pub tessellation_shader: bool,
    /// Multiple draws from a single indirect buffer
    pub multi_draw_indirect: bool,
}

/// Outcome of queue family selection
///
/// `family_index` is `None` until a family qualifies. Once set, it always
/// references a family whose capabilities cover graphics and compute and
/// whose presentation probe returned true; the priorities array always has
/// exactly `queue_count` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSelection {
    /// Selected family, if any
    pub family_index: Option<u32>,
    /// Number of queues to create (the family's full count)
    pub queue_count: u32,
    /// Per-queue priorities, zero-filled
    pub priorities: Vec<f32>,
}

impl QueueSelection {
    /// Selection before any family has qualified
    pub fn unselected() -> Self {
        Self {
            family_index: None,
            queue_count: 0,
            priorities: Vec::new(),
        }
    }

    /// Selection covering every queue of the given family
    pub fn for_family(family: &QueueFamilyRecord) -> Self {
        Self {
            family_index: Some(family.index as u32),
            queue_count: family.queue_count,
            priorities: vec![0.0; family.queue_count as usize],
        }
    }

    /// Whether a family has been selected
    pub fn is_selected(&self) -> bool {
        self.family_index.is_some()
    }
}
