//! Capability report formatting
//!
//! Renders enumeration records into log lines for human inspection.
//! Nothing here is load-bearing; acquisition behaves identically with the
//! report disabled.

use super::records::{
    ExtensionRecord, LayerRecord, MemoryHeapRecord, MemoryProfile, MemoryTypeRecord,
    PhysicalDeviceRecord, QueueCapabilities, QueueFamilyRecord,
};

/// Split a packed version into (major, minor, patch)
pub fn version_parts(version: u32) -> (u32, u32, u32) {
    (version >> 22, (version >> 12) & 0x3ff, version & 0xfff)
}

fn version_string(version: u32) -> String {
    let (major, minor, patch) = version_parts(version);
    format!("{major}.{minor}.{patch}")
}

/// Map a PCI vendor identifier to a short vendor name
pub fn vendor_name(id: u32) -> &'static str {
    match id {
        0x1002 => "amd",
        0x1010 => "imgtec",
        0x10DE => "nvidia",
        0x13B5 => "arm",
        0x5143 => "qualcomm",
        0x8086 => "intel",
        0x10000 => "khr",
        0x10001 => "viv",
        0x10002 => "vsi",
        0x10003 => "kazan",
        0x10004 => "codeplay",
        0x10005 => "mesa",
        0x10006 => "pocl",
        _ => "other",
    }
}

fn queue_flag_string(capabilities: QueueCapabilities) -> String {
    let mut out = String::new();
    for (flag, label) in [
        (QueueCapabilities::GRAPHICS, "[graphics]"),
        (QueueCapabilities::COMPUTE, "[compute]"),
        (QueueCapabilities::TRANSFER, "[transfer]"),
        (QueueCapabilities::SPARSE_BINDING, "[sparsebind]"),
        (QueueCapabilities::PROTECTED, "[protected]"),
    ] {
        if capabilities.contains(flag) {
            out.push_str(label);
        }
    }
    out
}

pub(crate) fn instance_version(version: u32) {
    log::info!("instance version {}", version_string(version));
}

pub(crate) fn layers(scope: &str, records: &[LayerRecord]) {
    log::info!("{scope} layers: {}", records.len());
    for layer in records {
        log::info!(
            "  layer[{}] = {{ \"{}\" ({}; {}): \"{}\" }}{}",
            layer.index,
            layer.name,
            version_string(layer.spec_version),
            version_string(layer.implementation_version),
            layer.description,
            if layer.enabled { " [enabled]" } else { "" },
        );
    }
}

pub(crate) fn extensions(scope: &str, records: &[ExtensionRecord]) {
    log::info!("{scope} extensions: {}", records.len());
    for extension in records {
        log::info!(
            "  extension[{}] = {{ \"{}\" ({}) }}{}",
            extension.index,
            extension.name,
            version_string(extension.spec_version),
            if extension.enabled { " [enabled]" } else { "" },
        );
    }
}

pub(crate) fn physical_devices(records: &[PhysicalDeviceRecord]) {
    log::info!("physical devices: {}", records.len());
    for device in records {
        log::info!(
            "  device[{}] = {{ \"{}\" [{}] ({}; {}; {}; {}) }}",
            device.index,
            device.name,
            device.class.label(),
            version_string(device.api_version),
            version_string(device.driver_version),
            vendor_name(device.vendor_id),
            vendor_name(device.device_id),
        );
    }
}

pub(crate) fn queue_families(records: &[QueueFamilyRecord]) {
    log::info!("queue families: {}", records.len());
    for family in records {
        log::info!(
            "  family[{}] = {{ {} ({} queues){} }}",
            family.index,
            queue_flag_string(family.capabilities),
            family.queue_count,
            if family.presentable { " [presentable]" } else { "" },
        );
    }
}

fn memory_type_line(record: &MemoryTypeRecord) -> String {
    use super::records::MemoryAttributes as Attr;
    let mut flags = String::new();
    for (flag, label) in [
        (Attr::DEVICE_LOCAL, "[device local]"),
        (Attr::HOST_VISIBLE, "[host visible]"),
        (Attr::HOST_COHERENT, "[host coherent]"),
        (Attr::HOST_CACHED, "[host cached]"),
        (Attr::LAZILY_ALLOCATED, "[lazy alloc]"),
        (Attr::PROTECTED, "[protected]"),
    ] {
        if record.attributes.contains(flag) {
            flags.push_str(label);
        }
    }
    format!(
        "  memory type[{}] = {{ {} (heap {}) }}",
        record.index, flags, record.heap_index
    )
}

fn memory_heap_line(record: &MemoryHeapRecord) -> String {
    use super::records::MemoryHeapAttributes as Attr;
    let mut flags = String::new();
    for (flag, label) in [
        (Attr::DEVICE_LOCAL, "[device local]"),
        (Attr::MULTI_INSTANCE, "[multi-instance]"),
    ] {
        if record.attributes.contains(flag) {
            flags.push_str(label);
        }
    }
    format!(
        "  memory heap[{}] = {{ {} ({} bytes) }}",
        record.index, flags, record.size
    )
}

pub(crate) fn memory_profile(profile: &MemoryProfile) {
    log::info!("memory types: {}", profile.types.len());
    for record in &profile.types {
        log::info!("{}", memory_type_line(record));
    }
    log::info!("memory heaps: {}", profile.heaps.len());
    for record in &profile.heaps {
        log::info!("{}", memory_heap_line(record));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::records::{MemoryAttributes, MemoryHeapAttributes};

    #[test]
    fn version_decoding() {
        // 1.3.289 packed the way the backend packs it
        let packed = (1 << 22) | (3 << 12) | 289;
        assert_eq!(version_parts(packed), (1, 3, 289));
        assert_eq!(version_parts(0), (0, 0, 0));
    }

    #[test]
    fn vendor_names() {
        assert_eq!(vendor_name(0x10DE), "nvidia");
        assert_eq!(vendor_name(0x1002), "amd");
        assert_eq!(vendor_name(0x8086), "intel");
        assert_eq!(vendor_name(0x10005), "mesa");
        assert_eq!(vendor_name(0xDEAD), "other");
    }

    #[test]
    fn queue_flags_render_in_fixed_order() {
        let flags = QueueCapabilities::COMPUTE | QueueCapabilities::GRAPHICS;
        assert_eq!(queue_flag_string(flags), "[graphics][compute]");
        assert_eq!(queue_flag_string(QueueCapabilities::empty()), "");
    }

    #[test]
    fn memory_lines_carry_indices() {
        let line = memory_type_line(&MemoryTypeRecord {
            index: 3,
            attributes: MemoryAttributes::DEVICE_LOCAL | MemoryAttributes::HOST_VISIBLE,
            heap_index: 1,
        });
        assert!(line.contains("memory type[3]"));
        assert!(line.contains("[device local]"));
        assert!(line.contains("(heap 1)"));

        let line = memory_heap_line(&MemoryHeapRecord {
            index: 0,
            attributes: MemoryHeapAttributes::DEVICE_LOCAL,
            size: 4096,
        });
        assert!(line.contains("memory heap[0]"));
        assert!(line.contains("4096 bytes"));
    }
}
