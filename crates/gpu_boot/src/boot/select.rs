//! Physical device and queue family selection
//!
//! Both policies are deliberately simple: first qualifying entry in
//! enumeration order wins, no scoring. A machine without a discrete GPU
//! does not silently fall back to integrated or software devices; the
//! caller gets a hard failure instead.

use super::records::{DeviceClass, PhysicalDeviceRecord, QueueCapabilities, QueueFamilyRecord};

/// Minimum capability mask a queue family must cover
pub const REQUIRED_QUEUE_CAPABILITIES: QueueCapabilities =
    QueueCapabilities::GRAPHICS.union(QueueCapabilities::COMPUTE);

/// Pick the physical device to build the context on
///
/// First discrete GPU in enumeration order; `None` when no discrete GPU is
/// present.
pub fn select_physical_device(devices: &[PhysicalDeviceRecord]) -> Option<usize> {
    devices
        .iter()
        .position(|device| device.class == DeviceClass::DiscreteGpu)
}

/// Pick the queue family to create queues on
///
/// First family whose capabilities cover graphics and compute and whose
/// presentation probe returned true. Transfer support is nice to have but
/// never a selection input.
pub fn select_queue_family(families: &[QueueFamilyRecord]) -> Option<usize> {
    let selected = families.iter().position(|family| {
        family.capabilities.contains(REQUIRED_QUEUE_CAPABILITIES) && family.presentable
    })?;

    if !families[selected]
        .capabilities
        .contains(QueueCapabilities::TRANSFER)
    {
        log::debug!(
            "queue family {selected} lacks dedicated transfer support; continuing anyway"
        );
    }
    Some(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(index: usize, class: DeviceClass) -> PhysicalDeviceRecord {
        PhysicalDeviceRecord {
            index,
            name: format!("device-{index}"),
            class,
            api_version: 0,
            driver_version: 0,
            vendor_id: 0,
            device_id: 0,
        }
    }

    fn family(index: usize, capabilities: QueueCapabilities, presentable: bool) -> QueueFamilyRecord {
        QueueFamilyRecord {
            index,
            capabilities,
            queue_count: 1,
            presentable,
        }
    }

    #[test]
    fn discrete_device_wins_regardless_of_position() {
        let devices = [
            device(0, DeviceClass::IntegratedGpu),
            device(1, DeviceClass::DiscreteGpu),
            device(2, DeviceClass::VirtualGpu),
        ];
        assert_eq!(select_physical_device(&devices), Some(1));

        let devices = [
            device(0, DeviceClass::DiscreteGpu),
            device(1, DeviceClass::DiscreteGpu),
        ];
        assert_eq!(select_physical_device(&devices), Some(0));
    }

    #[test]
    fn no_discrete_device_selects_nothing() {
        let devices = [
            device(0, DeviceClass::IntegratedGpu),
            device(1, DeviceClass::Cpu),
        ];
        assert_eq!(select_physical_device(&devices), None);
        assert_eq!(select_physical_device(&[]), None);
    }

    #[test]
    fn first_family_with_capabilities_and_presentation_wins() {
        let families = [
            family(0, QueueCapabilities::TRANSFER, false),
            family(
                1,
                QueueCapabilities::GRAPHICS | QueueCapabilities::COMPUTE,
                true,
            ),
            family(
                2,
                QueueCapabilities::GRAPHICS | QueueCapabilities::COMPUTE,
                false,
            ),
        ];
        assert_eq!(select_queue_family(&families), Some(1));
    }

    #[test]
    fn presentation_support_is_mandatory() {
        let families = [family(
            0,
            QueueCapabilities::GRAPHICS | QueueCapabilities::COMPUTE | QueueCapabilities::TRANSFER,
            false,
        )];
        assert_eq!(select_queue_family(&families), None);
    }

    #[test]
    fn graphics_alone_does_not_qualify() {
        let families = [
            family(0, QueueCapabilities::GRAPHICS, true),
            family(1, QueueCapabilities::COMPUTE, true),
        ];
        assert_eq!(select_queue_family(&families), None);
        assert_eq!(select_queue_family(&[]), None);
    }

    #[test]
    fn transfer_does_not_override_enumeration_order() {
        let families = [
            family(
                0,
                QueueCapabilities::GRAPHICS | QueueCapabilities::COMPUTE,
                true,
            ),
            family(
                1,
                QueueCapabilities::GRAPHICS
                    | QueueCapabilities::COMPUTE
                    | QueueCapabilities::TRANSFER,
                true,
            ),
        ];
        assert_eq!(select_queue_family(&families), Some(0));
    }
}
