//! Platform presentation-support probe
//!
//! Answers "can this queue family present to this window system" before
//! any surface exists, dispatching on the raw display handle at runtime.
//! Platforms without a pre-surface probe report support and defer to the
//! surface-support query downstream consumers run at swapchain time.

use ash::extensions::khr;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::window::Window;

pub(crate) fn presentation_support(
    entry: &ash::Entry,
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    queue_family_index: u32,
    window: &Window,
) -> bool {
    match (window.display_handle(), window.window_handle()) {
        (RawDisplayHandle::Windows(_), _) => unsafe {
            khr::Win32Surface::new(entry, instance)
                .get_physical_device_win32_presentation_support(physical_device, queue_family_index)
        },
        (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(window_handle)) => {
            if display.display.is_null() {
                return true;
            }
            unsafe {
                khr::XlibSurface::new(entry, instance).get_physical_device_xlib_presentation_support(
                    physical_device,
                    queue_family_index,
                    &mut *(display.display as *mut vk::Display),
                    window_handle.visual_id as u32,
                )
            }
        }
        (RawDisplayHandle::Wayland(display), _) => {
            if display.display.is_null() {
                return true;
            }
            unsafe {
                khr::WaylandSurface::new(entry, instance)
                    .get_physical_device_wayland_presentation_support(
                        physical_device,
                        queue_family_index,
                        &mut *(display.display as *mut vk::wl_display),
                    )
            }
        }
        (RawDisplayHandle::Xcb(display), RawWindowHandle::Xcb(window_handle)) => {
            if display.connection.is_null() {
                return true;
            }
            unsafe {
                khr::XcbSurface::new(entry, instance).get_physical_device_xcb_presentation_support(
                    physical_device,
                    queue_family_index,
                    &mut *(display.connection as *mut vk::xcb_connection_t),
                    window_handle.visual_id,
                )
            }
        }
        _ => {
            log::debug!("no presentation probe for this window system; assuming supported");
            true
        }
    }
}
