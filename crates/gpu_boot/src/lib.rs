//! # gpu_boot
//!
//! One-shot bring-up and tear-down of a Vulkan graphics context: enumerate
//! what the machine offers, negotiate layer and extension names, pick a
//! discrete GPU and a queue family that can do graphics, compute, and
//! presentation, create the logical device and presentation surface, and
//! optionally attach a debug messenger. Everything is released in exact
//! reverse order, on failure as well as on release.
//!
//! No frame loop, no pipelines, no swapchain management — this crate ends
//! where rendering begins.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gpu_boot::{acquire, ContextConfig, Window};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     gpu_boot::foundation::logging::init();
//!
//!     let window = Window::new("probe", 800, 600)?;
//!     let config = ContextConfig::new("probe")
//!         .with_version(0, 1, 0)
//!         .with_diagnostics(true);
//!
//!     let mut context = acquire(&config, &window)?;
//!     log::info!(
//!         "context ready on \"{}\" (queue family {})",
//!         context.device_name(),
//!         context.queue_family_index()
//!     );
//!
//!     context.release()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod boot;
pub mod config;
pub mod foundation;
pub mod window;

pub use boot::{
    acquire, AcquisitionError, CapabilityKind, GraphicsContext, TeardownError, VulkanContext,
};
pub use config::{CapabilityRequests, ContextConfig};
pub use window::{Window, WindowError};
