//! Device probe
//!
//! Brings a Vulkan context up with diagnostics enabled, prints the
//! capability report, and tears everything down in order. Pass `--hold`
//! to keep the window open (close it or press Escape to exit).

use glfw::{Action, Key, WindowEvent};
use gpu_boot::{acquire, ContextConfig, Window};

fn run(hold: bool) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("creating window...");
    let mut window = Window::new("Device Probe", 800, 600)?;

    let config = ContextConfig::new("device_probe")
        .with_version(0, 1, 0)
        .with_diagnostics(true);

    log::info!("acquiring graphics context...");
    let mut context = acquire(&config, &window)?;
    log::info!(
        "context ready: \"{}\", queue family {} ({} queues), debug messenger {}",
        context.device_name(),
        context.queue_family_index(),
        context.queue_count(),
        if context.has_debug_messenger() {
            "attached"
        } else {
            "absent"
        },
    );

    if hold {
        log::info!("holding window open; press Escape or close the window to exit");
        while !window.should_close() {
            window.poll_events();
            let mut close = false;
            for (_, event) in window.flush_events() {
                match event {
                    WindowEvent::Key(Key::Escape, _, Action::Press, _) => close = true,
                    WindowEvent::Close => close = true,
                    _ => {}
                }
            }
            if close {
                window.set_should_close(true);
            }
        }
    }

    log::info!("releasing graphics context...");
    context.release()?;
    log::info!("done");
    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let hold = std::env::args().any(|arg| arg == "--hold");

    if let Err(error) = run(hold) {
        log::error!("device probe failed: {error}");
        std::process::exit(1);
    }
}
