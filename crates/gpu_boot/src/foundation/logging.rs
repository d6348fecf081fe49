//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system with defaults from the environment
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with an explicit default level
///
/// The `RUST_LOG` environment variable still overrides the given level.
pub fn init_with_level(level: log::LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
