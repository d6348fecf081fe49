//! Foundation module - shared utilities
//!
//! Small, dependency-light helpers used throughout the crate:
//! - Logging bootstrap

pub mod logging;
