//! Context configuration
//!
//! Applications describe what they want from the context — name, version,
//! requested capability names, diagnostics — through one structure instead
//! of editing the acquisition sequence itself. Configurations can be built
//! in code or loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Validation layer requested (as an optional) when diagnostics are on
pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Instance extension backing the debug messenger
pub const DEBUG_UTILS_EXTENSION: &str = "VK_EXT_debug_utils";

/// Device extension required by default: a presentation surface is part of
/// this contract, and every consumer of the context will want a swapchain
pub const SWAPCHAIN_EXTENSION: &str = "VK_KHR_swapchain";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing the file failed
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Capability names to negotiate for one scope (instance or device)
///
/// Optional names are enabled only when available; required names abort
/// acquisition when the enumeration sweep never offers them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityRequests {
    /// Layers enabled only if available
    #[serde(default)]
    pub optional_layers: Vec<String>,
    /// Layers that must be available
    #[serde(default)]
    pub required_layers: Vec<String>,
    /// Extensions enabled only if available
    #[serde(default)]
    pub optional_extensions: Vec<String>,
    /// Extensions that must be available
    #[serde(default)]
    pub required_extensions: Vec<String>,
}

/// Configuration for one context acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Application name baked into instance creation
    pub application_name: String,
    /// Application version (major, minor, patch)
    #[serde(default = "default_version")]
    pub application_version: (u32, u32, u32),
    /// Whether to enable validation and the debug messenger;
    /// `None` auto-detects based on the build profile
    #[serde(default)]
    pub diagnostics: Option<bool>,
    /// Instance-level capability requests
    #[serde(default)]
    pub instance: CapabilityRequests,
    /// Device-level capability requests
    #[serde(default = "CapabilityRequests::device_defaults")]
    pub device: CapabilityRequests,
}

fn default_version() -> (u32, u32, u32) {
    (1, 0, 0)
}

impl CapabilityRequests {
    /// Device-scope defaults: swapchain support is required
    pub fn device_defaults() -> Self {
        Self {
            required_extensions: vec![SWAPCHAIN_EXTENSION.to_owned()],
            ..Self::default()
        }
    }
}

impl ContextConfig {
    /// Create a configuration with defaults for the given application name
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            application_version: default_version(),
            diagnostics: None, // Auto-detect based on debug build
            instance: CapabilityRequests::default(),
            device: CapabilityRequests::device_defaults(),
        }
    }

    /// Set application version
    pub fn with_version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.application_version = (major, minor, patch);
        self
    }

    /// Enable or disable diagnostics explicitly
    pub fn with_diagnostics(mut self, enable: bool) -> Self {
        self.diagnostics = Some(enable);
        self
    }

    /// Request an optional instance layer
    pub fn with_optional_layer(mut self, name: impl Into<String>) -> Self {
        self.instance.optional_layers.push(name.into());
        self
    }

    /// Require an instance layer
    pub fn with_required_layer(mut self, name: impl Into<String>) -> Self {
        self.instance.required_layers.push(name.into());
        self
    }

    /// Request an optional instance extension
    pub fn with_optional_extension(mut self, name: impl Into<String>) -> Self {
        self.instance.optional_extensions.push(name.into());
        self
    }

    /// Require an instance extension
    pub fn with_required_extension(mut self, name: impl Into<String>) -> Self {
        self.instance.required_extensions.push(name.into());
        self
    }

    /// Require a device extension
    pub fn with_required_device_extension(mut self, name: impl Into<String>) -> Self {
        self.device.required_extensions.push(name.into());
        self
    }

    /// Resolved diagnostics setting
    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics.unwrap_or(cfg!(debug_assertions))
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

impl Default for ContextConfig {
    /// Default configuration for a generic Vulkan application
    fn default() -> Self {
        Self::new("Rust Vulkan Application")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_require_swapchain() {
        let config = ContextConfig::new("test");
        assert_eq!(config.application_version, (1, 0, 0));
        assert!(config.instance.required_layers.is_empty());
        assert_eq!(
            config.device.required_extensions,
            vec![SWAPCHAIN_EXTENSION.to_owned()]
        );
    }

    #[test]
    fn builder_accumulates_requests() {
        let config = ContextConfig::new("test")
            .with_version(2, 3, 4)
            .with_diagnostics(true)
            .with_required_layer("layer_a")
            .with_optional_extension("ext_a")
            .with_required_extension("ext_b");

        assert_eq!(config.application_version, (2, 3, 4));
        assert!(config.diagnostics_enabled());
        assert_eq!(config.instance.required_layers, vec!["layer_a".to_owned()]);
        assert_eq!(config.instance.optional_extensions, vec!["ext_a".to_owned()]);
        assert_eq!(config.instance.required_extensions, vec!["ext_b".to_owned()]);
    }

    #[test]
    fn parses_from_toml() {
        let config: ContextConfig = toml::from_str(
            r#"
            application_name = "probe"
            application_version = [0, 2, 1]
            diagnostics = true

            [instance]
            required_extensions = ["VK_KHR_surface"]

            [device]
            required_extensions = ["VK_KHR_swapchain"]
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.application_name, "probe");
        assert_eq!(config.application_version, (0, 2, 1));
        assert_eq!(config.diagnostics, Some(true));
        assert_eq!(
            config.instance.required_extensions,
            vec!["VK_KHR_surface".to_owned()]
        );
    }

    #[test]
    fn omitted_sections_fall_back_to_defaults() {
        let config: ContextConfig = toml::from_str(r#"application_name = "bare""#)
            .expect("config should parse");

        assert_eq!(config.application_version, (1, 0, 0));
        assert_eq!(config.diagnostics, None);
        assert_eq!(
            config.device.required_extensions,
            vec![SWAPCHAIN_EXTENSION.to_owned()]
        );
    }
}
