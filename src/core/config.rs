//! Renderer configuration
//!
//! Loaded from JSON. Every field has a default, so `{}` is a valid config
//! that selects the basic variant at 512x512.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::render::properties::PropertyValue;

/// Construction-time settings for a [`Renderer`](crate::render::Renderer)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Variant registry name, e.g. `"mcm"`
    pub variant: String,
    /// Side of the square display target in pixels
    pub resolution: u32,
    /// Seed of the renderer's random state
    pub seed: u64,
    /// Property overrides applied before the first reset
    pub parameters: BTreeMap<String, PropertyValue>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            variant: "basic".to_string(),
            resolution: 512,
            seed: 0x5eed,
            parameters: BTreeMap::new(),
        }
    }
}

impl RendererConfig {
    pub fn new(variant: impl Into<String>, resolution: u32) -> Self {
        Self {
            variant: variant.into(),
            resolution,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!(
            "Loaded renderer config from {}: variant '{}' at {}px",
            path.display(),
            config.variant,
            config.resolution
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_json_is_default() {
        let config = RendererConfig::from_json("{}").unwrap();
        assert_eq!(config, RendererConfig::default());
    }

    #[test]
    fn test_parameters_parse_by_shape() {
        let json = r#"{
            "variant": "iso",
            "resolution": 256,
            "parameters": { "isovalue": 0.25, "light": [0.0, 1.0, 0.0], "random": false }
        }"#;
        let config = RendererConfig::from_json(json).unwrap();
        assert_eq!(config.variant, "iso");
        assert_eq!(config.resolution, 256);
        assert_eq!(config.parameters["isovalue"], PropertyValue::Number(0.25));
        assert_eq!(config.parameters["light"], PropertyValue::Vec3([0.0, 1.0, 0.0]));
        assert_eq!(config.parameters["random"], PropertyValue::Bool(false));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "variant": "mcm", "seed": 7 }}"#).unwrap();

        let config = RendererConfig::load(file.path()).unwrap();
        assert_eq!(config.variant, "mcm");
        assert_eq!(config.seed, 7);
        assert_eq!(config.resolution, 512);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(RendererConfig::from_json("{ \"resolution\": -1 }").is_err());
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = RendererConfig::new("eam", 128).with_seed(3);
        let back = RendererConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
