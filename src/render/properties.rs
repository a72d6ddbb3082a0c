//! Renderer tunables and their editor-facing descriptors
//!
//! Each variant publishes a table of [`PropertyDescriptor`]s. The table is
//! serializable so an external property editor can build widgets from it, and
//! each entry declares what a change to it costs the pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::render::params::{ParameterChange, ParameterEffect};

/// Entries in a transfer-function lookup table
pub const TRANSFER_FUNCTION_SIZE: usize = 256;

/// Widget an editor should present
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyKind {
    Spinner,
    Slider,
    Checkbox,
    Color,
    Vector,
    TransferFunction,
}

/// Property value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Vec3([f32; 3]),
    /// RGBA8 lookup table of [`TRANSFER_FUNCTION_SIZE`] entries
    TransferFunction(Vec<u8>),
}

impl PropertyValue {
    fn fits(&self, kind: PropertyKind) -> bool {
        match (self, kind) {
            (Self::Number(_), PropertyKind::Spinner | PropertyKind::Slider) => true,
            (Self::Bool(_), PropertyKind::Checkbox) => true,
            (Self::Vec3(_), PropertyKind::Color | PropertyKind::Vector) => true,
            (Self::TransferFunction(t), PropertyKind::TransferFunction) => {
                t.len() == TRANSFER_FUNCTION_SIZE * 4
            }
            _ => false,
        }
    }
}

/// Editor-facing description of one tunable
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: PropertyKind,
    pub default: PropertyValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub effect: ParameterEffect,
}

impl PropertyDescriptor {
    pub fn number(name: &'static str, label: &'static str, kind: PropertyKind, default: f64) -> Self {
        Self {
            name,
            label,
            kind,
            default: PropertyValue::Number(default),
            min: None,
            max: None,
            effect: ParameterEffect::Reset,
        }
    }

    pub fn bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn effect(mut self, effect: ParameterEffect) -> Self {
        self.effect = effect;
        self
    }
}

/// Current tunable values of one renderer
#[derive(Clone, Debug)]
pub struct Properties {
    descriptors: Vec<PropertyDescriptor>,
    values: BTreeMap<&'static str, PropertyValue>,
}

impl Properties {
    /// Start every property at its default
    pub fn new(descriptors: Vec<PropertyDescriptor>) -> Self {
        let values = descriptors.iter().map(|d| (d.name, d.default.clone())).collect();
        Self { descriptors, values }
    }

    pub fn descriptors(&self) -> &[PropertyDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&PropertyValue> {
        self.values
            .get(name)
            .ok_or_else(|| Error::config(format!("unknown property '{}'", name)))
    }

    pub fn number(&self, name: &str) -> Result<f32> {
        match self.get(name)? {
            PropertyValue::Number(v) => Ok(*v as f32),
            other => Err(type_error(name, "number", other)),
        }
    }

    /// Numeric property rounded to a non-negative integer
    pub fn count(&self, name: &str) -> Result<u32> {
        Ok(self.number(name)?.round().max(0.0) as u32)
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Ok(*v),
            other => Err(type_error(name, "bool", other)),
        }
    }

    pub fn vec3(&self, name: &str) -> Result<[f32; 3]> {
        match self.get(name)? {
            PropertyValue::Vec3(v) => Ok(*v),
            other => Err(type_error(name, "vec3", other)),
        }
    }

    pub fn transfer_function(&self, name: &str) -> Result<&[u8]> {
        match self.get(name)? {
            PropertyValue::TransferFunction(t) => Ok(t),
            other => Err(type_error(name, "transfer function", other)),
        }
    }

    /// Store a new value and describe the change
    ///
    /// Numbers are clamped into the descriptor's bounds. Unknown names and
    /// values of the wrong shape are configuration errors.
    pub fn set(&mut self, name: &str, value: PropertyValue) -> Result<ParameterChange> {
        let descriptor = self
            .descriptor(name)
            .ok_or_else(|| Error::config(format!("unknown property '{}'", name)))?;
        if !value.fits(descriptor.kind) {
            return Err(Error::config(format!(
                "value {:?} does not fit {:?} property '{}'",
                value, descriptor.kind, name
            )));
        }

        let value = match value {
            PropertyValue::Number(v) => {
                let clamped = descriptor.min.map_or(v, |min| v.max(min));
                let clamped = descriptor.max.map_or(clamped, |max| clamped.min(max));
                if clamped != v {
                    log::warn!("Property '{}' value {} clamped to {}", name, v, clamped);
                }
                PropertyValue::Number(clamped)
            }
            other => other,
        };

        let key = descriptor.name;
        let default = descriptor.default.clone();
        let old = self.values.insert(key, value.clone()).unwrap_or(default);
        Ok(ParameterChange::new(name, old, value))
    }

    /// Export descriptors as JSON for an external editor
    pub fn descriptors_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.descriptors)?)
    }
}

fn type_error(name: &str, expected: &str, found: &PropertyValue) -> Error {
    Error::config(format!("property '{}' is not a {} (found {:?})", name, expected, found))
}

/// Default transfer function: white with linearly rising opacity
pub fn default_transfer_function() -> Vec<u8> {
    (0..TRANSFER_FUNCTION_SIZE)
        .flat_map(|i| [255, 255, 255, i as u8])
        .collect()
}

/// Descriptors shared across variants
pub mod descriptors {
    use super::*;

    pub fn extinction() -> PropertyDescriptor {
        PropertyDescriptor::number("extinction", "Extinction", PropertyKind::Spinner, 1.0)
            .bounds(Some(0.0), None)
    }

    pub fn anisotropy() -> PropertyDescriptor {
        PropertyDescriptor::number("anisotropy", "Anisotropy", PropertyKind::Slider, 0.0)
            .bounds(Some(-1.0), Some(1.0))
    }

    pub fn bounces() -> PropertyDescriptor {
        PropertyDescriptor::number("bounces", "Max bounces", PropertyKind::Spinner, 8.0)
            .bounds(Some(0.0), None)
    }

    pub fn steps(name: &'static str, label: &'static str, default: f64) -> PropertyDescriptor {
        PropertyDescriptor::number(name, label, PropertyKind::Spinner, default)
            .bounds(Some(1.0), None)
    }

    pub fn transfer_function() -> PropertyDescriptor {
        PropertyDescriptor {
            name: "transferFunction",
            label: "Transfer function",
            kind: PropertyKind::TransferFunction,
            default: PropertyValue::TransferFunction(default_transfer_function()),
            min: None,
            max: None,
            effect: ParameterEffect::Reset,
        }
    }

    /// Tone-mapping exposure applied by the render stage only
    pub fn exposure() -> PropertyDescriptor {
        PropertyDescriptor::number("exposure", "Exposure", PropertyKind::Spinner, 1.0)
            .bounds(Some(0.0), None)
            .effect(ParameterEffect::Ignore)
    }

    pub fn fovea_x() -> PropertyDescriptor {
        PropertyDescriptor::number("foveaX", "Fovea X", PropertyKind::Slider, 0.5)
            .bounds(Some(0.0), Some(1.0))
            .effect(ParameterEffect::RebuildDerivedBuffer)
    }

    pub fn fovea_y() -> PropertyDescriptor {
        PropertyDescriptor::number("foveaY", "Fovea Y", PropertyKind::Slider, 0.5)
            .bounds(Some(0.0), Some(1.0))
            .effect(ParameterEffect::RebuildDerivedBuffer)
    }

    pub fn fovea_radius() -> PropertyDescriptor {
        PropertyDescriptor::number("foveaRadius", "Fovea radius", PropertyKind::Slider, 0.15)
            .bounds(Some(0.01), Some(1.0))
            .effect(ParameterEffect::RebuildDerivedBuffer)
    }

    pub fn checkbox(name: &'static str, label: &'static str, default: bool) -> PropertyDescriptor {
        PropertyDescriptor {
            name,
            label,
            kind: PropertyKind::Checkbox,
            default: PropertyValue::Bool(default),
            min: None,
            max: None,
            effect: ParameterEffect::Reset,
        }
    }

    pub fn color(name: &'static str, label: &'static str, default: [f32; 3], kind: PropertyKind) -> PropertyDescriptor {
        PropertyDescriptor {
            name,
            label,
            kind,
            default: PropertyValue::Vec3(default),
            min: None,
            max: None,
            effect: ParameterEffect::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> Properties {
        Properties::new(vec![
            descriptors::extinction(),
            descriptors::anisotropy(),
            descriptors::bounces(),
            descriptors::transfer_function(),
            descriptors::color("diffuse", "Diffuse", [1.0, 1.0, 1.0], PropertyKind::Color),
        ])
    }

    #[test]
    fn test_defaults() {
        let props = props();
        assert_eq!(props.number("extinction").unwrap(), 1.0);
        assert_eq!(props.count("bounces").unwrap(), 8);
        assert_eq!(props.transfer_function("transferFunction").unwrap().len(), 1024);
        assert_eq!(props.vec3("diffuse").unwrap(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_set_reports_old_and_new() {
        let mut props = props();
        let change = props.set("extinction", PropertyValue::Number(4.0)).unwrap();
        assert_eq!(change.old, PropertyValue::Number(1.0));
        assert_eq!(change.new, PropertyValue::Number(4.0));
        assert_eq!(props.number("extinction").unwrap(), 4.0);
    }

    #[test]
    fn test_set_clamps_to_bounds() {
        let mut props = props();
        let change = props.set("anisotropy", PropertyValue::Number(3.0)).unwrap();
        assert_eq!(change.new, PropertyValue::Number(1.0));
    }

    #[test]
    fn test_unknown_property_rejected() {
        let mut props = props();
        assert!(props.set("nope", PropertyValue::Number(1.0)).unwrap_err().is_configuration());
        assert!(props.number("nope").is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut props = props();
        assert!(props.set("extinction", PropertyValue::Bool(true)).is_err());
        assert!(props
            .set("transferFunction", PropertyValue::TransferFunction(vec![0; 10]))
            .is_err());
        assert!(props.flag("extinction").is_err());
    }

    #[test]
    fn test_descriptor_json_lists_properties() {
        let json = props().descriptors_json().unwrap();
        assert!(json.contains("\"name\": \"anisotropy\""));
        assert!(json.contains("\"kind\": \"slider\""));
        assert!(json.contains("\"effect\": \"reset\""));
    }

    #[test]
    fn test_value_json_shapes() {
        let v: PropertyValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, PropertyValue::Number(2.5));
        let v: PropertyValue = serde_json::from_str("[1.0, 0.5, 0.0]").unwrap();
        assert_eq!(v, PropertyValue::Vec3([1.0, 0.5, 0.0]));
        let v: PropertyValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, PropertyValue::Bool(true));
    }
}
