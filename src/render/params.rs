//! Parameter-change commands and the rule deciding their effect

use serde::{Deserialize, Serialize};

use crate::render::properties::{PropertyDescriptor, PropertyValue};

/// What a parameter change requires of the pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterEffect {
    /// Cosmetic: picked up by the next render, accumulation stays valid
    Ignore,
    /// Sampling-relevant: accumulated samples are invalid, start over
    Reset,
    /// A derived buffer (target layout, importance map) must be rebuilt,
    /// then accumulation restarts
    RebuildDerivedBuffer,
}

/// One synchronous parameter-change notification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterChange {
    pub name: String,
    pub old: PropertyValue,
    pub new: PropertyValue,
}

impl ParameterChange {
    pub fn new(name: impl Into<String>, old: PropertyValue, new: PropertyValue) -> Self {
        Self {
            name: name.into(),
            old,
            new,
        }
    }
}

/// Decide what a change requires
///
/// A change that leaves the value unchanged, or names a property the
/// descriptors do not know, is ignored. Otherwise the descriptor's declared
/// effect applies.
pub fn decide(descriptors: &[PropertyDescriptor], change: &ParameterChange) -> ParameterEffect {
    if change.old == change.new {
        return ParameterEffect::Ignore;
    }
    descriptors
        .iter()
        .find(|d| d.name == change.name)
        .map_or(ParameterEffect::Ignore, |d| d.effect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::properties::descriptors;

    fn table() -> Vec<PropertyDescriptor> {
        vec![
            descriptors::extinction(),
            descriptors::exposure(),
            descriptors::fovea_x(),
        ]
    }

    #[test]
    fn test_sampling_parameter_resets() {
        let change = ParameterChange::new("extinction", PropertyValue::Number(1.0), PropertyValue::Number(2.0));
        assert_eq!(decide(&table(), &change), ParameterEffect::Reset);
    }

    #[test]
    fn test_cosmetic_parameter_ignored() {
        let change = ParameterChange::new("exposure", PropertyValue::Number(1.0), PropertyValue::Number(2.0));
        assert_eq!(decide(&table(), &change), ParameterEffect::Ignore);
    }

    #[test]
    fn test_fovea_rebuilds() {
        let change = ParameterChange::new("foveaX", PropertyValue::Number(0.5), PropertyValue::Number(0.2));
        assert_eq!(decide(&table(), &change), ParameterEffect::RebuildDerivedBuffer);
    }

    #[test]
    fn test_unchanged_value_ignored() {
        let change = ParameterChange::new("extinction", PropertyValue::Number(1.0), PropertyValue::Number(1.0));
        assert_eq!(decide(&table(), &change), ParameterEffect::Ignore);
    }

    #[test]
    fn test_unknown_name_ignored() {
        let change = ParameterChange::new("bogus", PropertyValue::Number(1.0), PropertyValue::Number(2.0));
        assert_eq!(decide(&table(), &change), ParameterEffect::Ignore);
    }
}
