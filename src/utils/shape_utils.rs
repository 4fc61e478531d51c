//! Shape classification
//!
//! Every detector tags its regions with a shape label derived from size and
//! aspect ratio. The thresholds differ per detector, so they live in named
//! profiles loaded from `shape_profiles.toml` rather than in code.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::warn;

use crate::coordinate::BoundingBox;
use crate::errors::{RegionError, RegionResult};

lazy_static! {
    // Parse the embedded profile table once
    static ref SHAPE_PROFILES: ShapeProfiles = {
        let content = include_str!("../../shape_profiles.toml");
        ShapeProfiles::from_str(content).unwrap_or_else(|e| {
            warn!("Failed to parse shape profiles: {}", e);
            ShapeProfiles::default()
        })
    };
}

/// Profile used by contour, flood-fill and edge detectors
pub const GENERIC_PROFILE: &str = "generic";
/// Profile used by the solid-color card detector
pub const CARD_PROFILE: &str = "card";
/// Profile used for cloud analyzer objects
pub const CLOUD_PROFILE: &str = "cloud";

/// One ordered classification rule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeRule {
    pub label: String,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub min_area: Option<u64>,
    pub min_aspect: Option<f64>,
    pub max_aspect: Option<f64>,
    pub square_tolerance: Option<f64>,
}

impl ShapeRule {
    /// Whether every condition of the rule holds for the box
    pub fn matches(&self, bbox: &BoundingBox) -> bool {
        let aspect = bbox.aspect_ratio();

        self.max_width.map_or(true, |v| bbox.width <= v)
            && self.max_height.map_or(true, |v| bbox.height <= v)
            && self.min_width.map_or(true, |v| bbox.width >= v)
            && self.min_height.map_or(true, |v| bbox.height >= v)
            && self.min_area.map_or(true, |v| bbox.area() >= v)
            && self.min_aspect.map_or(true, |v| aspect > v)
            && self.max_aspect.map_or(true, |v| aspect < v)
            && self.square_tolerance.map_or(true, |v| (aspect - 1.0).abs() < v)
    }
}

/// A named, ordered rule list with a fallback label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeProfile {
    pub rules: Vec<ShapeRule>,
    pub fallback: String,
}

impl ShapeProfile {
    /// Label of the first matching rule, or the fallback
    pub fn classify(&self, bbox: &BoundingBox) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matches(bbox))
            .map(|rule| rule.label.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

/// Collection of named shape profiles
#[derive(Debug, Default)]
pub struct ShapeProfiles {
    profiles: HashMap<String, ShapeProfile>,
}

impl ShapeProfiles {
    /// Parse profiles from a TOML string
    pub fn from_str(content: &str) -> RegionResult<Self> {
        let table: toml::Table = match toml::from_str(content) {
            Ok(value) => value,
            Err(e) => return Err(RegionError::ConfigError(format!("Failed to parse TOML: {}", e))),
        };

        let mut profiles = HashMap::new();
        for (name, value) in &table {
            profiles.insert(name.clone(), Self::parse_profile(name, value)?);
        }

        Ok(ShapeProfiles { profiles })
    }

    fn parse_profile(name: &str, value: &toml::Value) -> RegionResult<ShapeProfile> {
        let fallback = value.get("fallback")
            .and_then(|v| v.as_str())
            .unwrap_or("region")
            .to_string();

        let mut rules = Vec::new();
        if let Some(entries) = value.get("rules").and_then(|v| v.as_array()) {
            for entry in entries {
                let label = entry.get("label")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| RegionError::ConfigError(
                        format!("Rule without label in profile '{}'", name)))?;

                rules.push(ShapeRule {
                    label: label.to_string(),
                    max_width: Self::read_u32(entry, "max_width"),
                    max_height: Self::read_u32(entry, "max_height"),
                    min_width: Self::read_u32(entry, "min_width"),
                    min_height: Self::read_u32(entry, "min_height"),
                    min_area: entry.get("min_area").and_then(|v| v.as_integer()).map(|v| v.max(0) as u64),
                    min_aspect: Self::read_f64(entry, "min_aspect"),
                    max_aspect: Self::read_f64(entry, "max_aspect"),
                    square_tolerance: Self::read_f64(entry, "square_tolerance"),
                });
            }
        }

        Ok(ShapeProfile { rules, fallback })
    }

    fn read_u32(entry: &toml::Value, key: &str) -> Option<u32> {
        entry.get(key).and_then(|v| v.as_integer()).map(|v| v.clamp(0, u32::MAX as i64) as u32)
    }

    fn read_f64(entry: &toml::Value, key: &str) -> Option<f64> {
        entry.get(key).and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Option<&ShapeProfile> {
        self.profiles.get(name)
    }
}

/// Classify a box with a named profile from the embedded table
///
/// Unknown profile names yield `"region"`.
pub fn classify_shape(profile: &str, bbox: &BoundingBox) -> String {
    match SHAPE_PROFILES.get(profile) {
        Some(p) => p.classify(bbox).to_string(),
        None => {
            warn!("Unknown shape profile '{}'", profile);
            "region".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_profiles_load() {
        for name in [GENERIC_PROFILE, CARD_PROFILE, CLOUD_PROFILE] {
            assert!(SHAPE_PROFILES.get(name).is_some(), "missing profile {}", name);
        }
    }

    #[test]
    fn test_generic_profile_table() {
        let c = |w, h| classify_shape(GENERIC_PROFILE, &BoundingBox::new(0, 0, w, h));
        assert_eq!(c(40, 40), "icon");
        assert_eq!(c(90, 80), "avatar");
        assert_eq!(c(400, 100), "banner");
        assert_eq!(c(50, 300), "sidebar");
        assert_eq!(c(200, 150), "card");
        assert_eq!(c(120, 40), "button");
        assert_eq!(c(100, 60), "component");
    }

    #[test]
    fn test_icon_cutoff_differs_between_profiles() {
        let bbox = BoundingBox::new(0, 0, 60, 60);
        assert_eq!(classify_shape(CLOUD_PROFILE, &bbox), "icon");
        assert_ne!(classify_shape(GENERIC_PROFILE, &bbox), "icon");
    }

    #[test]
    fn test_card_profile_table() {
        let c = |w, h| classify_shape(CARD_PROFILE, &BoundingBox::new(0, 0, w, h));
        assert_eq!(c(70, 70), "widget");
        assert_eq!(c(300, 100), "banner");
        assert_eq!(c(60, 200), "vertical-card");
        assert_eq!(c(120, 110), "square-card");
        assert_eq!(c(400, 200), "dashboard-card");
        assert_eq!(c(150, 90), "card");
    }

    #[test]
    fn test_unknown_profile() {
        assert_eq!(classify_shape("nope", &BoundingBox::new(0, 0, 10, 10)), "region");
    }

    #[test]
    fn test_rule_without_label_is_rejected() {
        let result = ShapeProfiles::from_str("[p]\nfallback = \"x\"\n[[p.rules]]\nmax_width = 3\n");
        assert!(matches!(result, Err(RegionError::ConfigError(_))));
    }
}
