//! Bridge settings
//!
//! The coordinate constants between host and simulation are empirically
//! matched, so they live here rather than being re-derived in code.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::BridgeError;

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeSettings {
    // === Timing ===
    /// Simulation tick period in seconds
    pub fixed_period: f64,
    /// Cap on ticks run per host frame; excess ticks stay in the backlog
    pub max_steps_per_update: Option<u32>,

    // === Coordinates ===
    /// Simulation units → host render units
    pub geometry_scale: f32,
    /// Host collider dimensions → simulation surface units
    pub collider_extent_scale: f32,
    /// Map normals through the inverse-transpose of the host transform
    pub transform_normals: bool,

    // === Geometry ===
    /// Triangle capacity of each character's vertex buffer
    pub max_triangles: usize,

    // === Colliders ===
    /// Re-send collider transforms to the simulation every frame
    pub track_collider_motion: bool,

    // === Session ===
    /// Logical name of the simulation asset
    pub rom_resource: String,
    /// Base ground triangle registered at session start
    pub ground: [[i32; 3]; 3],
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            fixed_period: FIXED_PERIOD,
            max_steps_per_update: None,

            geometry_scale: GEOMETRY_SCALE,
            collider_extent_scale: COLLIDER_EXTENT_SCALE,
            transform_normals: false,

            max_triangles: MAX_TRIANGLES,

            track_collider_motion: false,

            rom_resource: ROM_RESOURCE.to_string(),
            ground: GROUND_TRIANGLE,
        }
    }
}

impl BridgeSettings {
    /// Parse and validate settings JSON; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if !self.fixed_period.is_finite() || self.fixed_period <= 0.0 {
            return Err(BridgeError::InvalidSettings(format!(
                "fixed_period must be positive, got {}",
                self.fixed_period
            )));
        }
        if !(self.geometry_scale > 0.0) || !(self.collider_extent_scale > 0.0) {
            return Err(BridgeError::InvalidSettings(
                "geometry_scale and collider_extent_scale must be positive".to_string(),
            ));
        }
        // Index buffer is u16
        let max = u16::MAX as usize / 3;
        if self.max_triangles == 0 || self.max_triangles > max {
            return Err(BridgeError::InvalidSettings(format!(
                "max_triangles must be in 1..={max}, got {}",
                self.max_triangles
            )));
        }
        if self.max_steps_per_update == Some(0) {
            return Err(BridgeError::InvalidSettings(
                "max_steps_per_update must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = BridgeSettings::default();
        settings.validate().unwrap();
        assert!((settings.fixed_period - 1.0 / 30.0).abs() < 1e-12);
        assert_eq!(settings.geometry_scale, 0.01);
        assert_eq!(settings.ground[0], [-2000, 130, -2000]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = BridgeSettings::from_json_str(r#"{ "max_triangles": 256 }"#).unwrap();
        assert_eq!(settings.max_triangles, 256);
        assert_eq!(settings.rom_resource, "sm64.z64");
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = BridgeSettings::default();
        settings.track_collider_motion = true;
        let parsed = BridgeSettings::from_json_str(&settings.to_json().unwrap()).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(
            BridgeSettings::from_json_str(r#"{ "tick_rate": 60 }"#),
            Err(BridgeError::SettingsParse(_))
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        for json in [
            r#"{ "fixed_period": 0.0 }"#,
            r#"{ "geometry_scale": -1.0 }"#,
            r#"{ "max_triangles": 0 }"#,
            r#"{ "max_triangles": 40000 }"#,
            r#"{ "max_steps_per_update": 0 }"#,
        ] {
            assert!(
                matches!(BridgeSettings::from_json_str(json), Err(BridgeError::InvalidSettings(_))),
                "{json} should be rejected"
            );
        }
    }
}
