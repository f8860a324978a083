//! Solver settings
//!
//! Global tuning knobs of the dynamics backend, persisted as JSON.
//! Missing fields fall back to defaults, so a settings file only needs to
//! name what it changes.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Solver stiffness presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SolverPreset {
    Soft,
    #[default]
    Balanced,
    Stiff,
}

impl SolverPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverPreset::Soft => "Soft",
            SolverPreset::Balanced => "Balanced",
            SolverPreset::Stiff => "Stiff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "soft" => Some(SolverPreset::Soft),
            "balanced" | "default" => Some(SolverPreset::Balanced),
            "stiff" | "hard" => Some(SolverPreset::Stiff),
            _ => None,
        }
    }

    /// Constraint force mixing for this preset
    pub fn cfm(&self) -> f32 {
        match self {
            SolverPreset::Soft => 1.0e-3,
            SolverPreset::Balanced => 1.0e-5,
            SolverPreset::Stiff => 1.0e-9,
        }
    }

    /// Error reduction parameter for this preset
    pub fn erp(&self) -> f32 {
        match self {
            SolverPreset::Soft => 0.1,
            SolverPreset::Balanced => 0.2,
            SolverPreset::Stiff => 0.8,
        }
    }
}

/// Solver-global tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Preset the CFM/ERP values came from
    pub preset: SolverPreset,

    /// Gravity in the simulation plane
    pub gravity: Vec2,
    /// Constraint force mixing
    pub cfm: f32,
    /// Error reduction parameter
    pub erp: f32,

    // === Contacts ===
    /// Maximum velocity a contact may introduce to correct penetration
    pub contact_max_correcting_vel: f32,
    /// Depth bodies may sink into each other before correction kicks in
    pub contact_surface_layer: f32,

    // === Auto-disable ===
    /// Stop integrating bodies that come to rest
    pub auto_disable: bool,
    /// Linear speed below which a body counts as resting
    pub auto_disable_linear_threshold: f32,
    /// Angular speed below which a body counts as resting
    pub auto_disable_angular_threshold: f32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        let preset = SolverPreset::Balanced;
        Self {
            preset,

            gravity: Vec2::new(0.0, -9.81),
            cfm: preset.cfm(),
            erp: preset.erp(),

            contact_max_correcting_vel: 100.0,
            contact_surface_layer: 0.001,

            auto_disable: false,
            auto_disable_linear_threshold: 0.01,
            auto_disable_angular_threshold: 0.01,
        }
    }
}

impl SolverSettings {
    /// Create settings from a preset (applies preset CFM/ERP)
    pub fn from_preset(preset: SolverPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a preset (overwrites CFM and ERP)
    pub fn apply_preset(&mut self, preset: SolverPreset) {
        self.preset = preset;
        self.cfm = preset.cfm();
        self.erp = preset.erp();
    }

    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize settings to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded solver settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhysicsError;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = SolverSettings::from_json(r#"{ "erp": 0.5, "auto_disable": true }"#).unwrap();
        assert_eq!(settings.erp, 0.5);
        assert!(settings.auto_disable);
        assert_eq!(settings.cfm, SolverSettings::default().cfm);
        assert_eq!(settings.gravity, Vec2::new(0.0, -9.81));
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = SolverSettings::from_preset(SolverPreset::Stiff);
        settings.gravity = Vec2::new(1.0, 2.0);
        let json = settings.to_json().unwrap();
        assert_eq!(SolverSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = SolverSettings::from_json("{ erp: ").unwrap_err();
        assert!(matches!(err, PhysicsError::Json(_)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = SolverSettings::load("/nonexistent/flatland/settings.json").unwrap_err();
        assert!(matches!(err, PhysicsError::Io(_)));
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(SolverPreset::parse("SOFT"), Some(SolverPreset::Soft));
        assert_eq!(SolverPreset::parse("hard"), Some(SolverPreset::Stiff));
        assert_eq!(SolverPreset::parse("wobbly"), None);
        assert_eq!(SolverPreset::Balanced.as_str(), "Balanced");
    }

    #[test]
    fn test_apply_preset_overwrites_cfm_erp() {
        let mut settings = SolverSettings::default();
        settings.apply_preset(SolverPreset::Soft);
        assert_eq!(settings.cfm, SolverPreset::Soft.cfm());
        assert_eq!(settings.erp, SolverPreset::Soft.erp());
    }
}
