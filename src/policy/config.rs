use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scalar policy limits consumed by classification and budget accounting.
///
/// Every limit has a serde default so a partial TOML file works; the caller
/// owns the final values (this core never invents limits at call sites).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_max_create_count")]
    pub max_create_count: u32,
    #[serde(default = "default_max_duplicate_count")]
    pub max_duplicate_count: u32,
    #[serde(default = "default_max_named_targets")]
    pub max_named_targets: usize,
    #[serde(default = "default_max_delete_named")]
    pub max_delete_named: usize,
    /// Stand-in cardinality for "current selection" targets, since the true
    /// count lives in the host and is unknown here.
    #[serde(default = "default_selection_estimate")]
    pub selection_estimate: u64,
    #[serde(default = "default_max_session_change_units")]
    pub max_session_change_units: u64,
    #[serde(default = "default_max_brush_size")]
    pub max_brush_size: f64,
    #[serde(default = "default_max_brush_strength")]
    pub max_brush_strength: f64,
    #[serde(default = "default_allowed_classes")]
    pub allowed_classes: Vec<String>,
}

fn default_max_create_count() -> u32 {
    25
}

fn default_max_duplicate_count() -> u32 {
    10
}

fn default_max_named_targets() -> usize {
    25
}

fn default_max_delete_named() -> usize {
    10
}

fn default_selection_estimate() -> u64 {
    10
}

fn default_max_session_change_units() -> u64 {
    500
}

fn default_max_brush_size() -> f64 {
    4096.0
}

fn default_max_brush_strength() -> f64 {
    1.0
}

fn default_allowed_classes() -> Vec<String> {
    vec![
        "StaticMeshActor".into(),
        "PointLight".into(),
        "SpotLight".into(),
        "DirectionalLight".into(),
        "CameraActor".into(),
        "DecalActor".into(),
        "EmptyActor".into(),
        "FoliageActor".into(),
        "VolumeActor".into(),
    ]
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_create_count: default_max_create_count(),
            max_duplicate_count: default_max_duplicate_count(),
            max_named_targets: default_max_named_targets(),
            max_delete_named: default_max_delete_named(),
            selection_estimate: default_selection_estimate(),
            max_session_change_units: default_max_session_change_units(),
            max_brush_size: default_max_brush_size(),
            max_brush_strength: default_max_brush_strength(),
            allowed_classes: default_allowed_classes(),
        }
    }
}

impl PolicyConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(raw).map_err(|error| ConfigError::Load(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_create_count == 0 {
            return Err(ConfigError::Validation(
                "max_create_count must be >= 1".into(),
            ));
        }
        if self.max_duplicate_count == 0 {
            return Err(ConfigError::Validation(
                "max_duplicate_count must be >= 1".into(),
            ));
        }
        if self.max_named_targets == 0 {
            return Err(ConfigError::Validation(
                "max_named_targets must be >= 1".into(),
            ));
        }
        if self.max_delete_named == 0 {
            return Err(ConfigError::Validation(
                "max_delete_named must be >= 1".into(),
            ));
        }
        if self.selection_estimate == 0 {
            return Err(ConfigError::Validation(
                "selection_estimate must be >= 1".into(),
            ));
        }
        if self.max_session_change_units == 0 {
            return Err(ConfigError::Validation(
                "max_session_change_units must be >= 1".into(),
            ));
        }
        if !self.max_brush_size.is_finite() || self.max_brush_size <= 0.0 {
            return Err(ConfigError::Validation(
                "max_brush_size must be a positive finite number".into(),
            ));
        }
        if !self.max_brush_strength.is_finite() || self.max_brush_strength <= 0.0 {
            return Err(ConfigError::Validation(
                "max_brush_strength must be a positive finite number".into(),
            ));
        }
        Ok(())
    }
}
