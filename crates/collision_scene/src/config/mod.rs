//! Configuration system
//!
//! Scene-wide settings that can be loaded from TOML or RON files. Every config
//! has a sensible `Default`, so a missing file is never fatal for callers that
//! fall back to defaults.

pub use serde::{Serialize, Deserialize};

use crate::scene::RadiusEstimate;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Frustum culling settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CullingConfig {
    /// How the world-space bounding sphere radius is derived from the world transform
    pub radius_estimate: RadiusEstimate,
}

/// Bounding volume hierarchy build settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// A node holding this many triangles or fewer becomes a leaf
    pub max_triangles_per_leaf: usize,

    /// Maximum subdivision depth (root is depth 0)
    pub max_depth: u32,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_triangles_per_leaf: 4,
            max_depth: 16,
        }
    }
}

/// Top-level scene configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SceneConfig {
    /// Culling settings
    pub culling: CullingConfig,

    /// BVH build settings used when models are created
    pub bvh: BvhConfig,
}

impl Config for CullingConfig {}
impl Config for BvhConfig {}
impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str) -> NamedTempFile {
        tempfile::Builder::new()
            .prefix("collision_scene_")
            .suffix(suffix)
            .tempfile()
            .unwrap()
    }

    fn path_of(file: &NamedTempFile) -> &str {
        file.path().to_str().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.culling.radius_estimate, RadiusEstimate::MaxDiagonal);
        assert_eq!(config.bvh.max_triangles_per_leaf, 4);
        assert_eq!(config.bvh.max_depth, 16);
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let file = temp_file(".toml");
        let config = SceneConfig {
            culling: CullingConfig { radius_estimate: RadiusEstimate::MaxColumnNorm },
            bvh: BvhConfig { max_triangles_per_leaf: 2, max_depth: 5 },
        };

        config.save_to_file(path_of(&file)).unwrap();
        let loaded = SceneConfig::load_from_file(path_of(&file)).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_roundtrip_through_file() {
        let file = temp_file(".ron");
        let config = SceneConfig {
            bvh: BvhConfig { max_triangles_per_leaf: 8, max_depth: 3 },
            ..Default::default()
        };

        config.save_to_file(path_of(&file)).unwrap();
        let loaded = SceneConfig::load_from_file(path_of(&file)).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SceneConfig = toml::from_str("[bvh]\nmax_depth = 2\n").unwrap();
        assert_eq!(config.bvh.max_depth, 2);
        assert_eq!(config.bvh.max_triangles_per_leaf, 4);
        assert_eq!(config.culling, CullingConfig::default());
    }

    #[test]
    fn test_unsupported_format() {
        let result = SceneConfig::default().save_to_file("scene.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.toml");
        let result = SceneConfig::load_from_file(path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
