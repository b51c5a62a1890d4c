//! Configuration handling for fars

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Map rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Radius of each accident point
    pub point_radius: u32,
    /// Fraction of the coordinate span added around the points
    pub padding: f64,
    /// CSV of state boundary vertices (group, longitude, latitude)
    pub boundaries: Option<PathBuf>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            point_radius: 2,
            padding: 0.05,
            boundaries: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarsConfig {
    /// Directory holding the accident_<year>.csv.bz2 files
    pub data_dir: PathBuf,
    /// Map rendering settings
    pub map: MapConfig,
}

impl Default for FarsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            map: MapConfig::default(),
        }
    }
}

impl FarsConfig {
    /// Create a config reading datasets from `data_dir`
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the dataset directory
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    /// Set the rendered map size
    pub fn with_map_size(mut self, width: u32, height: u32) -> Self {
        self.map.width = width;
        self.map.height = height;
        self
    }

    /// Set the boundary outline file
    pub fn with_boundaries(mut self, path: PathBuf) -> Self {
        self.map.boundaries = Some(path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_json_gives_defaults() {
        let config = FarsConfig::from_json_str("{}").unwrap();
        assert_eq!(config, FarsConfig::default());
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.map.width, 800);
        assert!(config.map.boundaries.is_none());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config =
            FarsConfig::from_json_str(r#"{"data_dir": "/data/fars", "map": {"height": 400}}"#)
                .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/fars"));
        assert_eq!(config.map.height, 400);
        assert_eq!(config.map.width, 800);
    }

    #[test]
    fn reads_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"map": {{"boundaries": "states.csv", "point_radius": 4}}}}"#).unwrap();

        let config = FarsConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.map.boundaries, Some(PathBuf::from("states.csv")));
        assert_eq!(config.map.point_radius, 4);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = FarsConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn builder_setters() {
        let config = FarsConfig::new(PathBuf::from("in"))
            .with_map_size(1024, 768)
            .with_boundaries(PathBuf::from("b.csv"));
        assert_eq!(config.data_dir, PathBuf::from("in"));
        assert_eq!((config.map.width, config.map.height), (1024, 768));
        assert_eq!(config.map.boundaries, Some(PathBuf::from("b.csv")));
    }
}
