use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AssetError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ResourceManagerConfig {
    /// Store uncompressed RGB(A)8 textures as DXT1 on the GPU.
    pub compress_textures: bool,
    pub default_physics_config: PathBuf,
    pub split_semantic_mesh: bool,
}

impl Default for ResourceManagerConfig {
    fn default() -> Self {
        Self {
            compress_textures: false,
            default_physics_config: "data/default.phys_scene_config.json".into(),
            split_semantic_mesh: true,
        }
    }
}

impl ResourceManagerConfig {
    pub fn from_str(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }

    /// Reads the config file. A missing file is not an error, the defaults are used instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(AssetError::ParseFailure {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })
            }
        };
        Self::from_str(&content).map_err(|err| AssetError::ParseFailure {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = ResourceManagerConfig::from_str(r#"{ "compress_textures": true }"#).unwrap();
        assert!(config.compress_textures);
        assert!(config.split_semantic_mesh);
        assert_eq!(
            config.default_physics_config,
            PathBuf::from("data/default.phys_scene_config.json")
        );
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResourceManagerConfig::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(config, ResourceManagerConfig::default());
    }

    #[test]
    fn malformed_file_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ResourceManagerConfig::load(&path),
            Err(AssetError::ParseFailure { .. })
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = ResourceManagerConfig {
            split_semantic_mesh: false,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ResourceManagerConfig::load(&path).unwrap(), config);
    }
}
