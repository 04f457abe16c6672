//! Model configuration loaded from YAML

use crate::graph::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings for a `DiagramModel`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Record commands for undo; otherwise commands run without history
    pub undo_enabled: bool,
    /// Maximum number of undo steps kept, unlimited when absent
    pub max_undo_depth: Option<usize>,
    /// Size given to placeholders that carry no size of their own
    pub default_node_size: Size,
    /// Hide relationship types without relationships after an import
    pub hide_unused_relationship_types: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            undo_enabled: true,
            max_undo_depth: None,
            default_node_size: Size::default(),
            hide_unused_relationship_types: false,
        }
    }
}

impl ModelConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ModelConfig::from_yaml_str("undo_enabled: false\n").unwrap();
        assert!(!config.undo_enabled);
        assert_eq!(config.max_undo_depth, None);
        assert!(!config.hide_unused_relationship_types);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "max_undo_depth: 50\ndefault_node_size: {{ width: 120.0, height: 40.0 }}"
        )
        .unwrap();
        let config = ModelConfig::from_path(file.path()).unwrap();
        assert_eq!(config.max_undo_depth, Some(50));
        assert_eq!(config.default_node_size, Size::new(120.0, 40.0));
        assert!(config.undo_enabled);
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let err = ModelConfig::from_yaml_str("undo_enabled: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
