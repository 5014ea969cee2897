//! kcm settings file handling

use crate::error::{KcmError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// kcm settings structure (`~/.kube/kcm.yaml`)
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct KcmConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub tools: ToolsSection,
}

/// Which collaborators perform YAML edits and kubeconfig management
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Shell out to `yq` and `kubectl config`
    #[default]
    External,
    /// Edit YAML in-process
    Native,
}

/// External tool locations
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ToolsSection {
    #[serde(default = "default_kubectl")]
    pub kubectl: String,
    #[serde(default = "default_yq")]
    pub yq: String,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            kubectl: default_kubectl(),
            yq: default_yq(),
        }
    }
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

fn default_yq() -> String {
    "yq".to_string()
}

/// Get the settings file path
pub fn config_path() -> Result<PathBuf> {
    let home = dirs_next::home_dir().ok_or(KcmError::NoHomeDir)?;
    Ok(home.join(".kube").join("kcm.yaml"))
}

/// Load kcm settings, falling back to defaults when the file is absent
pub fn load() -> Result<KcmConfig> {
    load_from(&config_path()?)
}

pub fn load_from(path: &Path) -> Result<KcmConfig> {
    if !path.exists() {
        return Ok(KcmConfig::default());
    }

    let content = fs::read_to_string(path)?;
    // An empty file deserializes to unit, not a mapping
    if content.trim().is_empty() {
        return Ok(KcmConfig::default());
    }
    let config: KcmConfig = serde_yaml_ng::from_str(&content)?;
    Ok(config)
}

/// Expand ~ to home directory in path strings
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
