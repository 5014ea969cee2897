//! Collaborators that read/write YAML and manage kubeconfig entries
//!
//! The operations in `commands` only talk to the two traits below, so the
//! same logic runs against the `yq`/`kubectl` binaries or the in-process
//! implementation.

mod external;
mod native;

pub use external::{Kubectl, Yq};
pub use native::{NativeConfig, NativeYaml};

use crate::config::{self, BackendKind, KcmConfig};
use crate::error::{KcmError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path-based scalar access on a YAML document (`.clusters[0].name`)
pub trait YamlAccessor {
    /// Read a value; `None` when it is absent or null
    fn read(&self, file: &Path, path: &str) -> Result<Option<String>>;

    /// Assign a string value in place
    fn write(&self, file: &Path, path: &str, value: &str) -> Result<()>;
}

/// Kind of named kubeconfig entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Cluster,
    Context,
    User,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Cluster => "cluster",
            EntryKind::Context => "context",
            EntryKind::User => "user",
        }
    }
}

/// Kubeconfig management (`kubectl config` equivalent)
pub trait ConfigManager {
    /// Cluster names in the order the kubeconfig lists them
    fn cluster_names(&self, kubeconfig: &Path) -> Result<Vec<String>>;

    /// Delete one named entry; an absent entry is an error
    fn delete_entry(&self, kubeconfig: &Path, kind: EntryKind, name: &str) -> Result<()>;

    /// Flatten `sources` into one kubeconfig document. On a name collision
    /// the later source wins. Missing sources are ignored.
    fn merge_flatten(&self, sources: &[PathBuf]) -> Result<String>;
}

/// The pair of collaborators an operation runs against
pub struct Backend {
    yaml: Box<dyn YamlAccessor>,
    config: Box<dyn ConfigManager>,
}

impl Backend {
    pub fn new(yaml: Box<dyn YamlAccessor>, config: Box<dyn ConfigManager>) -> Self {
        Self { yaml, config }
    }

    /// Build the backend selected in the settings, checking that the
    /// external tools are installed when they are needed
    pub fn from_config(cfg: &KcmConfig) -> Result<Self> {
        match cfg.backend {
            BackendKind::External => {
                let kubectl = require_tool(
                    &cfg.tools.kubectl,
                    "Install kubectl:\n    brew install kubectl\n    # or: https://kubernetes.io/docs/tasks/tools/",
                )?;
                let yq = require_tool(
                    &cfg.tools.yq,
                    "Install yq (v4, mikefarah/yq):\n    brew install yq\n    # or: https://github.com/mikefarah/yq#install",
                )?;
                Ok(Self::external(kubectl, yq))
            }
            BackendKind::Native => Ok(Self::native()),
        }
    }

    pub fn external(kubectl: PathBuf, yq: PathBuf) -> Self {
        Self::new(Box::new(Yq::new(yq)), Box::new(Kubectl::new(kubectl)))
    }

    pub fn native() -> Self {
        Self::new(Box::new(NativeYaml), Box::new(NativeConfig))
    }

    pub fn yaml(&self) -> &dyn YamlAccessor {
        self.yaml.as_ref()
    }

    pub fn config(&self) -> &dyn ConfigManager {
        self.config.as_ref()
    }
}

/// Locate a tool on PATH (or at an explicit path)
pub fn require_tool(tool: &str, hint: &str) -> Result<PathBuf> {
    let expanded = config::expand_home(tool);
    match which::which(&expanded) {
        Ok(path) => {
            debug!(tool, path = %path.display(), "found dependency");
            Ok(path)
        }
        Err(_) => Err(KcmError::MissingDependency {
            tool: tool.to_string(),
            hint: hint.to_string(),
        }),
    }
}
