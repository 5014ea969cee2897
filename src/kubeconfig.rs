//! Kubeconfig file model, path resolution, backups and writes

use crate::error::{KcmError, Result};
use chrono::{DateTime, Local};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml_ng::Value as Yaml;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Kubeconfig file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: Option<String>,
    pub kind: Option<String>,
    pub preferences: Option<Yaml>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clusters: Vec<NamedItem>,
    #[serde(default, rename = "current-context")]
    pub current_context: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contexts: Vec<NamedItem>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub users: Vec<NamedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Yaml>,
}

/// Named item in kubeconfig (context, cluster, user)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NamedItem {
    pub name: String,
    #[serde(default, flatten)]
    pub rest: Yaml,
}

impl KubeConfig {
    /// Ensure required fields have defaults
    pub fn ensure_defaults(&mut self) {
        if self.api_version.is_none() {
            self.api_version = Some("v1".to_string());
        }
        if self.kind.is_none() {
            self.kind = Some("Config".to_string());
        }
        if self.preferences.is_none() {
            self.preferences = Some(Yaml::Mapping(Default::default()));
        }
    }

    /// Get list of cluster names in file order
    pub fn cluster_names(&self) -> Vec<String> {
        self.clusters.iter().map(|c| c.name.clone()).collect()
    }
}

/// kubectl writes `clusters: null` once the last entry is gone
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<NamedItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<NamedItem>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read and parse a kubeconfig file. An empty file is an empty config.
pub fn load(path: &Path) -> Result<KubeConfig> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(KubeConfig::default());
    }
    Ok(serde_yaml_ng::from_str(&content)?)
}

pub fn to_yaml(cfg: &KubeConfig) -> Result<String> {
    Ok(serde_yaml_ng::to_string(cfg)?)
}

/// Merge kubeconfigs so that later configs override earlier ones by name.
///
/// Entries keep the position of their first occurrence; an overriding entry
/// replaces the earlier one in place. `current-context` comes from the last
/// config that sets it.
pub fn merge_later_wins(configs: impl IntoIterator<Item = KubeConfig>) -> KubeConfig {
    let mut merged = KubeConfig::default();

    for cfg in configs {
        if cfg.current_context.is_some() {
            merged.current_context = cfg.current_context;
        }

        upsert_all(&mut merged.clusters, cfg.clusters);
        upsert_all(&mut merged.contexts, cfg.contexts);
        upsert_all(&mut merged.users, cfg.users);

        // carry over top-level defaults only once
        if merged.api_version.is_none() {
            merged.api_version = cfg.api_version;
        }
        if merged.kind.is_none() {
            merged.kind = cfg.kind;
        }
        if merged.preferences.is_none() {
            merged.preferences = cfg.preferences;
        }
        if merged.extensions.is_none() {
            merged.extensions = cfg.extensions;
        }
    }

    merged.ensure_defaults();
    merged
}

fn upsert_all(items: &mut Vec<NamedItem>, incoming: Vec<NamedItem>) {
    for item in incoming {
        match items.iter_mut().find(|i| i.name == item.name) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
    }
}

/// Remove the entry with the given name, returning whether one was removed
pub fn remove_named(items: &mut Vec<NamedItem>, name: &str) -> bool {
    let before = items.len();
    items.retain(|i| i.name != name);
    items.len() != before
}

/// Resolve the kubeconfig to operate on.
///
/// An explicit override wins. Otherwise `./.kube/config` in the current
/// directory is used when it exists, falling back to `~/.kube/config`.
pub fn resolve_path(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = override_path {
        return Ok(p.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    let home = dirs_next::home_dir().ok_or(KcmError::NoHomeDir)?;
    Ok(resolve_from(&cwd, &home))
}

pub fn resolve_from(cwd: &Path, home: &Path) -> PathBuf {
    let local = cwd.join(".kube").join("config");
    if local.is_file() {
        debug!(path = %local.display(), "using local kubeconfig");
        local
    } else {
        home.join(".kube").join("config")
    }
}

/// Backup file name for `path` taken at `at`: `<path>.backup.<YYYYMMDD_HHMMSS>`
pub fn backup_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup.{}", at.format("%Y%m%d_%H%M%S")));
    PathBuf::from(name)
}

/// First free backup name for `path` at `at`; later backups within the same
/// second get a `.1`, `.2`, ... suffix
fn unused_backup_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let base = backup_path(path, at);
    let mut candidate = base.clone();
    let mut n = 0u32;
    while candidate.exists() {
        n += 1;
        let mut name = base.as_os_str().to_os_string();
        name.push(format!(".{}", n));
        candidate = PathBuf::from(name);
    }
    candidate
}

/// Copy the kubeconfig next to itself with a timestamp suffix.
/// Returns `None` when there is nothing to back up.
pub fn backup_kubeconfig(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = unused_backup_path(path, Local::now());
    fs::copy(path, &backup)?;
    info!(backup = %backup.display(), "kubeconfig backed up");
    Ok(Some(backup))
}

/// Replace `path` with `contents` via a sibling `.tmp` file and a rename.
/// The file is readable by its owner only.
pub fn write_restricted(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    // A leftover .tmp would keep its old mode
    match fs::remove_file(&tmp) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(&tmp)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    info!(path = %path.display(), "kubeconfig written");
    Ok(())
}

fn server_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https://[A-Za-z0-9_.-]+(:[0-9]+)?(/.*)?$").expect("server URL regex is valid")
    })
}

/// Check that a cluster server URL is `https://host[:port][/path]`
pub fn is_valid_server_url(url: &str) -> bool {
    server_url_regex().is_match(url)
}
