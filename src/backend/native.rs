//! In-process backend built on serde_yaml_ng

use super::{ConfigManager, EntryKind, YamlAccessor};
use crate::error::{KcmError, Result};
use crate::kubeconfig::{self, KubeConfig};
use serde_yaml_ng::{Mapping, Value as Yaml};
use std::fs;
use std::path::{Path, PathBuf};

/// One step of a `.clusters[0].cluster.server` style path
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

fn invalid_path(path: &str) -> KcmError {
    format!("invalid YAML path: '{}'", path).into()
}

fn parse_path(path: &str) -> Result<Vec<Segment>> {
    let rest = path.strip_prefix('.').ok_or_else(|| invalid_path(path))?;
    let mut segments = Vec::new();
    if rest.is_empty() {
        return Ok(segments);
    }

    for part in rest.split('.') {
        let (key, mut indexes) = match part.find('[') {
            Some(i) => (&part[..i], &part[i..]),
            None => (part, ""),
        };
        if key.is_empty() && indexes.is_empty() {
            return Err(invalid_path(path));
        }
        if !key.is_empty() {
            segments.push(Segment::Key(key.to_string()));
        }
        while !indexes.is_empty() {
            if !indexes.starts_with('[') {
                return Err(invalid_path(path));
            }
            let close = indexes.find(']').ok_or_else(|| invalid_path(path))?;
            let index = indexes[1..close]
                .parse::<usize>()
                .map_err(|_| invalid_path(path))?;
            segments.push(Segment::Index(index));
            indexes = &indexes[close + 1..];
        }
    }

    Ok(segments)
}

fn lookup<'a>(doc: &'a Yaml, segments: &[Segment]) -> Option<&'a Yaml> {
    segments.iter().try_fold(doc, |node, seg| match seg {
        Segment::Key(k) => node.as_mapping()?.get(Yaml::from(k.as_str())),
        Segment::Index(i) => node.as_sequence()?.get(*i),
    })
}

/// Assign `value` at `segments`, creating missing maps and appending a
/// missing sequence slot directly after the last element
fn assign(doc: &mut Yaml, segments: &[Segment], value: Yaml, path: &str) -> Result<()> {
    let mut node = doc;
    for seg in segments {
        let current = node;
        node = match seg {
            Segment::Key(k) => {
                if current.is_null() {
                    *current = Yaml::Mapping(Mapping::new());
                }
                current
                    .as_mapping_mut()
                    .ok_or_else(|| invalid_path(path))?
                    .entry(Yaml::from(k.as_str()))
                    .or_insert(Yaml::Null)
            }
            Segment::Index(i) => {
                if current.is_null() {
                    *current = Yaml::Sequence(Vec::new());
                }
                let seq = current
                    .as_sequence_mut()
                    .ok_or_else(|| invalid_path(path))?;
                if *i == seq.len() {
                    seq.push(Yaml::Null);
                }
                seq.get_mut(*i).ok_or_else(|| {
                    KcmError::Other(format!("{}: index {} out of range", path, i))
                })?
            }
        };
    }
    *node = value;
    Ok(())
}

fn render_scalar(value: &Yaml) -> Result<Option<String>> {
    Ok(match value {
        Yaml::Null => None,
        Yaml::String(s) => Some(s.clone()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        other => Some(serde_yaml_ng::to_string(other)?.trim_end().to_string()),
    })
}

fn load_document(file: &Path) -> Result<Yaml> {
    let content = fs::read_to_string(file)?;
    if content.trim().is_empty() {
        return Ok(Yaml::Null);
    }
    Ok(serde_yaml_ng::from_str(&content)?)
}

/// YAML accessor operating on files in-process
pub struct NativeYaml;

impl YamlAccessor for NativeYaml {
    fn read(&self, file: &Path, path: &str) -> Result<Option<String>> {
        let segments = parse_path(path)?;
        let doc = load_document(file)?;
        match lookup(&doc, &segments) {
            Some(value) => render_scalar(value),
            None => Ok(None),
        }
    }

    fn write(&self, file: &Path, path: &str, value: &str) -> Result<()> {
        let segments = parse_path(path)?;
        let mut doc = load_document(file)?;
        assign(&mut doc, &segments, Yaml::String(value.to_string()), path)?;
        fs::write(file, serde_yaml_ng::to_string(&doc)?)?;
        Ok(())
    }
}

/// Kubeconfig manager operating on files in-process
pub struct NativeConfig;

impl ConfigManager for NativeConfig {
    fn cluster_names(&self, kubeconfig: &Path) -> Result<Vec<String>> {
        Ok(kubeconfig::load(kubeconfig)?.cluster_names())
    }

    fn delete_entry(&self, kubeconfig: &Path, kind: EntryKind, name: &str) -> Result<()> {
        let mut cfg = kubeconfig::load(kubeconfig)?;
        let items = match kind {
            EntryKind::Cluster => &mut cfg.clusters,
            EntryKind::Context => &mut cfg.contexts,
            EntryKind::User => &mut cfg.users,
        };
        if !kubeconfig::remove_named(items, name) {
            return Err(KcmError::OperationFailed(format!(
                "cannot delete {} '{}', not in {}",
                kind.as_str(),
                name,
                kubeconfig.display()
            )));
        }
        if kind == EntryKind::Context && cfg.current_context.as_deref() == Some(name) {
            cfg.current_context = None;
        }
        kubeconfig::write_restricted(kubeconfig, &kubeconfig::to_yaml(&cfg)?)
    }

    fn merge_flatten(&self, sources: &[PathBuf]) -> Result<String> {
        let configs = sources
            .iter()
            .filter(|p| p.exists())
            .map(|p| kubeconfig::load(p))
            .collect::<Result<Vec<KubeConfig>>>()?;
        kubeconfig::to_yaml(&kubeconfig::merge_later_wins(configs))
    }
}
