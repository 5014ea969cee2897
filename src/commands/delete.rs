//! Remove a cluster together with its context and user

use crate::backend::{Backend, EntryKind};
use crate::error::{KcmError, Result};
use crate::kubeconfig;
use crate::prompt::Prompter;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug)]
pub struct DeleteResult {
    pub name: String,
    pub kubeconfig: PathBuf,
    pub backup: Option<PathBuf>,
    pub context_removed: bool,
    pub user_removed: bool,
}

/// Pick a cluster from `kubeconfig` and delete it after confirmation
pub fn delete_cluster(
    backend: &Backend,
    prompter: &mut dyn Prompter,
    kubeconfig: &Path,
) -> Result<DeleteResult> {
    if !kubeconfig.exists() {
        return Err(KcmError::ConfigNotFound(kubeconfig.to_path_buf()));
    }

    let names = backend.config().cluster_names(kubeconfig)?;
    if names.is_empty() {
        return Err(KcmError::NoClusters);
    }

    println!("Clusters in {}:", kubeconfig.display());
    print!("{}", render_cluster_list(&names));

    let answer = prompter.ask("Cluster to delete (number or name):")?;
    let name = resolve_selection(&answer, &names)?;

    if !prompter.confirm(
        &format!(
            "Delete cluster, context and user '{}'? This cannot be undone",
            name
        ),
        false,
    )? {
        return Err(KcmError::Cancelled);
    }

    let backup = kubeconfig::backup_kubeconfig(kubeconfig)?;

    let cluster = backend
        .config()
        .delete_entry(kubeconfig, EntryKind::Cluster, &name);
    let context_removed = delete_optional(backend, kubeconfig, EntryKind::Context, &name);
    let user_removed = delete_optional(backend, kubeconfig, EntryKind::User, &name);
    cluster?;
    info!(cluster = %name, path = %kubeconfig.display(), "cluster deleted");

    Ok(DeleteResult {
        name,
        kubeconfig: kubeconfig.to_path_buf(),
        backup,
        context_removed,
        user_removed,
    })
}

/// Contexts and users do not always share the cluster's name
fn delete_optional(backend: &Backend, kubeconfig: &Path, kind: EntryKind, name: &str) -> bool {
    match backend.config().delete_entry(kubeconfig, kind, name) {
        Ok(()) => true,
        Err(e) => {
            warn!(kind = kind.as_str(), name, error = %e, "entry not removed");
            false
        }
    }
}

/// Numbered (1-based) listing of cluster names
pub fn render_cluster_list(names: &[String]) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("  {}) {}\n", i + 1, name))
        .collect()
}

/// Accept a 1-based index into `names` or an exact name
pub fn resolve_selection(answer: &str, names: &[String]) -> Result<String> {
    let answer = answer.trim();
    if let Ok(index) = answer.parse::<usize>() {
        if (1..=names.len()).contains(&index) {
            return Ok(names[index - 1].clone());
        }
    }
    names
        .iter()
        .find(|n| n.as_str() == answer)
        .cloned()
        .ok_or_else(|| KcmError::InvalidSelection(answer.to_string()))
}

pub fn print_delete_summary(result: &DeleteResult) {
    if let Some(backup) = &result.backup {
        println!("Backup saved to {}", backup.display());
    }
    println!(
        "{} Cluster '{}' deleted from {}",
        "OK".bright_green(),
        result.name.bright_white(),
        result.kubeconfig.display()
    );
    if !result.context_removed {
        println!("  {}", "No context with that name was present".dimmed());
    }
    if !result.user_removed {
        println!("  {}", "No user with that name was present".dimmed());
    }
}
