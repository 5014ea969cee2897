//! Import a cluster from a kubeconfig file into the active kubeconfig

use crate::backend::Backend;
use crate::error::{KcmError, Result};
use crate::kubeconfig;
use crate::prompt::Prompter;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const NAME_PATH: &str = ".clusters[0].name";
const SERVER_PATH: &str = ".clusters[0].cluster.server";

#[derive(Debug)]
pub struct AddResult {
    pub name: String,
    pub server: String,
    pub kubeconfig: PathBuf,
    pub backup: Option<PathBuf>,
    pub replaced: bool,
}

/// Import the first cluster of `source` into `kubeconfig`.
///
/// The cluster, its context and its user are all renamed to the chosen
/// name and that context becomes current. An existing cluster with the
/// same name is only replaced after confirmation.
pub fn add_cluster(
    backend: &Backend,
    prompter: &mut dyn Prompter,
    source: &Path,
    kubeconfig: &Path,
) -> Result<AddResult> {
    if !source.is_file() {
        return Err(KcmError::FileNotFound(source.to_path_buf()));
    }

    let parsed_name = read_required(backend, source, NAME_PATH)?;
    let parsed_server = read_required(backend, source, SERVER_PATH)?;
    if !kubeconfig::is_valid_server_url(&parsed_server) {
        return Err(KcmError::InvalidUrl(parsed_server));
    }
    debug!(name = %parsed_name, server = %parsed_server, "parsed source kubeconfig");

    let name = choose_name(prompter, &parsed_name)?;
    let server = confirm_server(prompter, parsed_server)?;

    let replaced =
        kubeconfig.exists() && backend.config().cluster_names(kubeconfig)?.contains(&name);
    if replaced
        && !prompter.confirm(
            &format!("Cluster '{}' already exists. Overwrite?", name),
            false,
        )?
    {
        return Err(KcmError::Cancelled);
    }

    let backup = kubeconfig::backup_kubeconfig(kubeconfig)?;

    // The staged copy is removed when it goes out of scope
    let staged = stage_import(backend, source, &name, &server)?;
    let merged = backend
        .config()
        .merge_flatten(&[kubeconfig.to_path_buf(), staged.path().to_path_buf()])?;
    kubeconfig::write_restricted(kubeconfig, &merged)?;
    info!(cluster = %name, path = %kubeconfig.display(), "cluster imported");

    Ok(AddResult {
        name,
        server,
        kubeconfig: kubeconfig.to_path_buf(),
        backup,
        replaced,
    })
}

/// Blank values count as missing
fn read_required(backend: &Backend, source: &Path, path: &str) -> Result<String> {
    backend
        .yaml()
        .read(source, path)?
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| KcmError::ParseError {
            file: source.to_path_buf(),
            field: path.to_string(),
        })
}

fn choose_name(prompter: &mut dyn Prompter, parsed: &str) -> Result<String> {
    let answer = prompter.ask(&format!(
        "Cluster name (leave empty to keep '{}'):",
        parsed
    ))?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        parsed.to_string()
    } else {
        answer.to_string()
    })
}

/// One replacement attempt only; an invalid replacement is fatal
fn confirm_server(prompter: &mut dyn Prompter, parsed: String) -> Result<String> {
    if prompter.confirm(&format!("Use server URL {}?", parsed), true)? {
        return Ok(parsed);
    }
    let replacement = prompter.ask("Server URL:")?.trim().to_string();
    if !kubeconfig::is_valid_server_url(&replacement) {
        return Err(KcmError::InvalidUrl(replacement));
    }
    Ok(replacement)
}

/// Copy `source` to a temporary file and point its first cluster, context
/// and user at `name`
fn stage_import(
    backend: &Backend,
    source: &Path,
    name: &str,
    server: &str,
) -> Result<tempfile::NamedTempFile> {
    let staged = tempfile::Builder::new()
        .prefix("kcm-import-")
        .suffix(".yaml")
        .tempfile()?;
    fs::copy(source, staged.path())?;

    let yaml = backend.yaml();
    let file = staged.path();
    yaml.write(file, NAME_PATH, name)?;
    yaml.write(file, SERVER_PATH, server)?;
    yaml.write(file, ".contexts[0].name", name)?;
    yaml.write(file, ".contexts[0].context.cluster", name)?;
    yaml.write(file, ".contexts[0].context.user", name)?;
    yaml.write(file, ".users[0].name", name)?;
    yaml.write(file, ".current-context", name)?;
    debug!(staged = %file.display(), "import staged");

    Ok(staged)
}

pub fn print_add_summary(result: &AddResult) {
    if let Some(backup) = &result.backup {
        println!("Backup saved to {}", backup.display());
    }
    let verb = if result.replaced { "replaced" } else { "added" };
    println!(
        "{} Cluster '{}' ({}) {} in {}",
        "OK".bright_green(),
        result.name.bright_white(),
        result.server,
        verb,
        result.kubeconfig.display()
    );
    println!();
    println!("Try it:");
    println!(
        "  kubectl --kubeconfig {} --context {} get nodes",
        result.kubeconfig.display(),
        result.name
    );
}
