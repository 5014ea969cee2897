//! Backend that shells out to `yq` and `kubectl config`

use super::{ConfigManager, EntryKind, YamlAccessor};
use crate::error::{KcmError, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Environment variable carrying assigned values into yq, so that values
/// never have to be quoted into the expression
const VALUE_ENV: &str = "KCM_VALUE";

/// `yq` (mikefarah, v4) as the YAML accessor
pub struct Yq {
    bin: PathBuf,
}

impl Yq {
    pub fn new(bin: PathBuf) -> Self {
        Self { bin }
    }

    fn read_command(&self, file: &Path, path: &str) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("eval").arg(path).arg(file);
        cmd
    }

    fn write_command(&self, file: &Path, path: &str, value: &str) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("eval")
            .arg("-i")
            .arg(format!("{} = strenv({})", path, VALUE_ENV))
            .arg(file)
            .env(VALUE_ENV, value);
        cmd
    }
}

impl YamlAccessor for Yq {
    fn read(&self, file: &Path, path: &str) -> Result<Option<String>> {
        let stdout = run(self.read_command(file, path), "yq eval")?;
        Ok(parse_scalar_output(&stdout))
    }

    fn write(&self, file: &Path, path: &str, value: &str) -> Result<()> {
        run(self.write_command(file, path, value), "yq eval -i")?;
        Ok(())
    }
}

/// yq prints `null` for absent paths
fn parse_scalar_output(stdout: &str) -> Option<String> {
    let value = stdout.trim_end_matches(['\n', '\r']);
    if value.is_empty() || value == "null" {
        None
    } else {
        Some(value.to_string())
    }
}

/// `kubectl config` as the kubeconfig manager
pub struct Kubectl {
    bin: PathBuf,
}

impl Kubectl {
    pub fn new(bin: PathBuf) -> Self {
        Self { bin }
    }

    fn get_clusters_command(&self, kubeconfig: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["config", "get-clusters", "--kubeconfig"])
            .arg(kubeconfig);
        cmd
    }

    fn delete_command(&self, kubeconfig: &Path, kind: EntryKind, name: &str) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("config")
            .arg(format!("delete-{}", kind.as_str()))
            .arg(name)
            .arg("--kubeconfig")
            .arg(kubeconfig);
        cmd
    }

    fn view_flatten_command(&self, sources: &[PathBuf]) -> Result<Command> {
        let existing: Vec<&PathBuf> = sources.iter().filter(|p| p.exists()).collect();
        if existing.is_empty() {
            return Err(KcmError::Other("no kubeconfig files to merge".into()));
        }
        // kubectl keeps the first definition of a name, so list sources last-first
        let kubeconfig_env = env::join_paths(existing.iter().rev())
            .map_err(|e| KcmError::Other(format!("invalid kubeconfig path: {}", e)))?;

        let mut cmd = Command::new(&self.bin);
        cmd.args(["config", "view", "--flatten"])
            .env("KUBECONFIG", kubeconfig_env);
        Ok(cmd)
    }
}

impl ConfigManager for Kubectl {
    fn cluster_names(&self, kubeconfig: &Path) -> Result<Vec<String>> {
        let stdout = run(
            self.get_clusters_command(kubeconfig),
            "kubectl config get-clusters",
        )?;
        Ok(parse_cluster_list(&stdout))
    }

    fn delete_entry(&self, kubeconfig: &Path, kind: EntryKind, name: &str) -> Result<()> {
        run(
            self.delete_command(kubeconfig, kind, name),
            &format!("kubectl config delete-{}", kind.as_str()),
        )?;
        Ok(())
    }

    fn merge_flatten(&self, sources: &[PathBuf]) -> Result<String> {
        run(
            self.view_flatten_command(sources)?,
            "kubectl config view --flatten",
        )
    }
}

/// `kubectl config get-clusters` prints a `NAME` header row first
fn parse_cluster_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn run(mut cmd: Command, what: &str) -> Result<String> {
    debug!(command = ?cmd, "running collaborator");
    let output = cmd.output().map_err(|e| {
        KcmError::OperationFailed(format!("{} could not be started: {}", what, e))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KcmError::OperationFailed(format!(
            "{} failed: {}",
            what,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::fs;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn env_value<'a>(cmd: &'a Command, key: &str) -> Option<&'a OsStr> {
        cmd.get_envs()
            .find(|(k, _)| *k == OsStr::new(key))
            .and_then(|(_, v)| v)
    }

    #[test]
    fn test_parse_scalar_output() {
        assert_eq!(parse_scalar_output("dev\n"), Some("dev".to_string()));
        assert_eq!(parse_scalar_output("null\n"), None);
        assert_eq!(parse_scalar_output(""), None);
        assert_eq!(
            parse_scalar_output("https://a.b:6443\n"),
            Some("https://a.b:6443".to_string())
        );
    }

    #[test]
    fn test_parse_cluster_list_skips_header() {
        let out = "NAME\nprod\nkind-local\n\n";
        assert_eq!(parse_cluster_list(out), vec!["prod", "kind-local"]);
        assert!(parse_cluster_list("NAME\n").is_empty());
        assert!(parse_cluster_list("").is_empty());
    }

    #[test]
    fn test_yq_write_passes_value_through_env() {
        let yq = Yq::new(PathBuf::from("yq"));
        let cmd = yq.write_command(Path::new("/tmp/x.yaml"), ".clusters[0].name", "a \"b\"");
        assert_eq!(
            args(&cmd),
            vec![
                "eval",
                "-i",
                ".clusters[0].name = strenv(KCM_VALUE)",
                "/tmp/x.yaml"
            ]
        );
        assert_eq!(env_value(&cmd, VALUE_ENV), Some(OsStr::new("a \"b\"")));
    }

    #[test]
    fn test_yq_read_command() {
        let yq = Yq::new(PathBuf::from("yq"));
        let cmd = yq.read_command(Path::new("src.yaml"), ".clusters[0].cluster.server");
        assert_eq!(args(&cmd), vec!["eval", ".clusters[0].cluster.server", "src.yaml"]);
    }

    #[test]
    fn test_kubectl_delete_command() {
        let kubectl = Kubectl::new(PathBuf::from("kubectl"));
        let cmd = kubectl.delete_command(Path::new("/k/config"), EntryKind::User, "prod");
        assert_eq!(
            args(&cmd),
            vec!["config", "delete-user", "prod", "--kubeconfig", "/k/config"]
        );
    }

    #[test]
    fn test_kubectl_get_clusters_command() {
        let kubectl = Kubectl::new(PathBuf::from("kubectl"));
        let cmd = kubectl.get_clusters_command(Path::new("/k/config"));
        assert_eq!(
            args(&cmd),
            vec!["config", "get-clusters", "--kubeconfig", "/k/config"]
        );
    }

    #[test]
    fn test_kubectl_merge_lists_sources_last_first() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("config");
        let import = dir.path().join("import.yaml");
        let missing = dir.path().join("missing.yaml");
        fs::write(&dest, "").unwrap();
        fs::write(&import, "").unwrap();

        let kubectl = Kubectl::new(PathBuf::from("kubectl"));
        let cmd = kubectl
            .view_flatten_command(&[dest.clone(), missing, import.clone()])
            .unwrap();
        assert_eq!(args(&cmd), vec!["config", "view", "--flatten"]);

        let expected = env::join_paths([&import, &dest]).unwrap();
        assert_eq!(env_value(&cmd, "KUBECONFIG"), Some(expected.as_os_str()));
    }

    #[test]
    fn test_kubectl_merge_requires_a_source() {
        let kubectl = Kubectl::new(PathBuf::from("kubectl"));
        assert!(kubectl
            .view_flatten_command(&[PathBuf::from("/nonexistent/kcm/config")])
            .is_err());
    }

    #[test]
    fn test_run_reports_missing_binary() {
        let cmd = Command::new("kcm-no-such-binary-xyz");
        assert!(matches!(
            run(cmd, "probe"),
            Err(KcmError::OperationFailed(_))
        ));
    }
}
