//! Command line interface definitions

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kcm",
    version,
    about = "Add or remove clusters in your kubeconfig, with automatic backups",
    long_about = "kcm imports a cluster from a kubeconfig file into your active kubeconfig, \
                  or removes a cluster together with its context and user.\n\n\
                  The active kubeconfig is ./.kube/config when it exists, otherwise \
                  ~/.kube/config. A timestamped backup (<path>.backup.YYYYMMDD_HHMMSS) \
                  is written before every change.",
    after_help = "Examples:\n  \
                  kcm -f ~/Downloads/kubeconfig.yaml   # Import a cluster\n  \
                  kcm -d                              # Pick a cluster to delete\n  \
                  kcm -h                              # Show this help"
)]
#[command(group(ArgGroup::new("action").args(["file", "delete"])))]
pub struct Cli {
    /// Import the first cluster defined in FILE
    #[arg(short = 'f', value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Choose a cluster to delete, with its context and user
    #[arg(short = 'd')]
    pub delete: bool,

    /// Override kubeconfig path (defaults to ./.kube/config or ~/.kube/config)
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Enable verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// The single operation requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add(PathBuf),
    Delete,
}

impl Cli {
    /// `None` when no operation flag was given
    pub fn action(&self) -> Option<Action> {
        match (&self.file, self.delete) {
            (Some(path), _) => Some(Action::Add(path.clone())),
            (None, true) => Some(Action::Delete),
            (None, false) => None,
        }
    }
}
