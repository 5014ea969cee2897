//! kcm - kubeconfig cluster manager
//!
//! Imports clusters into, and removes clusters from, the active kubeconfig.

mod backend;
mod cli;
mod commands;
mod config;
mod error;
mod kubeconfig;
mod prompt;
#[cfg(test)]
mod test_support;

use crate::backend::Backend;
use crate::cli::{Action, Cli};
use crate::prompt::TerminalPrompter;

use anyhow::Context;
use clap::error::{ContextKind, ErrorKind};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::process::ExitCode;
use tracing::debug;

/// Initialize tracing subscriber based on verbosity level
fn init_tracing(verbosity: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return usage_error(err),
    };
    init_tracing(cli.verbose);

    let action = match requested_action(&cli) {
        Ok(action) => action,
        Err(code) => return code,
    };

    match run(&cli, action) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, action: Action) -> anyhow::Result<()> {
    let settings = config::load().context("failed to load ~/.kube/kcm.yaml")?;
    let backend = Backend::from_config(&settings)?;
    let kubeconfig = kubeconfig::resolve_path(cli.kubeconfig.as_deref())?;
    debug!(path = %kubeconfig.display(), backend = ?settings.backend, "resolved kubeconfig");

    let mut prompter = TerminalPrompter::new();

    match action {
        Action::Add(source) => {
            let result = commands::add_cluster(&backend, &mut prompter, &source, &kubeconfig)?;
            commands::print_add_summary(&result);
        }
        Action::Delete => {
            let result = commands::delete_cluster(&backend, &mut prompter, &kubeconfig)?;
            commands::print_delete_summary(&result);
        }
    }

    Ok(())
}

/// Bare `kcm` shows usage but is still a failed invocation
fn requested_action(cli: &Cli) -> Result<Action, ExitCode> {
    cli.action().ok_or_else(|| {
        print_help();
        ExitCode::FAILURE
    })
}

fn print_help() {
    // Nothing useful can be done if stdout is gone
    let _ = Cli::command().print_help();
}

/// `-h`/`-V` succeed; anything clap rejects is reported with the help text
fn usage_error(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!(
                "{} {}",
                "Error:".bright_red().bold(),
                invalid_option_message(&err)
            );
            print_help();
            ExitCode::FAILURE
        }
    }
}

fn invalid_option_message(err: &clap::Error) -> String {
    match err.get(ContextKind::InvalidArg) {
        Some(arg) => format!("invalid option: {}", arg),
        None => format!("invalid option: {}", err.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_add_parse() {
        let cli = Cli::parse_from(["kcm", "-f", "/tmp/cluster.yaml"]);
        assert_eq!(
            cli.action(),
            Some(Action::Add(PathBuf::from("/tmp/cluster.yaml")))
        );
        assert!(cli.kubeconfig.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_delete_parse() {
        let cli = Cli::parse_from(["kcm", "-d", "-vv"]);
        assert_eq!(cli.action(), Some(Action::Delete));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_kubeconfig_override() {
        let cli = Cli::parse_from(["kcm", "-d", "--kubeconfig", "/k/config"]);
        assert_eq!(cli.kubeconfig, Some(PathBuf::from("/k/config")));
    }

    #[test]
    fn test_cli_no_flags_has_no_action() {
        let cli = Cli::parse_from(["kcm"]);
        assert!(cli.action().is_none());
    }

    #[test]
    fn test_cli_help_flag() {
        let err = Cli::try_parse_from(["kcm", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(usage_error(err), ExitCode::SUCCESS);
    }

    #[test]
    fn test_cli_unknown_flag() {
        let err = Cli::try_parse_from(["kcm", "-x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(invalid_option_message(&err), "invalid option: -x");
        assert_eq!(usage_error(err), ExitCode::FAILURE);
    }

    #[test]
    fn test_cli_conflict_exits_with_failure() {
        let err = Cli::try_parse_from(["kcm", "-d", "-f", "a.yaml"]).unwrap_err();
        assert_eq!(usage_error(err), ExitCode::FAILURE);
    }

    #[test]
    fn test_no_flags_exits_with_failure() {
        let cli = Cli::parse_from(["kcm"]);
        assert_eq!(requested_action(&cli), Err(ExitCode::FAILURE));
    }

    #[test]
    fn test_requested_action_passes_through() {
        let cli = Cli::parse_from(["kcm", "-d"]);
        assert_eq!(requested_action(&cli), Ok(Action::Delete));
    }

    #[test]
    fn test_cli_add_and_delete_conflict() {
        let err = Cli::try_parse_from(["kcm", "-f", "a.yaml", "-d"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_add_requires_path() {
        assert!(Cli::try_parse_from(["kcm", "-f"]).is_err());
    }

    #[test]
    fn test_help_mentions_operations() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("-f <FILE>"));
        assert!(help.contains("-d"));
        assert!(help.contains("-h"));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
