use clap::CommandFactory;
use std::fs;
use std::path::PathBuf;

#[allow(dead_code)]
#[path = "src/cli.rs"]
mod cli;

fn main() {
    // Only generate man pages when explicitly requested (e.g., during release)
    let out_dir = match std::env::var_os("KCM_MAN_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => return,
    };

    fs::create_dir_all(&out_dir).expect("failed to create man page output directory");

    let cmd = cli::Cli::command();
    clap_mangen::generate_to(cmd, &out_dir).expect("failed to generate man pages");
}
