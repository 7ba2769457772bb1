#![allow(clippy::multiple_crate_versions)]

use anyhow::Result;
use clap::Parser;

mod cli;
pub mod fs;
mod mount;

use cli::{Cli, Command};

use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Mount(args) => mount::run_mount(&args),
        Command::Info(args) => mount::run_info(&args),
    }
}

fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();
}
