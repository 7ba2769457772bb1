use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Mount an image file as a FUSE filesystem.
    Mount(MountArgs),

    /// Print the header and tree summary of an image.
    Info(InfoArgs),
}

#[derive(Args)]
pub struct MountArgs {
    #[arg(long)]
    pub mount_point: PathBuf,

    #[arg(long)]
    pub image: PathBuf,

    #[arg(long, default_value_t = false)]
    pub allow_root: bool,

    #[arg(long, default_value_t = false)]
    pub auto_unmount: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    #[arg(long)]
    pub image: PathBuf,
}
