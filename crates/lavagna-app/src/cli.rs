//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lavagna",
    version,
    about = "Replay whiteboard gesture scripts and export the board"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a script against a canvas.
    Run(RunArgs),
    /// List saved projects.
    List(ListArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// JSON gesture script.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Canvas config used when the script carries none.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project JSON to start from.
    #[arg(long, value_name = "PATH")]
    pub load: Option<PathBuf>,

    /// Write the flattened board as PNG.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write the project as JSON.
    #[arg(long, value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// Project name.
    #[arg(long, default_value = "Untitled")]
    pub name: String,

    /// Save the project to the project store.
    #[arg(long)]
    pub save: bool,

    /// Project store directory (default: platform data dir).
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Project store directory (default: platform data dir).
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,
}
