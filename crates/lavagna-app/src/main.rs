//! Lavagna command-line entry point.

use clap::Parser;
use lavagna_app::cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Starting Lavagna");

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => {
            let canvas = lavagna_app::run(&args)?;
            println!(
                "{}x{} board, {} history entries",
                canvas.width(),
                canvas.height(),
                canvas.history().len()
            );
        }
        Command::List(args) => {
            for project in lavagna_app::list(&args)? {
                println!(
                    "{}\t{}\t{}x{}",
                    project.id, project.name, project.width, project.height
                );
            }
        }
    }
    Ok(())
}
