// flowguard/src/main.rs

mod cli;
mod commands;
mod driver;
mod report;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Check { project_dir }) => commands::check::run(&project_dir, cli.format).await?,
        Some(Commands::Flow { path, domain, domains_dir }) => commands::flow::run(&path, &domain, domains_dir)?,
        None => commands::check::run(&cli.project_dir, cli.format).await?,
    }

    Ok(())
}
