use anyhow::Result;
use chronosedge::commands;
use chronosedge::config::Settings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chronosedge", about = "Kline-driven upside classifier and dashboard")]
struct Cli {
    /// Path to the YAML settings file.
    #[arg(long, default_value = "config/settings.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download kline history for every configured symbol.
    Fetch,
    /// Derive features and train the upside classifier.
    Train,
    /// Render the dashboard, bootstrapping any missing stage first.
    Dashboard,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.logging.level.clone()),
    )
    .init();

    match cli.command {
        Commands::Fetch => commands::fetch::run(&settings),
        Commands::Train => commands::train::run(&settings),
        Commands::Dashboard => commands::dashboard::run(&settings),
    }
}
