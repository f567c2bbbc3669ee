mod cmds;
mod config_file;
mod slot_clock;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "beaconwatch")]
#[command(version)]
#[command(about = "Testnet node monitor and fork detector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Watch(cmds::watch::Opts),

    #[command(alias = "detect_forks")]
    DetectForks(cmds::detect_forks::Opts),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Watch(opts) => cmds::watch::run(opts).await?,
        Commands::DetectForks(opts) => cmds::detect_forks::run(opts).await?,
    }

    Ok(())
}
