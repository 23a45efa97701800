use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{inspect::InspectArg, predict::PredictArg};

mod inspect;
mod predict;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Replay a recorded dataset through a trained classifier
    Predict(#[clap(flatten)] PredictArg),
    /// Print the shape of a trained model file
    Inspect(#[clap(flatten)] InspectArg),
}

pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = CommandArgs::parse();
    match args.mode {
        Mode::Predict(arg) => predict::run(&arg)?,
        Mode::Inspect(arg) => inspect::run(&arg)?,
    }
    Ok(())
}
