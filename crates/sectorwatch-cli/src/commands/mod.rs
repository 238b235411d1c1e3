mod analyze;
mod instruments;

use std::path::Path;

use sectorwatch_core::AnalysisConfig;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub use analyze::AnalysisResponse;
pub use instruments::InstrumentsResponse;

/// Command output handed to the renderer.
#[derive(Debug)]
pub enum CommandResult {
    Analysis(Box<AnalysisResponse>),
    Instruments(InstrumentsResponse),
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Analyze(args) => analyze::run(args, cli, config).await,
        Command::Instruments => instruments::run(cli, config),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, CliError> {
    match path {
        Some(path) => Ok(AnalysisConfig::load(path)?),
        None => Ok(AnalysisConfig::default()),
    }
}
