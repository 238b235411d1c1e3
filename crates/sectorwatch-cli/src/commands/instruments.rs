use serde::Serialize;

use sectorwatch_core::{AnalysisConfig, DateAlignment, Instrument, LookbackPreset};

use crate::cli::Cli;
use crate::error::CliError;
use crate::metadata::Metadata;

use super::CommandResult;

#[derive(Debug, Serialize)]
pub struct InstrumentsResponse {
    pub meta: Metadata,
    pub benchmark: String,
    pub lookback_days: u32,
    pub alignment: DateAlignment,
    pub instruments: Vec<Instrument>,
    pub lookback_presets: Vec<u32>,
}

pub fn run(cli: &Cli, config: AnalysisConfig) -> Result<CommandResult, CliError> {
    config.validate()?;
    let set = config.instrument_set()?;

    Ok(CommandResult::Instruments(InstrumentsResponse {
        meta: Metadata::new(cli.source.provider_id())?,
        benchmark: set.benchmark().to_owned(),
        lookback_days: config.lookback_days,
        alignment: config.alignment,
        instruments: set.iter().cloned().collect(),
        lookback_presets: LookbackPreset::ALL.iter().map(|preset| preset.days()).collect(),
    }))
}
