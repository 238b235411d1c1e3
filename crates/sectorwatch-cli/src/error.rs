use sectorwatch_core::{
    AnalysisError, ConfigError, CoreError, ExportError, SourceError, ValidationError,
};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("analysis failed [{code}]: {0}", code = .0.code())]
    Analysis(#[source] AnalysisError),

    #[error("price source failed: {0}")]
    Source(SourceError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Analysis(_) => 3,
            Self::Source(_) => 4,
            Self::Export(_) => 4,
            Self::Serialization(_) => 4,
            Self::Timestamp(_) => 4,
            Self::Config(_) => 7,
            Self::Io(_) => 10,
        }
    }
}

impl From<AnalysisError> for CliError {
    fn from(error: AnalysisError) -> Self {
        Self::Analysis(error)
    }
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Analysis(error) => Self::Analysis(error),
            CoreError::Source(error) => Self::Source(error),
            CoreError::Export(error) => Self::Export(error),
            CoreError::Config(error) => Self::Config(error),
        }
    }
}
