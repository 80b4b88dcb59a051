//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use retree::EngineError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read rules from {path}: {source}")]
    ReadRules { path: PathBuf, source: io::Error },
    #[error("run failed: {0}")]
    Engine(#[from] EngineError),
    #[error("failed to write replay script to {path}: {source}")]
    WriteScript { path: PathBuf, source: io::Error },
    #[error("failed to serialise report: {0}")]
    SerialiseReport(serde_json::Error),
    #[error("failed to write report: {0}")]
    EmitReport(io::Error),
}

impl AppError {
    /// Usage and configuration problems exit with 2; failed runs with 1.
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::LoadConfiguration(_) | Self::CliUsage(_) | Self::Telemetry(_) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}
