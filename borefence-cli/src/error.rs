//! Error types emitted by the borefence CLI.

use std::sync::Arc;

use borefence_core::sink::OpenWorkspaceError;
use borefence_core::{PartialExport, TypeConversionError};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors emitted by the borefence CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// Opening the input file failed.
    #[error("failed to open input at {path:?}: {source}")]
    OpenInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The input file was not valid JSON for the command.
    #[error("failed to parse input JSON at {path:?}: {source}")]
    ParseInput {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A boring coordinate could not be read as a number.
    #[error("boring {id}: {source}")]
    InvalidCoordinate {
        id: String,
        #[source]
        source: TypeConversionError,
    },
    /// Strict mode found data for a record that was never registered.
    #[error("{kind} {key} is not registered")]
    UnmatchedRecord { kind: &'static str, key: String },
    /// The GeoJSON workspace could not be opened.
    #[error(transparent)]
    OpenWorkspace(#[from] OpenWorkspaceError),
    /// The export stopped early; written features remain in the workspace.
    #[error(transparent)]
    Export(#[from] PartialExport),
    /// Writing the command summary failed.
    #[error("failed to write summary: {0}")]
    WriteOutput(#[source] std::io::Error),
}
