//! `borings` and `rasters` command implementations.

use std::io::Write;

use borefence_core::{ExportSummary, GeoJsonSink};
use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::input::{BoringInput, FenceInput, RasterInput, load_json};
use crate::{
    ARG_INPUT, ARG_NAME, ARG_SCRATCH, ARG_WORKSPACE, CliError, ENV_BORINGS_INPUT,
    ENV_BORINGS_WORKSPACE, ENV_RASTERS_INPUT, ENV_RASTERS_WORKSPACE,
};

const DEFAULT_BORING_FENCE: &str = "BoringFence";
const DEFAULT_RASTER_FENCE: &str = "RasterFence";
const DEFAULT_SCRATCH_DIR: &str = "scratch";

/// CLI arguments for the `borings` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Register borings, attach their depth samples and write one \
                 point per sample into a GeoJSON feature collection. The \
                 input is a JSON document with `borings` and `samples` arrays.",
    about = "Export a boring fence",
    name = "borings"
)]
#[ortho_config(prefix = "BOREFENCE")]
pub(crate) struct BoringsArgs {
    /// Path to the JSON file describing borings and samples.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Directory receiving the output collection.
    #[arg(long = ARG_WORKSPACE, value_name = "dir")]
    #[serde(default)]
    pub(crate) workspace: Option<Utf8PathBuf>,
    /// Directory for temporary collections (defaults to `<workspace>/scratch`).
    #[arg(long = ARG_SCRATCH, value_name = "dir")]
    #[serde(default)]
    pub(crate) scratch: Option<Utf8PathBuf>,
    /// Name of the output collection.
    #[arg(long = ARG_NAME, value_name = "collection")]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Fail when samples reference an unregistered boring.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) strict: bool,
}

/// CLI arguments for the `rasters` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Register rasters, append their fence vertices and write one \
                 polyline per raster, labelled with the raster's file name. \
                 The input is a JSON document with `rasters` and `vertices` \
                 arrays.",
    about = "Export a raster fence",
    name = "rasters"
)]
#[ortho_config(prefix = "BOREFENCE")]
pub(crate) struct RastersArgs {
    /// Path to the JSON file describing rasters and vertices.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Directory receiving the output collection.
    #[arg(long = ARG_WORKSPACE, value_name = "dir")]
    #[serde(default)]
    pub(crate) workspace: Option<Utf8PathBuf>,
    /// Directory for temporary collections (defaults to `<workspace>/scratch`).
    #[arg(long = ARG_SCRATCH, value_name = "dir")]
    #[serde(default)]
    pub(crate) scratch: Option<Utf8PathBuf>,
    /// Name of the output collection.
    #[arg(long = ARG_NAME, value_name = "collection")]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Fail when vertices reference an unregistered raster.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) strict: bool,
}

impl BoringsArgs {
    pub(crate) fn into_config(self) -> Result<ExportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ExportConfig::try_from(merged)
    }
}

impl RastersArgs {
    pub(crate) fn into_config(self) -> Result<ExportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ExportConfig::try_from(merged)
    }
}

/// Resolved configuration shared by both export commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExportConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) workspace: Utf8PathBuf,
    pub(crate) scratch: Utf8PathBuf,
    pub(crate) name: String,
    pub(crate) strict: bool,
}

/// Per-command environment variables and collection name.
struct CommandDefaults {
    input_env: &'static str,
    workspace_env: &'static str,
    name: &'static str,
}

const BORINGS: CommandDefaults = CommandDefaults {
    input_env: ENV_BORINGS_INPUT,
    workspace_env: ENV_BORINGS_WORKSPACE,
    name: DEFAULT_BORING_FENCE,
};

const RASTERS: CommandDefaults = CommandDefaults {
    input_env: ENV_RASTERS_INPUT,
    workspace_env: ENV_RASTERS_WORKSPACE,
    name: DEFAULT_RASTER_FENCE,
};

impl ExportConfig {
    fn resolve(
        input: Option<Utf8PathBuf>,
        workspace: Option<Utf8PathBuf>,
        scratch: Option<Utf8PathBuf>,
        name: Option<String>,
        strict: bool,
        defaults: &CommandDefaults,
    ) -> Result<Self, CliError> {
        let input = input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: defaults.input_env,
        })?;
        let workspace = workspace.ok_or(CliError::MissingArgument {
            field: ARG_WORKSPACE,
            env: defaults.workspace_env,
        })?;
        let scratch = scratch.unwrap_or_else(|| workspace.join(DEFAULT_SCRATCH_DIR));
        let name = name.unwrap_or_else(|| defaults.name.to_owned());
        Ok(Self {
            input,
            workspace,
            scratch,
            name,
            strict,
        })
    }
}

impl TryFrom<BoringsArgs> for ExportConfig {
    type Error = CliError;

    fn try_from(args: BoringsArgs) -> Result<Self, Self::Error> {
        let BoringsArgs {
            input,
            workspace,
            scratch,
            name,
            strict,
        } = args;
        Self::resolve(input, workspace, scratch, name, strict, &BORINGS)
    }
}

impl TryFrom<RastersArgs> for ExportConfig {
    type Error = CliError;

    fn try_from(args: RastersArgs) -> Result<Self, Self::Error> {
        let RastersArgs {
            input,
            workspace,
            scratch,
            name,
            strict,
        } = args;
        Self::resolve(input, workspace, scratch, name, strict, &RASTERS)
    }
}

pub(super) fn run_borings(args: BoringsArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let mut stdout = std::io::stdout().lock();
    run_export::<BoringInput>(&config, &mut stdout)?;
    Ok(())
}

pub(super) fn run_rasters(args: RastersArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let mut stdout = std::io::stdout().lock();
    run_export::<RasterInput>(&config, &mut stdout)?;
    Ok(())
}

/// Load `config.input` as `I`, export its fence and print a summary line.
///
/// Input problems surface before the workspace is opened, so a rejected
/// input leaves no directories behind.
pub(crate) fn run_export<I: FenceInput>(
    config: &ExportConfig,
    writer: &mut dyn Write,
) -> Result<ExportSummary, CliError> {
    let fence = load_json::<I>(&config.input)?.into_fence(config.strict)?;
    info!(
        "loaded {} {} record(s) from {}",
        I::record_count(&fence),
        I::KIND,
        config.input.as_str()
    );
    let mut sink = GeoJsonSink::open(&config.workspace, &config.scratch)?;
    let summary = I::export(&fence, &mut sink, &config.name)?;
    writeln!(
        writer,
        "wrote {} features to {}",
        summary.features_written,
        sink.path_of(&summary.collection)
    )
    .map_err(CliError::WriteOutput)?;
    Ok(summary)
}

#[cfg(test)]
pub(crate) fn borings_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ExportConfig, CliError> {
    let merged = BoringsArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ExportConfig::try_from(merged)
}
