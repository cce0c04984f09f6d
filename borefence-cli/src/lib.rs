//! Command-line interface for exporting boring and raster fences.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fence;
mod input;

pub use error::CliError;
use fence::{BoringsArgs, RastersArgs};

pub(crate) const ARG_INPUT: &str = "input";
pub(crate) const ARG_WORKSPACE: &str = "workspace";
pub(crate) const ARG_SCRATCH: &str = "scratch";
pub(crate) const ARG_NAME: &str = "name";
pub(crate) const ENV_BORINGS_INPUT: &str = "BOREFENCE_CMDS_BORINGS_INPUT";
pub(crate) const ENV_BORINGS_WORKSPACE: &str = "BOREFENCE_CMDS_BORINGS_WORKSPACE";
pub(crate) const ENV_RASTERS_INPUT: &str = "BOREFENCE_CMDS_RASTERS_INPUT";
pub(crate) const ENV_RASTERS_WORKSPACE: &str = "BOREFENCE_CMDS_RASTERS_WORKSPACE";

/// Run the borefence CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Borings(args) => fence::run_borings(args),
        Command::Rasters(args) => fence::run_rasters(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "borefence",
    about = "Export boring and raster fence diagrams as GeoJSON feature collections",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Export boring samples as a point fence.
    Borings(BoringsArgs),
    /// Export raster fence vertices as labelled polylines.
    Rasters(RastersArgs),
}

#[cfg(test)]
mod tests;
