//! JSON inputs describing borings and raster fences.

use std::io::BufReader;

use borefence_core::{
    BoringCollection, ExportSummary, GeoJsonSink, PartialExport, RasterCollection,
};
use borefence_fs::open_utf8_file;
use camino::Utf8Path;
use log::warn;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::CliError;

/// Coordinate given either as a JSON number or as numeric text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum Coordinate {
    Number(f64),
    Text(String),
}

/// Boring location registered before samples are attached.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct BoringSite {
    pub(crate) id: String,
    pub(crate) x: Coordinate,
    pub(crate) elevation: Coordinate,
}

/// Depth-indexed samples for one boring.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct BoringSamples {
    pub(crate) id: String,
    pub(crate) depths: Vec<f64>,
    pub(crate) values: Vec<f64>,
}

/// Input for the `borings` command.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct BoringInput {
    #[serde(default)]
    pub(crate) borings: Vec<BoringSite>,
    #[serde(default)]
    pub(crate) samples: Vec<BoringSamples>,
}

/// One intercept along a raster fence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct FenceVertex {
    pub(crate) path: String,
    pub(crate) x: f64,
    pub(crate) y: f64,
}

/// Input for the `rasters` command.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct RasterInput {
    #[serde(default)]
    pub(crate) rasters: Vec<String>,
    #[serde(default)]
    pub(crate) vertices: Vec<FenceVertex>,
}

/// A decoded command input and the fence it turns into.
pub(crate) trait FenceInput: DeserializeOwned {
    /// Record kind used in log lines and unmatched-record errors.
    const KIND: &'static str;
    /// Collection built from the input.
    type Fence;

    /// Register every record, then attach data in input order.
    fn into_fence(self, strict: bool) -> Result<Self::Fence, CliError>;

    fn record_count(fence: &Self::Fence) -> usize;

    fn export(
        fence: &Self::Fence,
        sink: &mut GeoJsonSink,
        name: &str,
    ) -> Result<ExportSummary, PartialExport>;
}

/// Decode a JSON input file.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}

fn unmatched(kind: &'static str, key: &str, strict: bool) -> Result<(), CliError> {
    if strict {
        return Err(CliError::UnmatchedRecord {
            kind,
            key: key.to_owned(),
        });
    }
    warn!("{kind} {key} is not registered; its data was ignored");
    Ok(())
}

impl FenceInput for BoringInput {
    const KIND: &'static str = "boring";
    type Fence = BoringCollection;

    fn into_fence(self, strict: bool) -> Result<BoringCollection, CliError> {
        let mut borings = BoringCollection::new();
        for site in self.borings {
            match (&site.x, &site.elevation) {
                (Coordinate::Number(x), Coordinate::Number(elevation)) => {
                    borings.register(site.id, *x, *elevation);
                }
                _ => {
                    let x = site.x.to_text();
                    let elevation = site.elevation.to_text();
                    borings
                        .register_parsed(site.id.as_str(), &x, &elevation)
                        .map_err(|source| CliError::InvalidCoordinate {
                            id: site.id.clone(),
                            source,
                        })?;
                }
            }
        }
        for samples in self.samples {
            if borings.attach_data(&samples.id, samples.depths, samples.values) == 0 {
                unmatched(Self::KIND, &samples.id, strict)?;
            }
        }
        Ok(borings)
    }

    fn record_count(fence: &BoringCollection) -> usize {
        fence.len()
    }

    fn export(
        fence: &BoringCollection,
        sink: &mut GeoJsonSink,
        name: &str,
    ) -> Result<ExportSummary, PartialExport> {
        fence.export_fence(sink, name)
    }
}

impl Coordinate {
    fn to_text(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

impl FenceInput for RasterInput {
    const KIND: &'static str = "raster";
    type Fence = RasterCollection;

    fn into_fence(self, strict: bool) -> Result<RasterCollection, CliError> {
        let mut rasters = RasterCollection::new();
        for path in self.rasters {
            rasters.register(path);
        }
        for vertex in self.vertices {
            if rasters.add_fence_vertex(&vertex.path, vertex.x, vertex.y) == 0 {
                unmatched(Self::KIND, &vertex.path, strict)?;
            }
        }
        Ok(rasters)
    }

    fn record_count(fence: &RasterCollection) -> usize {
        fence.len()
    }

    fn export(
        fence: &RasterCollection,
        sink: &mut GeoJsonSink,
        name: &str,
    ) -> Result<ExportSummary, PartialExport> {
        fence.export_fence(sink, name)
    }
}
