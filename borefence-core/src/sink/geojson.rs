//! File-backed [`FeatureSink`] writing GeoJSON feature collections.
//!
//! Each collection lives in `<name>.geojson` inside the output or scratch
//! directory. The schema (geometry type and ordered field list) travels in a
//! `borefence:schema` foreign member, so a reopened workspace enforces the
//! same rules as the sink that created it.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use geo::{Coord, Geometry, LineString, Point};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use borefence_fs::{open_workspace_dir, read_optional, remove_if_present, replace_file};

use super::{
    Attributes, CollectionId, Feature, FeatureSink, FieldDef, FieldType, FieldValue,
    GeometryType, Layer, SinkError, Workspace,
};

const EXTENSION: &str = "geojson";

/// Raised when a GeoJSON workspace directory cannot be opened.
#[derive(Debug, Error)]
#[error("failed to open {workspace} workspace at {path}: {source}")]
pub struct OpenWorkspaceError {
    /// Which workspace failed to open.
    pub workspace: Workspace,
    /// Requested directory.
    pub path: Utf8PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

/// Feature sink persisting every collection as a GeoJSON file.
///
/// Every mutating call reads, validates and rewrites the whole collection
/// file, so inserting `n` rows one at a time costs `O(n²)` bytes of I/O. This
/// keeps each file complete and reopenable after any single call; use
/// [`MemorySink`](super::MemorySink) for large intermediate results.
///
/// Numbers must be finite: NaN or infinite coordinates and values are
/// rejected with [`SinkError::NonFinite`] and leave the file unchanged.
///
/// # Examples
///
/// ```no_run
/// use borefence_core::{BoringCollection, GeoJsonSink};
/// use camino::Utf8Path;
///
/// let mut borings = BoringCollection::new();
/// borings.register("B1", 10.0, 100.0);
/// borings.attach_data("B1", vec![2.0], vec![7.1]);
///
/// let mut sink = GeoJsonSink::open(Utf8Path::new("out"), Utf8Path::new("out/scratch"))
///     .expect("open workspace");
/// borings.export_fence(&mut sink, "BoringFence").expect("export");
/// // out/BoringFence.geojson now holds one point.
/// ```
#[derive(Debug)]
pub struct GeoJsonSink {
    output: Dir,
    scratch: Dir,
    output_path: Utf8PathBuf,
    scratch_path: Utf8PathBuf,
    diagnostics: Vec<String>,
}

impl GeoJsonSink {
    /// Open (creating when needed) the output and scratch directories.
    ///
    /// # Errors
    /// Returns [`OpenWorkspaceError`] when either directory cannot be
    /// created or opened.
    pub fn open(output: &Utf8Path, scratch: &Utf8Path) -> Result<Self, OpenWorkspaceError> {
        let open = |workspace, path: &Utf8Path| {
            open_workspace_dir(path).map_err(|source| OpenWorkspaceError {
                workspace,
                path: path.to_path_buf(),
                source,
            })
        };
        Ok(Self {
            output: open(Workspace::Output, output)?,
            scratch: open(Workspace::Scratch, scratch)?,
            output_path: output.to_path_buf(),
            scratch_path: scratch.to_path_buf(),
            diagnostics: Vec::new(),
        })
    }

    /// Location of the file backing `collection`.
    #[must_use]
    pub fn path_of(&self, collection: &CollectionId) -> Utf8PathBuf {
        let root = match collection.workspace() {
            Workspace::Output => &self.output_path,
            Workspace::Scratch => &self.scratch_path,
        };
        root.join(file_name(collection))
    }

    /// Diagnostics reported so far, oldest first.
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Read a stored collection.
    ///
    /// # Errors
    /// Returns [`SinkError::NotFound`] when no file backs `collection`, or an
    /// I/O or decoding error when it cannot be read.
    pub fn layer(&self, collection: &CollectionId) -> Result<Layer, SinkError> {
        let contents = read_optional(self.dir(collection), &file_name(collection))
            .map_err(io_error(collection))?
            .ok_or_else(|| SinkError::NotFound {
                collection: collection.clone(),
            })?;
        let document: CollectionDocument =
            serde_json::from_str(&contents).map_err(|source| SinkError::Decode {
                collection: collection.clone(),
                source,
            })?;
        document.into_layer(collection)
    }

    const fn dir(&self, collection: &CollectionId) -> &Dir {
        match collection.workspace() {
            Workspace::Output => &self.output,
            Workspace::Scratch => &self.scratch,
        }
    }

    fn save(&self, collection: &CollectionId, layer: &Layer) -> Result<(), SinkError> {
        let document = CollectionDocument::from_layer(collection, layer)?;
        let bytes = serde_json::to_vec_pretty(&document).map_err(|source| SinkError::Encode {
            collection: collection.clone(),
            source,
        })?;
        replace_file(self.dir(collection), &file_name(collection), &bytes)
            .map_err(io_error(collection))
    }

    fn create(&self, collection: CollectionId, layer: &Layer) -> Result<CollectionId, SinkError> {
        if !is_valid_name(collection.name()) {
            return Err(SinkError::InvalidName { collection });
        }
        if self.exists(&collection) {
            return Err(SinkError::AlreadyExists { collection });
        }
        self.save(&collection, layer)?;
        Ok(collection)
    }

    fn update<T, F>(&self, collection: &CollectionId, change: F) -> Result<T, SinkError>
    where
        F: FnOnce(&mut Layer) -> Result<T, SinkError>,
    {
        let mut layer = self.layer(collection)?;
        let outcome = change(&mut layer)?;
        self.save(collection, &layer)?;
        Ok(outcome)
    }
}

impl FeatureSink for GeoJsonSink {
    fn create_feature_collection(
        &mut self,
        workspace: Workspace,
        name: &str,
        geometry_type: GeometryType,
    ) -> Result<CollectionId, SinkError> {
        self.create(
            CollectionId::new(workspace, name),
            &Layer::new(geometry_type),
        )
    }

    fn add_field(
        &mut self,
        collection: &CollectionId,
        field: &str,
        field_type: FieldType,
    ) -> Result<(), SinkError> {
        self.update(collection, |layer| {
            layer.add_field(collection, field, field_type)
        })
    }

    fn insert_feature(
        &mut self,
        collection: &CollectionId,
        feature: Feature,
    ) -> Result<(), SinkError> {
        self.update(collection, |layer| layer.insert(collection, feature))
    }

    fn points_to_line(
        &mut self,
        points: &CollectionId,
        output: &str,
    ) -> Result<CollectionId, SinkError> {
        let polyline = self.layer(points)?.to_polyline(points)?;
        self.create(CollectionId::scratch(output), &polyline)
    }

    fn calculate_field(
        &mut self,
        collection: &CollectionId,
        field: &str,
        value: FieldValue,
    ) -> Result<(), SinkError> {
        self.update(collection, |layer| {
            layer.calculate(collection, field, &value)
        })
    }

    fn copy_features(
        &mut self,
        source: &CollectionId,
        destination: &CollectionId,
    ) -> Result<usize, SinkError> {
        let source_layer = self.layer(source)?;
        self.update(destination, |layer| {
            layer.append(destination, source_layer.features())
        })
    }

    fn exists(&self, collection: &CollectionId) -> bool {
        is_valid_name(collection.name()) && self.dir(collection).is_file(file_name(collection))
    }

    fn delete(&mut self, collection: &CollectionId) -> Result<(), SinkError> {
        let removed = remove_if_present(self.dir(collection), &file_name(collection))
            .map_err(io_error(collection))?;
        if removed {
            Ok(())
        } else {
            Err(SinkError::NotFound {
                collection: collection.clone(),
            })
        }
    }

    fn report_diagnostic(&mut self, message: &str) {
        warn!("{message}");
        self.diagnostics.push(message.to_owned());
    }
}

fn file_name(collection: &CollectionId) -> String {
    format!("{}.{EXTENSION}", collection.name())
}

/// Names become file stems, so they must be a single non-hidden segment.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

fn io_error(collection: &CollectionId) -> impl FnOnce(std::io::Error) -> SinkError + '_ {
    move |source| SinkError::Io {
        collection: collection.clone(),
        source,
    }
}

#[derive(Debug, Serialize, Deserialize)]
enum CollectionTag {
    FeatureCollection,
}

#[derive(Debug, Serialize, Deserialize)]
enum FeatureTag {
    Feature,
}

#[derive(Debug, Serialize, Deserialize)]
struct Schema {
    geometry: GeometryType,
    fields: Vec<FieldDef>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionDocument {
    #[serde(rename = "type")]
    tag: CollectionTag,
    #[serde(rename = "borefence:schema")]
    schema: Schema,
    features: Vec<FeatureDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FeatureDocument {
    #[serde(rename = "type")]
    tag: FeatureTag,
    geometry: GeometryDocument,
    properties: Attributes,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeometryDocument {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
}

impl GeometryDocument {
    fn is_finite(&self) -> bool {
        let finite = |[x, y]: &[f64; 2]| x.is_finite() && y.is_finite();
        match self {
            Self::Point { coordinates } => finite(coordinates),
            Self::LineString { coordinates } => coordinates.iter().all(finite),
        }
    }
}

fn non_finite(collection: &CollectionId, component: &str) -> SinkError {
    SinkError::NonFinite {
        collection: collection.clone(),
        component: component.to_owned(),
    }
}

impl CollectionDocument {
    fn from_layer(collection: &CollectionId, layer: &Layer) -> Result<Self, SinkError> {
        let features = layer
            .features()
            .iter()
            .map(|feature| {
                let geometry = match &feature.geometry {
                    Geometry::Point(point) => GeometryDocument::Point {
                        coordinates: [point.x(), point.y()],
                    },
                    Geometry::LineString(line) => GeometryDocument::LineString {
                        coordinates: line.coords().map(|c| [c.x, c.y]).collect(),
                    },
                    _ => {
                        return Err(SinkError::GeometryMismatch {
                            collection: collection.clone(),
                            expected: layer.geometry_type(),
                        });
                    }
                };
                if !geometry.is_finite() {
                    return Err(non_finite(collection, "geometry"));
                }
                if let Some((field, _)) = feature
                    .attributes
                    .iter()
                    .find(|(_, value)| value.as_double().is_some_and(|v| !v.is_finite()))
                {
                    return Err(non_finite(collection, field));
                }
                Ok(FeatureDocument {
                    tag: FeatureTag::Feature,
                    geometry,
                    properties: feature.attributes.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            tag: CollectionTag::FeatureCollection,
            schema: Schema {
                geometry: layer.geometry_type(),
                fields: layer.fields().to_vec(),
            },
            features,
        })
    }

    fn into_layer(self, collection: &CollectionId) -> Result<Layer, SinkError> {
        let mut layer = Layer::from_parts(self.schema.geometry, self.schema.fields, Vec::new());
        for document in self.features {
            let geometry: Geometry<f64> = match document.geometry {
                GeometryDocument::Point { coordinates: [x, y] } => Point::new(x, y).into(),
                GeometryDocument::LineString { coordinates } => coordinates
                    .into_iter()
                    .map(|[x, y]| Coord { x, y })
                    .collect::<LineString<f64>>()
                    .into(),
            };
            layer.insert(
                collection,
                Feature {
                    geometry,
                    attributes: document.properties,
                },
            )?;
        }
        Ok(layer)
    }
}
