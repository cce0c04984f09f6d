//! Persistence boundary for fence exports.
//!
//! The [`FeatureSink`] trait describes the geoprocessing operations the
//! collections need: creating typed feature collections, inserting rows,
//! converting an ordered point set into a polyline, and cleaning up scratch
//! artefacts. The sink owns geometry storage; callers only decide which
//! features to write and in which order.

use std::collections::BTreeMap;
use std::fmt;

use geo::Geometry;
use thiserror::Error;

mod layer;
mod memory;
mod scratch;

#[cfg(feature = "sink-geojson")]
mod geojson;

pub use layer::{FieldDef, Layer};
pub use memory::MemorySink;
pub(crate) use scratch::ScratchScope;

#[cfg(feature = "sink-geojson")]
pub use geojson::{GeoJsonSink, OpenWorkspaceError};

/// Location in which a sink stores a feature collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Workspace {
    /// Persistent output location chosen by the caller.
    Output,
    /// Temporary location for intermediate artefacts.
    Scratch,
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output => f.write_str("output"),
            Self::Scratch => f.write_str("scratch"),
        }
    }
}

/// Identifies a feature collection inside a sink.
///
/// Identifiers can be built before the collection exists, which lets
/// cleanup code ask [`FeatureSink::exists`] about resources that may never
/// have been created.
///
/// # Examples
///
/// ```
/// use borefence_core::sink::{CollectionId, Workspace};
///
/// let id = CollectionId::scratch("TempRasterFencePoint");
/// assert_eq!(id.workspace(), Workspace::Scratch);
/// assert_eq!(id.to_string(), "scratch/TempRasterFencePoint");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionId {
    workspace: Workspace,
    name: String,
}

impl CollectionId {
    /// Build an identifier for `name` within `workspace`.
    pub fn new(workspace: Workspace, name: impl Into<String>) -> Self {
        Self {
            workspace,
            name: name.into(),
        }
    }

    /// Identifier for a collection in the output workspace.
    pub fn output(name: impl Into<String>) -> Self {
        Self::new(Workspace::Output, name)
    }

    /// Identifier for a collection in the scratch workspace.
    pub fn scratch(name: impl Into<String>) -> Self {
        Self::new(Workspace::Scratch, name)
    }

    /// Workspace holding the collection.
    #[must_use]
    pub const fn workspace(&self) -> Workspace {
        self.workspace
    }

    /// Collection name within its workspace.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace, self.name)
    }
}

/// Geometry stored by a feature collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "sink-geojson", derive(serde::Serialize, serde::Deserialize))]
pub enum GeometryType {
    /// One coordinate per feature.
    Point,
    /// One ordered line string per feature.
    Polyline,
}

impl GeometryType {
    /// Whether `geometry` can be stored in a collection of this type.
    #[must_use]
    pub fn accepts(self, geometry: &Geometry<f64>) -> bool {
        matches!(
            (self, geometry),
            (Self::Point, Geometry::Point(_)) | (Self::Polyline, Geometry::LineString(_))
        )
    }
}

/// Attribute column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "sink-geojson", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    /// Free text.
    Text,
    /// Double precision number.
    Double,
}

/// Attribute value stored on a feature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "sink-geojson",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum FieldValue {
    /// Text value.
    Text(String),
    /// Numeric value.
    Double(f64),
}

impl FieldValue {
    /// Column type able to hold this value.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::Text,
            Self::Double(_) => FieldType::Double,
        }
    }

    /// Borrow the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Double(_) => None,
        }
    }

    /// Return the numeric payload, if any.
    #[must_use]
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

/// Attribute values keyed by field name.
pub type Attributes = BTreeMap<String, FieldValue>;

/// A single row: geometry plus attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Point or line string geometry.
    pub geometry: Geometry<f64>,
    /// Attribute values keyed by field name.
    pub attributes: Attributes,
}

impl Feature {
    /// Create a feature with no attributes.
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            attributes: Attributes::new(),
        }
    }

    /// Set an attribute, replacing any previous value for `field`.
    #[must_use]
    pub fn with_attribute(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.attributes.insert(field.to_owned(), value.into());
        self
    }

    /// Look up an attribute by field name.
    #[must_use]
    pub fn attribute(&self, field: &str) -> Option<&FieldValue> {
        self.attributes.get(field)
    }
}

/// Errors raised by a [`FeatureSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// A collection with the same identifier already exists.
    #[error("feature collection {collection} already exists")]
    AlreadyExists {
        /// Identifier that clashed.
        collection: CollectionId,
    },
    /// The collection name cannot be used as a storage key.
    #[error("invalid feature collection name {collection}")]
    InvalidName {
        /// Rejected identifier.
        collection: CollectionId,
    },
    /// The referenced collection does not exist.
    #[error("feature collection {collection} does not exist")]
    NotFound {
        /// Missing identifier.
        collection: CollectionId,
    },
    /// The field is already declared on the collection.
    #[error("field {field} already exists on {collection}")]
    DuplicateField {
        /// Collection receiving the field.
        collection: CollectionId,
        /// Field name.
        field: String,
    },
    /// A write referenced a field the collection does not declare.
    #[error("field {field} is not declared on {collection}")]
    UnknownField {
        /// Collection being written.
        collection: CollectionId,
        /// Field name.
        field: String,
    },
    /// A value did not match its column type.
    #[error("field {field} on {collection} expects {expected:?}, got {found:?}")]
    FieldTypeMismatch {
        /// Collection being written.
        collection: CollectionId,
        /// Field name.
        field: String,
        /// Declared column type.
        expected: FieldType,
        /// Type of the rejected value.
        found: FieldType,
    },
    /// A geometry did not match the collection's geometry type.
    #[error("{collection} stores {expected:?} geometries")]
    GeometryMismatch {
        /// Collection being written.
        collection: CollectionId,
        /// Geometry type declared by the collection.
        expected: GeometryType,
    },
    /// Reading or writing backing storage failed.
    #[error("I/O failure on {collection}: {source}")]
    Io {
        /// Collection being accessed.
        collection: CollectionId,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Encoding a collection for storage failed.
    #[cfg(feature = "sink-geojson")]
    #[error("failed to encode {collection}: {source}")]
    Encode {
        /// Collection being written.
        collection: CollectionId,
        /// Encoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// Stored collection data could not be decoded.
    #[cfg(feature = "sink-geojson")]
    #[error("failed to decode {collection}: {source}")]
    Decode {
        /// Collection being read.
        collection: CollectionId,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// JSON has no representation for NaN or infinite numbers.
    #[cfg(feature = "sink-geojson")]
    #[error("{collection} cannot store the non-finite {component}")]
    NonFinite {
        /// Collection being written.
        collection: CollectionId,
        /// `geometry` or the name of the offending field.
        component: String,
    },
    /// Failure injected by test support wrappers.
    #[error("injected failure during {operation}")]
    Injected {
        /// Operation that was made to fail.
        operation: &'static str,
    },
}

/// Geoprocessing and storage operations required by fence exports.
///
/// All calls are synchronous. Implementations validate schema on every
/// write so that export failures surface at the offending row.
///
/// # Examples
///
/// ```
/// use borefence_core::sink::{
///     CollectionId, Feature, FeatureSink, FieldType, GeometryType, MemorySink, Workspace,
/// };
/// use geo::Point;
///
/// # fn main() -> Result<(), borefence_core::sink::SinkError> {
/// let mut sink = MemorySink::new();
/// let id = sink.create_feature_collection(Workspace::Output, "wells", GeometryType::Point)?;
/// sink.add_field(&id, "NAME", FieldType::Text)?;
/// sink.insert_feature(&id, Feature::new(Point::new(1.0, 2.0)).with_attribute("NAME", "W1"))?;
/// assert!(sink.exists(&CollectionId::output("wells")));
/// assert_eq!(sink.features(&id).map(<[_]>::len), Some(1));
/// # Ok(())
/// # }
/// ```
pub trait FeatureSink {
    /// Create an empty feature collection.
    ///
    /// # Errors
    /// Returns [`SinkError::AlreadyExists`] when the identifier is taken.
    fn create_feature_collection(
        &mut self,
        workspace: Workspace,
        name: &str,
        geometry_type: GeometryType,
    ) -> Result<CollectionId, SinkError>;

    /// Declare an attribute column.
    ///
    /// # Errors
    /// Returns [`SinkError::NotFound`] or [`SinkError::DuplicateField`].
    fn add_field(
        &mut self,
        collection: &CollectionId,
        field: &str,
        field_type: FieldType,
    ) -> Result<(), SinkError>;

    /// Insert a single feature.
    ///
    /// # Errors
    /// Returns an error when the collection is missing or the feature does
    /// not match its schema.
    fn insert_feature(
        &mut self,
        collection: &CollectionId,
        feature: Feature,
    ) -> Result<(), SinkError>;

    /// Connect the points of `points`, in insertion order, into a single
    /// polyline stored as a new scratch collection named `output`.
    ///
    /// # Errors
    /// Returns an error when `points` is missing or is not a point
    /// collection, or when `output` already exists.
    fn points_to_line(
        &mut self,
        points: &CollectionId,
        output: &str,
    ) -> Result<CollectionId, SinkError>;

    /// Set `field` to `value` on every feature of `collection`.
    ///
    /// # Errors
    /// Returns an error when the field is undeclared or has another type.
    fn calculate_field(
        &mut self,
        collection: &CollectionId,
        field: &str,
        value: FieldValue,
    ) -> Result<(), SinkError>;

    /// Append every feature of `source` to `destination` and return the
    /// number of rows copied.
    ///
    /// # Errors
    /// Returns an error when either collection is missing or the features
    /// do not fit the destination schema.
    fn copy_features(
        &mut self,
        source: &CollectionId,
        destination: &CollectionId,
    ) -> Result<usize, SinkError>;

    /// Whether `collection` currently exists.
    fn exists(&self, collection: &CollectionId) -> bool;

    /// Delete `collection` and its features.
    ///
    /// # Errors
    /// Returns [`SinkError::NotFound`] when the collection is absent.
    fn delete(&mut self, collection: &CollectionId) -> Result<(), SinkError>;

    /// Record a diagnostic message. Never fails.
    fn report_diagnostic(&mut self, message: &str);
}
