//! Raster intercept coordinates and the polyline fences built from them.

use geo::{Coord, LineString, Point};
use log::debug;

use crate::export::{ExportFailure, ExportProgress, ExportSummary, PartialExport};
use crate::sink::{
    CollectionId, Feature, FeatureSink, FieldType, FieldValue, GeometryType, ScratchScope,
    Workspace,
};

/// Field holding the raster label on exported lines.
pub const RASTER_ID_FIELD: &str = "RasterID";
/// Scratch collection receiving a raster's fence vertices.
pub const TEMP_POINT_COLLECTION: &str = "TempRasterFencePoint";
/// Scratch collection receiving the line built from those vertices.
pub const TEMP_LINE_COLLECTION: &str = "TempRasterFenceLine";

/// A source raster and the ordered vertices of its fence line.
///
/// Vertices are stored as coordinate pairs, so the x and y sequences always
/// have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRecord {
    /// Raster location as supplied at registration.
    pub path: String,
    vertices: Vec<Coord<f64>>,
}

impl RasterRecord {
    /// Create a record with no fence vertices.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            vertices: Vec::new(),
        }
    }

    /// Append a vertex to the end of the fence.
    pub fn push_vertex(&mut self, x: f64, y: f64) {
        self.vertices.push(Coord { x, y });
    }

    /// Fence vertices in the order they were added.
    #[must_use]
    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.vertices
    }

    /// X coordinates of the fence vertices.
    pub fn fence_x(&self) -> impl Iterator<Item = f64> + '_ {
        self.vertices.iter().map(|coord| coord.x)
    }

    /// Y coordinates of the fence vertices.
    pub fn fence_y(&self) -> impl Iterator<Item = f64> + '_ {
        self.vertices.iter().map(|coord| coord.y)
    }

    /// The fence as a line string through every vertex in order.
    #[must_use]
    pub fn fence(&self) -> LineString<f64> {
        LineString::new(self.vertices.clone())
    }

    /// Label written to the `RasterID` field: the base file name of `path`.
    ///
    /// Both `/` and `\` separate path segments. A path ending in a separator
    /// keeps its full text as the label.
    ///
    /// # Examples
    ///
    /// ```
    /// use borefence_core::RasterRecord;
    ///
    /// assert_eq!(RasterRecord::new("r/a.tif").label(), "a.tif");
    /// assert_eq!(RasterRecord::new(r"C:\data\dem.tif").label(), "dem.tif");
    /// assert_eq!(RasterRecord::new("dem.tif").label(), "dem.tif");
    /// ```
    #[must_use]
    pub fn label(&self) -> &str {
        match self.path.rsplit(['/', '\\']).next() {
            Some(name) if !name.is_empty() => name,
            _ => &self.path,
        }
    }
}

/// Ordered set of rasters, in registration order.
///
/// # Examples
///
/// ```
/// use borefence_core::{RasterCollection, sink::MemorySink};
///
/// let mut rasters = RasterCollection::new();
/// rasters.register("r/a.tif");
/// for (x, y) in [(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)] {
///     rasters.add_fence_vertex("r/a.tif", x, y);
/// }
///
/// let mut sink = MemorySink::new();
/// let summary = rasters.export_fence(&mut sink, "RasterFence").expect("export");
/// assert_eq!(summary.features_written, 1);
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RasterCollection {
    records: Vec<RasterRecord>,
}

impl RasterCollection {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a raster with no vertices. Paths are not checked for
    /// uniqueness.
    pub fn register(&mut self, path: impl Into<String>) {
        self.records.push(RasterRecord::new(path));
    }

    /// Append `(x, y)` to the fence of every raster registered as `path`.
    ///
    /// Returns the number of rasters updated; an unknown path updates
    /// nothing.
    pub fn add_fence_vertex(&mut self, path: &str, x: f64, y: f64) -> usize {
        let mut matched = 0;
        for record in self.records.iter_mut().filter(|record| record.path == path) {
            record.push_vertex(x, y);
            matched += 1;
        }
        if matched == 0 {
            debug!("no raster registered as {path}; vertex ignored");
        }
        matched
    }

    /// Rasters in registration order.
    #[must_use]
    pub fn records(&self) -> &[RasterRecord] {
        &self.records
    }

    /// Iterate over rasters in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, RasterRecord> {
        self.records.iter()
    }

    /// First raster registered as `path`.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&RasterRecord> {
        self.records.iter().find(|record| record.path == path)
    }

    /// Number of registered rasters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no raster is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write one polyline per raster into a new polyline collection named
    /// `collection_name` in the sink's output workspace.
    ///
    /// A raster with fewer than two vertices produces no line and is not
    /// counted in [`ExportSummary::features_written`].
    ///
    /// Each raster's vertices go through scratch collections
    /// ([`TEMP_POINT_COLLECTION`], [`TEMP_LINE_COLLECTION`]) that are removed
    /// before the next raster is processed and on every early exit. The
    /// export stops at the first failure, which is reported through
    /// [`FeatureSink::report_diagnostic`]; lines copied before it stay.
    ///
    /// # Errors
    /// Returns [`PartialExport`] when a step failed or scratch collections
    /// could not be removed.
    pub fn export_fence<S>(
        &self,
        sink: &mut S,
        collection_name: &str,
    ) -> Result<ExportSummary, PartialExport>
    where
        S: FeatureSink + ?Sized,
    {
        let mut progress = ExportProgress::new(CollectionId::output(collection_name));
        if let Err(failure) = self.write_fence(sink, &mut progress) {
            progress.fail(sink, failure);
        }
        progress.finish()
    }

    fn write_fence<S>(&self, sink: &mut S, progress: &mut ExportProgress) -> Result<(), ExportFailure>
    where
        S: FeatureSink + ?Sized,
    {
        let output = sink
            .create_feature_collection(
                Workspace::Output,
                progress.collection().name(),
                GeometryType::Polyline,
            )
            .map_err(ExportFailure::sink("create feature collection"))?;
        sink.add_field(&output, RASTER_ID_FIELD, FieldType::Text)
            .map_err(ExportFailure::sink("add field"))?;

        for record in &self.records {
            let mut scope = ScratchScope::new(
                &mut *sink,
                [
                    CollectionId::scratch(TEMP_POINT_COLLECTION),
                    CollectionId::scratch(TEMP_LINE_COLLECTION),
                ],
            );
            let outcome = write_record(&mut *scope, record, &output);
            let cleanup = scope.release();
            let cleaned = cleanup.is_empty();
            progress.extend(cleanup);
            progress.wrote(outcome?);
            if !cleaned {
                // Leftover scratch collections would clash with the next raster.
                break;
            }
        }
        Ok(())
    }
}

/// Build one raster's line in scratch space and append it to `output`,
/// returning the number of lines copied. A raster with fewer than two
/// vertices yields no line.
fn write_record<S>(
    sink: &mut S,
    record: &RasterRecord,
    output: &CollectionId,
) -> Result<usize, ExportFailure>
where
    S: FeatureSink + ?Sized,
{
    let label = record.label();
    debug!(
        "building fence for {label} from {} vertex(es)",
        record.vertices().len()
    );
    let points = sink
        .create_feature_collection(Workspace::Scratch, TEMP_POINT_COLLECTION, GeometryType::Point)
        .map_err(ExportFailure::sink("create scratch points"))?;
    for vertex in record.vertices() {
        sink.insert_feature(&points, Feature::new(Point::from(*vertex)))
            .map_err(ExportFailure::sink("insert fence vertex"))?;
    }
    let line = sink
        .points_to_line(&points, TEMP_LINE_COLLECTION)
        .map_err(ExportFailure::sink("points to line"))?;
    sink.add_field(&line, RASTER_ID_FIELD, FieldType::Text)
        .map_err(ExportFailure::sink("add field"))?;
    sink.calculate_field(&line, RASTER_ID_FIELD, FieldValue::from(label))
        .map_err(ExportFailure::sink("calculate field"))?;
    sink.copy_features(&line, output)
        .map_err(ExportFailure::sink("copy features"))
}

impl<'a> IntoIterator for &'a RasterCollection {
    type Item = &'a RasterRecord;
    type IntoIter = std::slice::Iter<'a, RasterRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
