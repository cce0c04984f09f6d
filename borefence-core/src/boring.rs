//! Borehole samples and the vertical point fence derived from them.

use std::num::ParseFloatError;

use geo::Point;
use log::debug;
use thiserror::Error;

use crate::export::{ExportFailure, ExportProgress, ExportSummary, PartialExport};
use crate::sink::{CollectionId, Feature, FeatureSink, FieldType, GeometryType, Workspace};

/// Field holding the boring identifier on exported points.
pub const BORE_ID_FIELD: &str = "BOREID";
/// Field holding the measured value on exported points.
pub const VALUE_FIELD: &str = "VALUE";

/// A sample location with depth-indexed measurements.
///
/// `depths` and `values` are parallel sequences. The exported point for
/// index `i` sits at `(x, elevation - depths[i])`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoringRecord {
    /// Boring identifier.
    pub id: String,
    /// Planar position of the boring.
    pub x: f64,
    /// Surface elevation at the boring.
    pub elevation: f64,
    /// Downhole depth offsets.
    pub depths: Vec<f64>,
    /// Measured values, one per depth.
    pub values: Vec<f64>,
}

impl BoringRecord {
    /// Create a record with no samples.
    pub fn new(id: impl Into<String>, x: f64, elevation: f64) -> Self {
        Self {
            id: id.into(),
            x,
            elevation,
            depths: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Elevation of the sample at `depth`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "sample elevation is surface elevation minus depth"
    )]
    pub fn elevation_at(&self, depth: f64) -> f64 {
        self.elevation - depth
    }

    /// Fence points paired with their values, in depth order.
    ///
    /// # Errors
    /// Returns [`ExportFailure::LengthMismatch`] at the first depth without
    /// a value; points before it are still yielded.
    pub fn samples(&self) -> impl Iterator<Item = Result<(Point<f64>, f64), ExportFailure>> + '_ {
        self.depths.iter().enumerate().map(|(index, depth)| {
            let value = self
                .values
                .get(index)
                .ok_or_else(|| ExportFailure::LengthMismatch {
                    id: self.id.clone(),
                    index,
                    depths: self.depths.len(),
                    values: self.values.len(),
                })?;
            Ok((Point::new(self.x, self.elevation_at(*depth)), *value))
        })
    }
}

/// Raised when a coordinate supplied as text is not a number.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{field} value {raw:?} is not numeric")]
pub struct TypeConversionError {
    /// Name of the offending input.
    pub field: &'static str,
    /// Text that failed to parse.
    pub raw: String,
    /// Parser error.
    #[source]
    pub source: ParseFloatError,
}

/// Parse a coordinate supplied as text, ignoring surrounding whitespace.
///
/// `NaN` and `inf` parse as they do for [`f64`]; file-backed sinks refuse
/// to store such points when the fence is exported.
///
/// # Errors
/// Returns [`TypeConversionError`] when `raw` is not a floating-point number.
///
/// # Examples
///
/// ```
/// use borefence_core::parse_coordinate;
///
/// assert_eq!(parse_coordinate("x", " 12.5 "), Ok(12.5));
/// assert!(parse_coordinate("x", "east").is_err());
/// ```
pub fn parse_coordinate(field: &'static str, raw: &str) -> Result<f64, TypeConversionError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|source| TypeConversionError {
            field,
            raw: raw.to_owned(),
            source,
        })
}

/// Ordered set of borings, in registration order.
///
/// # Examples
///
/// ```
/// use borefence_core::{BoringCollection, sink::{CollectionId, MemorySink}};
///
/// let mut borings = BoringCollection::new();
/// borings.register("B1", 10.0, 100.0);
/// borings.attach_data("B1", vec![2.0, 5.0], vec![7.1, 9.3]);
///
/// let mut sink = MemorySink::new();
/// let summary = borings.export_fence(&mut sink, "BoringFence").expect("export");
/// assert_eq!(summary.features_written, 2);
/// assert_eq!(sink.features(&CollectionId::output("BoringFence")).map(<[_]>::len), Some(2));
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BoringCollection {
    records: Vec<BoringRecord>,
}

impl BoringCollection {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a boring with no samples. Identifiers are not checked for
    /// uniqueness.
    pub fn register(&mut self, id: impl Into<String>, x: f64, elevation: f64) {
        self.records.push(BoringRecord::new(id, x, elevation));
    }

    /// Register a boring whose coordinates arrive as text.
    ///
    /// # Errors
    /// Returns [`TypeConversionError`] when `x` or `elevation` is not
    /// numeric; nothing is registered in that case.
    pub fn register_parsed(
        &mut self,
        id: impl Into<String>,
        x: &str,
        elevation: &str,
    ) -> Result<(), TypeConversionError> {
        let x_value = parse_coordinate("x", x)?;
        let elevation_value = parse_coordinate("elevation", elevation)?;
        self.register(id, x_value, elevation_value);
        Ok(())
    }

    /// Replace the samples of every boring whose id equals `id`.
    ///
    /// Returns the number of borings updated. An unknown id updates nothing.
    /// `depths` and `values` are expected to have equal lengths; a mismatch
    /// is reported when the fence is exported.
    pub fn attach_data(&mut self, id: &str, depths: Vec<f64>, values: Vec<f64>) -> usize {
        let mut matched = 0;
        for record in self.records.iter_mut().filter(|record| record.id == id) {
            record.depths.clone_from(&depths);
            record.values.clone_from(&values);
            matched += 1;
        }
        if matched == 0 {
            debug!("no boring registered as {id}; samples ignored");
        }
        matched
    }

    /// Borings in registration order.
    #[must_use]
    pub fn records(&self) -> &[BoringRecord] {
        &self.records
    }

    /// Iterate over borings in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, BoringRecord> {
        self.records.iter()
    }

    /// First boring registered as `id`.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&BoringRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Number of registered borings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no boring is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write one point per sample into a new point collection named
    /// `collection_name` in the sink's output workspace.
    ///
    /// The collection carries a text `BOREID` field and a numeric `VALUE`
    /// field. The export stops at the first failure, which is reported
    /// through [`FeatureSink::report_diagnostic`]; points written before it
    /// stay in place.
    ///
    /// # Errors
    /// Returns [`PartialExport`] describing how far the export got.
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
                GeometryType::Point,
            )
            .map_err(ExportFailure::sink("create feature collection"))?;
        sink.add_field(&output, BORE_ID_FIELD, FieldType::Text)
            .map_err(ExportFailure::sink("add field"))?;
        sink.add_field(&output, VALUE_FIELD, FieldType::Double)
            .map_err(ExportFailure::sink("add field"))?;

        for record in &self.records {
            debug!("writing {} sample(s) for boring {}", record.depths.len(), record.id);
            for sample in record.samples() {
                let (point, value) = sample?;
                let feature = Feature::new(point)
                    .with_attribute(BORE_ID_FIELD, record.id.as_str())
                    .with_attribute(VALUE_FIELD, value);
                sink.insert_feature(&output, feature)
                    .map_err(ExportFailure::sink("insert feature"))?;
                progress.wrote(1);
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a BoringCollection {
    type Item = &'a BoringRecord;
    type IntoIter = std::slice::Iter<'a, BoringRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{FieldValue, MemorySink, SinkError};
    use crate::test_support::{FailingSink, SinkOperation};
    use geo::Geometry;
    use rstest::{fixture, rstest};

    #[fixture]
    fn borings() -> BoringCollection {
        let mut borings = BoringCollection::new();
        borings.register("B1", 10.0, 100.0);
        borings.register("B2", 20.0, 50.0);
        borings
    }

    fn exported_points(sink: &MemorySink, name: &str) -> Vec<(f64, f64, String, f64)> {
        sink.features(&CollectionId::output(name))
            .unwrap_or_default()
            .iter()
            .map(|feature| {
                let Geometry::Point(point) = feature.geometry else {
                    panic!("expected point geometry");
                };
                let id = feature
                    .attribute(BORE_ID_FIELD)
                    .and_then(FieldValue::as_text)
                    .unwrap_or_default()
                    .to_owned();
                let value = feature
                    .attribute(VALUE_FIELD)
                    .and_then(FieldValue::as_double)
                    .unwrap_or(f64::NAN);
                (point.x(), point.y(), id, value)
            })
            .collect()
    }

    #[rstest]
    fn register_starts_with_empty_samples(borings: BoringCollection) {
        let record = borings.find("B1").expect("B1 registered");
        assert!(record.depths.is_empty());
        assert!(record.values.is_empty());
        assert_eq!(borings.len(), 2);
    }

    #[rstest]
    #[case("10", "100.5", 10.0, 100.5)]
    #[case(" -3.25 ", "1e2", -3.25, 100.0)]
    fn register_parsed_coerces_text(
        #[case] x: &str,
        #[case] elevation: &str,
        #[case] expected_x: f64,
        #[case] expected_elevation: f64,
    ) {
        let mut borings = BoringCollection::new();
        borings.register_parsed("B9", x, elevation).expect("numeric input");
        let record = borings.find("B9").expect("B9 registered");
        assert_eq!(record.x, expected_x);
        assert_eq!(record.elevation, expected_elevation);
    }

    #[rstest]
    #[case("east", "100", "x")]
    #[case("10", "", "elevation")]
    fn register_parsed_rejects_non_numeric(
        #[case] x: &str,
        #[case] elevation: &str,
        #[case] field: &str,
    ) {
        let mut borings = BoringCollection::new();
        let err = borings
            .register_parsed("B9", x, elevation)
            .expect_err("non-numeric input");
        assert_eq!(err.field, field);
        assert!(borings.is_empty());
    }

    #[rstest]
    fn attach_overwrites_previous_samples(mut borings: BoringCollection) {
        borings.attach_data("B1", vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]);
        borings.attach_data("B1", vec![4.0], vec![40.0]);
        let record = borings.find("B1").expect("B1 registered");
        assert_eq!(record.depths, vec![4.0]);
        assert_eq!(record.values, vec![40.0]);
    }

    #[rstest]
    fn attach_updates_every_duplicate(mut borings: BoringCollection) {
        borings.register("B1", 99.0, 9.0);
        let matched = borings.attach_data("B1", vec![1.0], vec![5.0]);
        assert_eq!(matched, 2);
        let updated: Vec<_> = borings.iter().filter(|r| r.id == "B1").collect();
        assert!(updated.iter().all(|r| r.depths == [1.0] && r.values == [5.0]));
    }

    #[rstest]
    fn attach_unknown_id_changes_nothing(mut borings: BoringCollection) {
        let before = borings.clone();
        assert_eq!(borings.attach_data("B404", vec![1.0], vec![1.0]), 0);
        assert_eq!(borings, before);
    }

    #[rstest]
    fn records_own_separate_sample_buffers(mut borings: BoringCollection) {
        borings.attach_data("B1", vec![1.0], vec![1.0]);
        let other = borings.find("B2").expect("B2 registered");
        assert!(other.depths.is_empty());
    }

    #[rstest]
    fn export_writes_points_below_surface() {
        let mut borings = BoringCollection::new();
        borings.register("B1", 10.0, 100.0);
        borings.attach_data("B1", vec![2.0, 5.0], vec![7.1, 9.3]);
        let mut sink = MemorySink::new();

        let summary = borings
            .export_fence(&mut sink, "BoringFence")
            .expect("export succeeds");

        assert_eq!(summary.features_written, 2);
        assert_eq!(
            exported_points(&sink, "BoringFence"),
            vec![
                (10.0, 98.0, "B1".to_owned(), 7.1),
                (10.0, 95.0, "B1".to_owned(), 9.3),
            ]
        );
        let layer = sink
            .collection(&CollectionId::output("BoringFence"))
            .expect("output layer");
        let fields: Vec<_> = layer
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), f.field_type))
            .collect();
        assert_eq!(
            fields,
            vec![(BORE_ID_FIELD, FieldType::Text), (VALUE_FIELD, FieldType::Double)]
        );
    }

    #[rstest]
    fn export_counts_every_sample(mut borings: BoringCollection) {
        borings.attach_data("B1", vec![1.0, 2.0], vec![0.1, 0.2]);
        borings.attach_data("B2", vec![3.0, 4.0, 5.0], vec![0.3, 0.4, 0.5]);
        let mut sink = MemorySink::new();
        let summary = borings.export_fence(&mut sink, "fence").expect("export");
        assert_eq!(summary.features_written, 5);
    }

    #[rstest]
    fn export_without_samples_creates_empty_collection(borings: BoringCollection) {
        let mut sink = MemorySink::new();
        let summary = borings.export_fence(&mut sink, "fence").expect("export");
        assert_eq!(summary.features_written, 0);
        assert_eq!(sink.features(&CollectionId::output("fence")), Some(&[][..]));
    }

    #[rstest]
    fn export_stops_at_length_mismatch(mut borings: BoringCollection) {
        borings.attach_data("B1", vec![1.0, 2.0, 3.0], vec![10.0]);
        borings.attach_data("B2", vec![1.0], vec![20.0]);
        let mut sink = MemorySink::new();

        let partial = borings
            .export_fence(&mut sink, "fence")
            .expect_err("mismatch fails");

        assert_eq!(partial.written, 1);
        assert!(matches!(
            partial.failures.as_slice(),
            [ExportFailure::LengthMismatch { index: 1, depths: 3, values: 1, .. }]
        ));
        assert_eq!(sink.diagnostics().len(), 1);
        assert_eq!(exported_points(&sink, "fence").len(), 1);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    fn export_keeps_points_before_nth_insert_failure(mut borings: BoringCollection, #[case] n: usize) {
        borings.attach_data("B1", vec![1.0, 2.0], vec![1.0, 2.0]);
        borings.attach_data("B2", vec![1.0, 2.0], vec![3.0, 4.0]);
        let mut sink = FailingSink::new(MemorySink::new(), SinkOperation::InsertFeature, n);

        let partial = borings
            .export_fence(&mut sink, "fence")
            .expect_err("injected failure");

        assert_eq!(partial.written, n - 1);
        assert!(matches!(
            partial.failures.as_slice(),
            [ExportFailure::Sink {
                source: SinkError::Injected { .. },
                ..
            }]
        ));
        let inner = sink.into_inner();
        assert_eq!(inner.diagnostics().len(), 1);
        assert_eq!(exported_points(&inner, "fence").len(), n - 1);
    }

    #[rstest]
    fn export_into_existing_collection_reports_failure(borings: BoringCollection) {
        let mut sink = MemorySink::new();
        borings.export_fence(&mut sink, "fence").expect("first export");
        let partial = borings
            .export_fence(&mut sink, "fence")
            .expect_err("collection exists");
        assert_eq!(partial.written, 0);
        assert!(matches!(
            partial.failures.as_slice(),
            [ExportFailure::Sink {
                source: SinkError::AlreadyExists { .. },
                ..
            }]
        ));
    }
}
