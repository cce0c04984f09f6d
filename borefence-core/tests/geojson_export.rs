//! End-to-end exports into a GeoJSON workspace on disk.
#![cfg(feature = "sink-geojson")]

use borefence_core::sink::CollectionId;
use borefence_core::{
    BoringCollection, ExportFailure, GeoJsonSink, RasterCollection, SinkError,
    TEMP_LINE_COLLECTION, TEMP_POINT_COLLECTION,
};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn sink(&self) -> GeoJsonSink {
        GeoJsonSink::open(&self.root, &self.root.join("scratch"))
            .unwrap_or_else(|err| panic!("open workspace: {err}"))
    }

    fn read(&self, name: &str) -> Value {
        let path = self.root.join(format!("{name}.geojson"));
        let raw = std::fs::read_to_string(path.as_std_path())
            .unwrap_or_else(|err| panic!("read {path}: {err}"));
        serde_json::from_str(&raw).unwrap_or_else(|err| panic!("parse {path}: {err}"))
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap_or_else(|err| panic!("create temporary directory: {err}"));
    let root = Utf8PathBuf::from_path_buf(dir.path().join("gis"))
        .unwrap_or_else(|path| panic!("non UTF-8 temp path {}", path.display()));
    Workspace { _dir: dir, root }
}

#[rstest]
fn boring_fence_is_written_as_points(workspace: Workspace) {
    let mut borings = BoringCollection::new();
    borings.register("B1", 10.0, 100.0);
    borings.attach_data("B1", vec![2.0, 5.0], vec![7.1, 9.3]);
    let mut sink = workspace.sink();

    let summary = borings
        .export_fence(&mut sink, "BoringFence")
        .unwrap_or_else(|err| panic!("export: {err}"));

    assert_eq!(summary.features_written, 2);
    let document = workspace.read("BoringFence");
    let features = document["features"]
        .as_array()
        .unwrap_or_else(|| panic!("features array"));
    let rows: Vec<_> = features
        .iter()
        .map(|f| (f["geometry"]["coordinates"].clone(), f["properties"].clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (json!([10.0, 98.0]), json!({"BOREID": "B1", "VALUE": 7.1})),
            (json!([10.0, 95.0]), json!({"BOREID": "B1", "VALUE": 9.3})),
        ]
    );
}

#[rstest]
fn raster_fence_is_written_as_lines_without_scratch_leftovers(workspace: Workspace) {
    let mut rasters = RasterCollection::new();
    rasters.register("r/a.tif");
    for (x, y) in [(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)] {
        rasters.add_fence_vertex("r/a.tif", x, y);
    }
    let mut sink = workspace.sink();

    rasters
        .export_fence(&mut sink, "RasterFence")
        .unwrap_or_else(|err| panic!("export: {err}"));

    let document = workspace.read("RasterFence");
    assert_eq!(document["features"][0]["geometry"]["type"], "LineString");
    assert_eq!(
        document["features"][0]["geometry"]["coordinates"],
        json!([[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]])
    );
    assert_eq!(document["features"][0]["properties"]["RasterID"], "a.tif");
    for name in [TEMP_POINT_COLLECTION, TEMP_LINE_COLLECTION] {
        let path = sink.path_of(&CollectionId::scratch(name));
        assert!(!path.as_std_path().exists(), "{path} should be removed");
    }
}

#[rstest]
fn second_export_to_same_name_leaves_first_intact(workspace: Workspace) {
    let mut borings = BoringCollection::new();
    borings.register("B1", 0.0, 10.0);
    borings.attach_data("B1", vec![1.0], vec![3.0]);
    let mut sink = workspace.sink();
    borings
        .export_fence(&mut sink, "BoringFence")
        .unwrap_or_else(|err| panic!("first export: {err}"));

    let partial = borings
        .export_fence(&mut sink, "BoringFence")
        .expect_err("collection already exists");

    assert_eq!(partial.written, 0);
    assert_eq!(sink.diagnostics().len(), 1);
    let document = workspace.read("BoringFence");
    assert_eq!(document["features"].as_array().map(Vec::len), Some(1));
}

#[rstest]
fn non_finite_boring_stops_export_with_readable_output(workspace: Workspace) {
    let mut borings = BoringCollection::new();
    borings
        .register_parsed("B1", "NaN", "100")
        .unwrap_or_else(|err| panic!("NaN parses as f64: {err}"));
    borings.attach_data("B1", vec![1.0, 2.0], vec![3.0, 4.0]);
    let mut sink = workspace.sink();

    let partial = borings
        .export_fence(&mut sink, "BoringFence")
        .expect_err("non-finite coordinate");

    assert_eq!(partial.written, 0);
    assert!(matches!(
        partial.failures.as_slice(),
        [ExportFailure::Sink {
            source: SinkError::NonFinite { .. },
            ..
        }]
    ));
    let layer = sink
        .layer(&CollectionId::output("BoringFence"))
        .unwrap_or_else(|err| panic!("collection must stay readable: {err}"));
    assert!(layer.features().is_empty());
}

#[rstest]
fn short_rasters_are_skipped_in_geojson(workspace: Workspace) {
    let mut rasters = RasterCollection::new();
    rasters.register("r/empty.tif");
    rasters.register("r/single.tif");
    rasters.add_fence_vertex("r/single.tif", 1.0, 1.0);
    let mut sink = workspace.sink();

    let summary = rasters
        .export_fence(&mut sink, "RasterFence")
        .unwrap_or_else(|err| panic!("export: {err}"));

    assert_eq!(summary.features_written, 0);
    assert_eq!(workspace.read("RasterFence")["features"], json!([]));
}
