//! Decoding JSON inputs into boring and raster collections.

use camino::Utf8PathBuf;
use geo::Coord;
use rstest::rstest;

use super::helpers::{Sandbox, sandbox};
use crate::CliError;
use crate::input::{BoringInput, Coordinate, FenceInput, RasterInput, load_json};

#[rstest]
fn coordinates_accept_numbers_and_numeric_text(sandbox: Sandbox) {
    let path = sandbox.write_input(
        "borings.json",
        r#"{"borings":[{"id":"B1","x":10,"elevation":" 100.5 "},{"id":"B2","x":"3","elevation":7}]}"#,
    );
    let input: BoringInput = load_json(&path).expect("input decodes");
    assert_eq!(input.borings[0].x, Coordinate::Number(10.0));
    assert_eq!(
        input.borings[0].elevation,
        Coordinate::Text(" 100.5 ".to_owned())
    );

    let borings = input.into_fence(false).expect("coordinates convert");
    let b1 = borings.find("B1").expect("B1 registered");
    assert_eq!((b1.x, b1.elevation), (10.0, 100.5));
    let b2 = borings.find("B2").expect("B2 registered");
    assert_eq!((b2.x, b2.elevation), (3.0, 7.0));
}

#[rstest]
fn non_numeric_elevation_names_the_boring(sandbox: Sandbox) {
    let path = sandbox.write_input(
        "borings.json",
        r#"{"borings":[{"id":"B7","x":1,"elevation":"surface"}]}"#,
    );
    let input: BoringInput = load_json(&path).expect("input decodes");
    match input.into_fence(false) {
        Err(CliError::InvalidCoordinate { id, source }) => {
            assert_eq!(id, "B7");
            assert_eq!(source.raw, "surface");
        }
        other => panic!("expected InvalidCoordinate, found {other:?}"),
    }
}

#[rstest]
#[case(false)]
#[case(true)]
fn unmatched_samples_depend_on_strictness(sandbox: Sandbox, #[case] strict: bool) {
    let path = sandbox.write_input(
        "borings.json",
        r#"{"borings":[{"id":"B1","x":0,"elevation":0}],
            "samples":[{"id":"B404","depths":[1],"values":[2]}]}"#,
    );
    let input: BoringInput = load_json(&path).expect("input decodes");
    match (strict, input.into_fence(strict)) {
        (false, Ok(borings)) => {
            let b1 = borings.find("B1").expect("B1 registered");
            assert!(b1.depths.is_empty());
        }
        (true, Err(CliError::UnmatchedRecord { kind, key })) => {
            assert_eq!(kind, "boring");
            assert_eq!(key, "B404");
        }
        (_, other) => panic!("unexpected outcome {other:?}"),
    }
}

#[rstest]
fn vertices_are_appended_in_order(sandbox: Sandbox) {
    let path = sandbox.write_input(
        "rasters.json",
        r#"{"rasters":["r/a.tif"],
            "vertices":[{"path":"r/a.tif","x":0,"y":0},{"path":"r/a.tif","x":1,"y":1}]}"#,
    );
    let input: RasterInput = load_json(&path).expect("input decodes");
    let rasters = input.into_fence(false).expect("collection builds");
    let record = rasters.find("r/a.tif").expect("raster registered");
    assert_eq!(
        record.vertices(),
        &[Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }]
    );
}

#[rstest]
fn strict_rasters_reject_unknown_paths(sandbox: Sandbox) {
    let path = sandbox.write_input(
        "rasters.json",
        r#"{"vertices":[{"path":"missing.tif","x":0,"y":0}]}"#,
    );
    let input: RasterInput = load_json(&path).expect("input decodes");
    match input.into_fence(true) {
        Err(CliError::UnmatchedRecord { kind, key }) => {
            assert_eq!(kind, "raster");
            assert_eq!(key, "missing.tif");
        }
        other => panic!("expected UnmatchedRecord, found {other:?}"),
    }
}

#[rstest]
fn missing_input_reports_its_path(sandbox: Sandbox) {
    let path: Utf8PathBuf = sandbox.root().join("absent.json");
    match load_json::<BoringInput>(&path) {
        Err(CliError::OpenInput { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected OpenInput, found {other:?}"),
    }
}

#[rstest]
fn malformed_input_reports_parse_error(sandbox: Sandbox) {
    let path = sandbox.write_input("rasters.json", r#"{"rasters": "r/a.tif"}"#);
    match load_json::<RasterInput>(&path) {
        Err(CliError::ParseInput { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected ParseInput, found {other:?}"),
    }
}
