//! Facade crate for the borefence fence exporter.
//!
//! This crate re-exports the boring and raster collections, the sink trait and
//! the in-memory sink. The GeoJSON workspace sink sits behind the
//! `sink-geojson` feature.

#![forbid(unsafe_code)]

pub use borefence_core::sink;
pub use borefence_core::{
    BORE_ID_FIELD, BoringCollection, BoringRecord, ExportFailure, ExportSummary, FeatureSink,
    MemorySink, PartialExport, RASTER_ID_FIELD, RasterCollection, RasterRecord, SinkError,
    TypeConversionError, VALUE_FIELD,
};

#[cfg(feature = "sink-geojson")]
pub use borefence_core::GeoJsonSink;

#[cfg(feature = "test-support")]
pub use borefence_core::test_support;
