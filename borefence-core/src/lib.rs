//! Core types for building geological fence features.
//!
//! Two independent collections feed a [`FeatureSink`](sink::FeatureSink):
//!
//! - [`BoringCollection`] holds borehole samples and exports a vertical
//!   point fence, one point per sampled depth.
//! - [`RasterCollection`] holds ordered raster intercept coordinates and
//!   exports one polyline per raster.
//!
//! Records are registered first, then receive their measurements or
//! vertices by identifier, then the whole collection is exported. Exports
//! stop at the first failure, report it through the sink's diagnostics, and
//! return a [`PartialExport`] describing what was written.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod boring;
mod export;
mod raster;
pub mod sink;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use boring::{
    BORE_ID_FIELD, BoringCollection, BoringRecord, TypeConversionError, VALUE_FIELD,
    parse_coordinate,
};
pub use export::{ExportFailure, ExportSummary, PartialExport};
pub use raster::{
    RASTER_ID_FIELD, RasterCollection, RasterRecord, TEMP_LINE_COLLECTION, TEMP_POINT_COLLECTION,
};
pub use sink::{FeatureSink, MemorySink, SinkError};

#[cfg(feature = "sink-geojson")]
pub use sink::GeoJsonSink;
