//! Outcome types shared by the fence exports.

use log::{info, warn};
use thiserror::Error;

use crate::sink::{CollectionId, FeatureSink, SinkError};

/// A single problem encountered while exporting a fence.
#[derive(Debug, Error)]
pub enum ExportFailure {
    /// The sink rejected an operation.
    #[error("{operation} failed: {source}")]
    Sink {
        /// Sink operation that failed.
        operation: &'static str,
        /// Error returned by the sink.
        #[source]
        source: SinkError,
    },
    /// A boring had fewer values than depths.
    #[error(
        "boring {id} has no value for depth index {index} ({depths} depths, {values} values)"
    )]
    LengthMismatch {
        /// Identifier of the offending boring.
        id: String,
        /// First depth index without a value.
        index: usize,
        /// Number of depths on the record.
        depths: usize,
        /// Number of values on the record.
        values: usize,
    },
    /// Deleting a scratch collection failed.
    #[error("failed to clean up {collection}: {source}")]
    Cleanup {
        /// Scratch collection that could not be removed.
        collection: CollectionId,
        /// Error returned by the sink.
        #[source]
        source: SinkError,
    },
}

impl ExportFailure {
    pub(crate) fn sink(operation: &'static str) -> impl FnOnce(SinkError) -> Self {
        move |source| Self::Sink { operation, source }
    }
}

/// Result of a fence export that wrote every feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Output collection that received the features.
    pub collection: CollectionId,
    /// Number of features written.
    pub features_written: usize,
}

/// A fence export that stopped early or could not clean up after itself.
///
/// Features written before the first failure stay in the output
/// collection; nothing is rolled back.
#[derive(Debug, Error)]
#[error(
    "export to {collection} incomplete after {written} feature(s) with {} failure(s)",
    .failures.len()
)]
pub struct PartialExport {
    /// Output collection targeted by the export.
    pub collection: CollectionId,
    /// Features written before the export stopped.
    pub written: usize,
    /// Failures in the order they occurred.
    pub failures: Vec<ExportFailure>,
}

/// Running tally for an export in progress.
#[derive(Debug)]
pub(crate) struct ExportProgress {
    collection: CollectionId,
    written: usize,
    failures: Vec<ExportFailure>,
}

impl ExportProgress {
    pub(crate) const fn new(collection: CollectionId) -> Self {
        Self {
            collection,
            written: 0,
            failures: Vec::new(),
        }
    }

    pub(crate) const fn collection(&self) -> &CollectionId {
        &self.collection
    }

    pub(crate) const fn wrote(&mut self, count: usize) {
        self.written += count;
    }

    /// Record a failure and report it through the sink's diagnostics.
    pub(crate) fn fail<S>(&mut self, sink: &mut S, failure: ExportFailure)
    where
        S: FeatureSink + ?Sized,
    {
        let message = format!("fence export to {} failed: {failure}", self.collection);
        warn!("{message}");
        sink.report_diagnostic(&message);
        self.failures.push(failure);
    }

    /// Record failures that were already reported elsewhere.
    pub(crate) fn extend(&mut self, failures: Vec<ExportFailure>) {
        self.failures.extend(failures);
    }

    pub(crate) fn finish(self) -> Result<ExportSummary, PartialExport> {
        if self.failures.is_empty() {
            info!(
                "exported {} feature(s) to {}",
                self.written, self.collection
            );
            Ok(ExportSummary {
                collection: self.collection,
                features_written: self.written,
            })
        } else {
            Err(PartialExport {
                collection: self.collection,
                written: self.written,
                failures: self.failures,
            })
        }
    }
}
