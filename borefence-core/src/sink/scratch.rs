//! Scoped ownership of temporary sink collections.

use std::ops::{Deref, DerefMut};

use log::{debug, warn};

use super::{CollectionId, FeatureSink};
use crate::export::ExportFailure;

/// Borrows a sink for the lifetime of some scratch collections and deletes
/// them when the scope ends.
///
/// [`ScratchScope::release`] cleans up and returns any deletion failures.
/// If the scope is dropped without being released (an early return or an
/// unwinding panic) cleanup still runs and failures go to the sink's
/// diagnostics.
pub(crate) struct ScratchScope<'a, S: FeatureSink + ?Sized> {
    sink: &'a mut S,
    resources: Vec<CollectionId>,
    released: bool,
}

impl<'a, S: FeatureSink + ?Sized> ScratchScope<'a, S> {
    /// Take ownership of `resources`, whether or not they exist yet.
    pub(crate) fn new<I>(sink: &'a mut S, resources: I) -> Self
    where
        I: IntoIterator<Item = CollectionId>,
    {
        Self {
            sink,
            resources: resources.into_iter().collect(),
            released: false,
        }
    }

    /// Delete every owned collection that exists, most recent first.
    pub(crate) fn release(mut self) -> Vec<ExportFailure> {
        self.released = true;
        self.cleanup()
    }

    fn cleanup(&mut self) -> Vec<ExportFailure> {
        let mut failures = Vec::new();
        for collection in self.resources.iter().rev() {
            if !self.sink.exists(collection) {
                continue;
            }
            match self.sink.delete(collection) {
                Ok(()) => debug!("removed scratch collection {collection}"),
                Err(source) => {
                    let failure = ExportFailure::Cleanup {
                        collection: collection.clone(),
                        source,
                    };
                    let message = failure.to_string();
                    warn!("{message}");
                    self.sink.report_diagnostic(&message);
                    failures.push(failure);
                }
            }
        }
        failures
    }
}

impl<S: FeatureSink + ?Sized> Deref for ScratchScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.sink
    }
}

impl<S: FeatureSink + ?Sized> DerefMut for ScratchScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.sink
    }
}

impl<S: FeatureSink + ?Sized> Drop for ScratchScope<'_, S> {
    fn drop(&mut self) {
        if !self.released {
            // Failures were already reported as diagnostics.
            drop(self.cleanup());
        }
    }
}
