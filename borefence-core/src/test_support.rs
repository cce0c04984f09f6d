//! Test-only sink wrappers used by unit and behaviour tests.

use crate::sink::{
    CollectionId, Feature, FeatureSink, FieldType, FieldValue, GeometryType, SinkError, Workspace,
};

/// Sink operations that [`FailingSink`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOperation {
    /// [`FeatureSink::create_feature_collection`].
    CreateFeatureCollection,
    /// [`FeatureSink::add_field`].
    AddField,
    /// [`FeatureSink::insert_feature`].
    InsertFeature,
    /// [`FeatureSink::points_to_line`].
    PointsToLine,
    /// [`FeatureSink::calculate_field`].
    CalculateField,
    /// [`FeatureSink::copy_features`].
    CopyFeatures,
    /// [`FeatureSink::delete`].
    Delete,
}

impl SinkOperation {
    const fn name(self) -> &'static str {
        match self {
            Self::CreateFeatureCollection => "create_feature_collection",
            Self::AddField => "add_field",
            Self::InsertFeature => "insert_feature",
            Self::PointsToLine => "points_to_line",
            Self::CalculateField => "calculate_field",
            Self::CopyFeatures => "copy_features",
            Self::Delete => "delete",
        }
    }
}

/// Wraps a sink and fails the `n`th call (1-based) of one operation with
/// [`SinkError::Injected`]. Every other call is forwarded unchanged.
#[derive(Debug)]
pub struct FailingSink<S> {
    inner: S,
    operation: SinkOperation,
    fail_on: usize,
    calls: usize,
}

impl<S: FeatureSink> FailingSink<S> {
    /// Fail the `fail_on`th call of `operation`.
    pub const fn new(inner: S, operation: SinkOperation, fail_on: usize) -> Self {
        Self {
            inner,
            operation,
            fail_on,
            calls: 0,
        }
    }

    /// Borrow the wrapped sink.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap the wrapped sink.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn check(&mut self, operation: SinkOperation) -> Result<(), SinkError> {
        if operation != self.operation {
            return Ok(());
        }
        self.calls += 1;
        if self.calls == self.fail_on {
            Err(SinkError::Injected {
                operation: operation.name(),
            })
        } else {
            Ok(())
        }
    }
}

impl<S: FeatureSink> FeatureSink for FailingSink<S> {
    fn create_feature_collection(
        &mut self,
        workspace: Workspace,
        name: &str,
        geometry_type: GeometryType,
    ) -> Result<CollectionId, SinkError> {
        self.check(SinkOperation::CreateFeatureCollection)?;
        self.inner
            .create_feature_collection(workspace, name, geometry_type)
    }

    fn add_field(
        &mut self,
        collection: &CollectionId,
        field: &str,
        field_type: FieldType,
    ) -> Result<(), SinkError> {
        self.check(SinkOperation::AddField)?;
        self.inner.add_field(collection, field, field_type)
    }

    fn insert_feature(
        &mut self,
        collection: &CollectionId,
        feature: Feature,
    ) -> Result<(), SinkError> {
        self.check(SinkOperation::InsertFeature)?;
        self.inner.insert_feature(collection, feature)
    }

    fn points_to_line(
        &mut self,
        points: &CollectionId,
        output: &str,
    ) -> Result<CollectionId, SinkError> {
        self.check(SinkOperation::PointsToLine)?;
        self.inner.points_to_line(points, output)
    }

    fn calculate_field(
        &mut self,
        collection: &CollectionId,
        field: &str,
        value: FieldValue,
    ) -> Result<(), SinkError> {
        self.check(SinkOperation::CalculateField)?;
        self.inner.calculate_field(collection, field, value)
    }

    fn copy_features(
        &mut self,
        source: &CollectionId,
        destination: &CollectionId,
    ) -> Result<usize, SinkError> {
        self.check(SinkOperation::CopyFeatures)?;
        self.inner.copy_features(source, destination)
    }

    fn exists(&self, collection: &CollectionId) -> bool {
        self.inner.exists(collection)
    }

    fn delete(&mut self, collection: &CollectionId) -> Result<(), SinkError> {
        self.check(SinkOperation::Delete)?;
        self.inner.delete(collection)
    }

    fn report_diagnostic(&mut self, message: &str) {
        self.inner.report_diagnostic(message);
    }
}
