//! In-memory [`FeatureSink`] implementation.

use std::collections::BTreeMap;

use super::{
    CollectionId, Feature, FeatureSink, FieldType, FieldValue, GeometryType, Layer, SinkError,
    Workspace,
};

/// Feature sink that keeps every collection in memory.
///
/// Useful for previews, tests, and callers that post-process features
/// themselves. Schema rules match the file-backed sinks.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    layers: BTreeMap<CollectionId, Layer>,
    diagnostics: Vec<String>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a stored collection.
    #[must_use]
    pub fn collection(&self, id: &CollectionId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Borrow the features of a stored collection.
    #[must_use]
    pub fn features(&self, id: &CollectionId) -> Option<&[Feature]> {
        self.layers.get(id).map(Layer::features)
    }

    /// Identifiers of every stored collection, in sorted order.
    pub fn collection_ids(&self) -> impl Iterator<Item = &CollectionId> {
        self.layers.keys()
    }

    /// Diagnostics reported so far, oldest first.
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    fn layer_mut(&mut self, id: &CollectionId) -> Result<&mut Layer, SinkError> {
        self.layers.get_mut(id).ok_or_else(|| SinkError::NotFound {
            collection: id.clone(),
        })
    }

    fn layer(&self, id: &CollectionId) -> Result<&Layer, SinkError> {
        self.layers.get(id).ok_or_else(|| SinkError::NotFound {
            collection: id.clone(),
        })
    }

    fn create(&mut self, id: CollectionId, layer: Layer) -> Result<CollectionId, SinkError> {
        if self.layers.contains_key(&id) {
            return Err(SinkError::AlreadyExists { collection: id });
        }
        self.layers.insert(id.clone(), layer);
        Ok(id)
    }
}

impl FeatureSink for MemorySink {
    fn create_feature_collection(
        &mut self,
        workspace: Workspace,
        name: &str,
        geometry_type: GeometryType,
    ) -> Result<CollectionId, SinkError> {
        self.create(
            CollectionId::new(workspace, name),
            Layer::new(geometry_type),
        )
    }

    fn add_field(
        &mut self,
        collection: &CollectionId,
        field: &str,
        field_type: FieldType,
    ) -> Result<(), SinkError> {
        self.layer_mut(collection)?
            .add_field(collection, field, field_type)
    }

    fn insert_feature(
        &mut self,
        collection: &CollectionId,
        feature: Feature,
    ) -> Result<(), SinkError> {
        self.layer_mut(collection)?.insert(collection, feature)
    }

    fn points_to_line(
        &mut self,
        points: &CollectionId,
        output: &str,
    ) -> Result<CollectionId, SinkError> {
        let polyline = self.layer(points)?.to_polyline(points)?;
        self.create(CollectionId::scratch(output), polyline)
    }

    fn calculate_field(
        &mut self,
        collection: &CollectionId,
        field: &str,
        value: FieldValue,
    ) -> Result<(), SinkError> {
        self.layer_mut(collection)?
            .calculate(collection, field, &value)
    }

    fn copy_features(
        &mut self,
        source: &CollectionId,
        destination: &CollectionId,
    ) -> Result<usize, SinkError> {
        let features = self.layer(source)?.features().to_vec();
        self.layer_mut(destination)?
            .append(destination, &features)
    }

    fn exists(&self, collection: &CollectionId) -> bool {
        self.layers.contains_key(collection)
    }

    fn delete(&mut self, collection: &CollectionId) -> Result<(), SinkError> {
        self.layers
            .remove(collection)
            .map(drop)
            .ok_or_else(|| SinkError::NotFound {
                collection: collection.clone(),
            })
    }

    fn report_diagnostic(&mut self, message: &str) {
        self.diagnostics.push(message.to_owned());
    }
}
