//! Schema-checked feature storage shared by the bundled sinks.

use geo::{Geometry, LineString, Point};

use super::{CollectionId, Feature, FieldType, FieldValue, GeometryType, SinkError};

const MIN_LINE_POSITIONS: usize = 2;

/// Declared attribute column.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sink-geojson", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDef {
    /// Column name.
    pub name: String,
    /// Column type.
    #[cfg_attr(feature = "sink-geojson", serde(rename = "type"))]
    pub field_type: FieldType,
}

/// A feature collection: geometry type, ordered field list and rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    geometry_type: GeometryType,
    fields: Vec<FieldDef>,
    features: Vec<Feature>,
}

impl Layer {
    /// Create an empty layer with no fields.
    #[must_use]
    pub const fn new(geometry_type: GeometryType) -> Self {
        Self {
            geometry_type,
            fields: Vec::new(),
            features: Vec::new(),
        }
    }

    pub(crate) const fn from_parts(
        geometry_type: GeometryType,
        fields: Vec<FieldDef>,
        features: Vec<Feature>,
    ) -> Self {
        Self {
            geometry_type,
            fields,
            features,
        }
    }

    /// Geometry type accepted by the layer.
    #[must_use]
    pub const fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// Declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Stored features in insertion order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.field_type)
    }

    pub(crate) fn add_field(
        &mut self,
        id: &CollectionId,
        name: &str,
        field_type: FieldType,
    ) -> Result<(), SinkError> {
        if self.field_type(name).is_some() {
            return Err(SinkError::DuplicateField {
                collection: id.clone(),
                field: name.to_owned(),
            });
        }
        self.fields.push(FieldDef {
            name: name.to_owned(),
            field_type,
        });
        Ok(())
    }

    fn check_value(
        &self,
        id: &CollectionId,
        field: &str,
        value: &FieldValue,
    ) -> Result<(), SinkError> {
        let expected = self
            .field_type(field)
            .ok_or_else(|| SinkError::UnknownField {
                collection: id.clone(),
                field: field.to_owned(),
            })?;
        let found = value.field_type();
        if expected == found {
            Ok(())
        } else {
            Err(SinkError::FieldTypeMismatch {
                collection: id.clone(),
                field: field.to_owned(),
                expected,
                found,
            })
        }
    }

    fn check_feature(&self, id: &CollectionId, feature: &Feature) -> Result<(), SinkError> {
        if !self.geometry_type.accepts(&feature.geometry) {
            return Err(SinkError::GeometryMismatch {
                collection: id.clone(),
                expected: self.geometry_type,
            });
        }
        feature
            .attributes
            .iter()
            .try_for_each(|(field, value)| self.check_value(id, field, value))
    }

    pub(crate) fn insert(&mut self, id: &CollectionId, feature: Feature) -> Result<(), SinkError> {
        self.check_feature(id, &feature)?;
        self.features.push(feature);
        Ok(())
    }

    pub(crate) fn calculate(
        &mut self,
        id: &CollectionId,
        field: &str,
        value: &FieldValue,
    ) -> Result<(), SinkError> {
        self.check_value(id, field, value)?;
        for feature in &mut self.features {
            feature.attributes.insert(field.to_owned(), value.clone());
        }
        Ok(())
    }

    /// Append `features` after validating every one of them, so a rejected
    /// row leaves the layer untouched.
    /// Returns the number of rows appended.
    pub(crate) fn append(
        &mut self,
        id: &CollectionId,
        features: &[Feature],
    ) -> Result<usize, SinkError> {
        features
            .iter()
            .try_for_each(|feature| self.check_feature(id, feature))?;
        self.features.extend_from_slice(features);
        Ok(features.len())
    }

    /// Join the layer's points, in insertion order, into one line string.
    ///
    /// Fewer than two points make no line, so the result has no rows.
    pub(crate) fn to_polyline(&self, id: &CollectionId) -> Result<Self, SinkError> {
        if self.geometry_type != GeometryType::Point {
            return Err(SinkError::GeometryMismatch {
                collection: id.clone(),
                expected: GeometryType::Point,
            });
        }
        let line: LineString<f64> = self
            .features
            .iter()
            .filter_map(|feature| match feature.geometry {
                Geometry::Point(Point(coord)) => Some(coord),
                _ => None,
            })
            .collect();
        let mut polyline = Self::new(GeometryType::Polyline);
        if line.0.len() >= MIN_LINE_POSITIONS {
            polyline.features.push(Feature::new(line));
        }
        Ok(polyline)
    }
}
