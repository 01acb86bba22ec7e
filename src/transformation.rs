//! Derived feature transformations.
//!
//! A derived feature is computed by the PMML consumer at scoring time from
//! raw inputs. The transformation is never evaluated here, it is carried
//! into the document as a `DerivedField` expression.
use crate::errors::PmmlError;
use crate::features::{DataType, Feature};
use serde::{Deserialize, Serialize};

/// Binds a table column to the input field that feeds it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldColumnPair {
    pub field: String,
    pub column: String,
}

impl FieldColumnPair {
    pub fn new(field: &str, column: &str) -> Self {
        FieldColumnPair {
            field: field.to_string(),
            column: column.to_string(),
        }
    }
}

/// One row of an inline table, an ordered list of `(column, value)` cells.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Row {
    pub cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Row { cells: Vec::new() }
    }

    /// Append a cell, returning the row for chaining.
    pub fn with<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.cells.push((column.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v.as_str())
    }
}

/// Build a row from `(column, value)` pairs.
pub fn pmml_row(cells: &[(&str, &str)]) -> Row {
    cells.iter().fold(Row::new(), |row, (c, v)| row.with(c, v))
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct InlineTable {
    pub rows: Vec<Row>,
}

impl InlineTable {
    pub fn new() -> Self {
        InlineTable { rows: Vec::new() }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }
}

/// Discrete lookup table: the values of the input fields select a row,
/// and the row's `output_column` cell is the derived value.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapValues {
    pub output_column: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_missing_to: Option<String>,
    pub field_column_pairs: Vec<FieldColumnPair>,
    pub inline_table: InlineTable,
}

impl MapValues {
    pub fn new(output_column: &str, data_type: DataType) -> Self {
        MapValues {
            output_column: output_column.to_string(),
            data_type,
            default_value: None,
            map_missing_to: None,
            field_column_pairs: Vec::new(),
            inline_table: InlineTable::new(),
        }
    }

    pub fn add_pair(mut self, field: &str, column: &str) -> Self {
        self.field_column_pairs.push(FieldColumnPair::new(field, column));
        self
    }

    pub fn add_row(mut self, row: Row) -> Self {
        self.inline_table.push(row);
        self
    }

    pub fn set_default_value(mut self, default_value: Option<String>) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn set_map_missing_to(mut self, map_missing_to: Option<String>) -> Self {
        self.map_missing_to = map_missing_to;
        self
    }

    /// Every row must define every mapped column and the output column.
    fn validate(&self) -> Result<(), PmmlError> {
        if self.field_column_pairs.is_empty() {
            return Err(PmmlError::ConfigurationError(format!(
                "mapping to {} has no field column pairs",
                self.output_column
            )));
        }
        for (i, row) in self.inline_table.rows.iter().enumerate() {
            let columns = self.field_column_pairs.iter().map(|p| p.column.as_str());
            for column in columns.chain(std::iter::once(self.output_column.as_str())) {
                if row.get(column).is_none() {
                    return Err(PmmlError::ConfigurationError(format!(
                        "row {} of mapping to {} has no value for column {}",
                        i, self.output_column, column
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Declarative transforms a derived feature can be defined by.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub enum Transformation {
    MapValues(MapValues),
}

impl Transformation {
    /// Names of the fields the transformation reads.
    pub fn input_fields(&self) -> Vec<&str> {
        match self {
            Transformation::MapValues(m) => m.field_column_pairs.iter().map(|p| p.field.as_str()).collect(),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Transformation::MapValues(m) => m.data_type,
        }
    }

    pub fn validate(&self) -> Result<(), PmmlError> {
        match self {
            Transformation::MapValues(m) => m.validate(),
        }
    }
}

impl From<MapValues> for Transformation {
    fn from(m: MapValues) -> Self {
        Transformation::MapValues(m)
    }
}

/// A computed feature paired with the transform that produces it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DerivedFeature {
    pub feature: Feature,
    pub transformation: Transformation,
}

impl DerivedFeature {
    pub fn new<T: Into<Transformation>>(feature: Feature, transformation: T) -> Result<Self, PmmlError> {
        let derived = DerivedFeature {
            feature,
            transformation: transformation.into(),
        };
        derived.validate()?;
        Ok(derived)
    }

    pub fn validate(&self) -> Result<(), PmmlError> {
        self.feature.validate()?;
        self.transformation.validate()?;
        if self.feature.data_type() != self.transformation.data_type() {
            return Err(PmmlError::ConfigurationError(format!(
                "derived feature {} is {} but its transformation produces {}",
                self.name(),
                self.feature.data_type(),
                self.transformation.data_type()
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.feature.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> MapValues {
        MapValues::new("output", DataType::Double)
            .add_pair("x1", "x1")
            .add_pair("x2", "x2")
            .add_row(pmml_row(&[("x1", "0"), ("x2", "zero"), ("output", "0")]))
            .add_row(pmml_row(&[("x1", "0"), ("x2", "one"), ("output", "0")]))
            .add_row(pmml_row(&[("x1", "1"), ("x2", "zero"), ("output", "0")]))
            .add_row(Row::new().with("x1", 1).with("x2", "one").with("output", 1))
    }

    #[test]
    fn test_map_values() {
        let t = Transformation::from(mapping());
        assert_eq!(t.input_fields(), vec!["x1", "x2"]);
        assert_eq!(t.data_type(), DataType::Double);
        assert!(t.validate().is_ok());
        if let Transformation::MapValues(m) = &t {
            assert_eq!(m.inline_table.rows.len(), 4);
            assert_eq!(m.inline_table.rows[3].get("output"), Some("1"));
        }
    }

    #[test]
    fn test_incomplete_row_fails() {
        let m = mapping().add_row(pmml_row(&[("x1", "1"), ("output", "1")]));
        let err = DerivedFeature::new(Feature::real_numeric("x3"), m).unwrap_err();
        assert!(matches!(err, PmmlError::ConfigurationError(_)));
    }

    #[test]
    fn test_mapping_without_pairs_fails() {
        let m = MapValues::new("output", DataType::Double);
        assert!(DerivedFeature::new(Feature::real_numeric("x3"), m).is_err());
    }

    #[test]
    fn test_data_type_disagreement_fails() {
        let err = DerivedFeature::new(Feature::integer_numeric("x3"), mapping()).unwrap_err();
        assert!(matches!(err, PmmlError::ConfigurationError(_)));

        let integer_mapping = MapValues {
            data_type: DataType::Integer,
            ..mapping()
        };
        assert!(DerivedFeature::new(Feature::integer_numeric("x3"), integer_mapping).is_ok());
    }

    #[test]
    fn test_derived_feature() {
        let d = DerivedFeature::new(Feature::real_numeric("x3"), mapping()).unwrap();
        assert_eq!(d.name(), "x3");
        let json = serde_json::to_string(&d).unwrap();
        let back: DerivedFeature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
