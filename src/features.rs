//! Features
//!
//! Typed descriptors for the input, output and derived fields of a model.
use crate::errors::PmmlError;
use crate::utils::items_to_strings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PMML data type of a field.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    Integer,
    Double,
    String,
}

impl FromStr for DataType {
    type Err = PmmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(DataType::Integer),
            "double" => Ok(DataType::Double),
            "string" => Ok(DataType::String),
            _ => Err(PmmlError::ParseString(
                s.to_string(),
                "DataType".to_string(),
                items_to_strings(vec!["integer", "double", "string"]),
            )),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DataType::Integer => "integer",
            DataType::Double => "double",
            DataType::String => "string",
        };
        write!(f, "{}", s)
    }
}

/// PMML operational type of a field.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OpType {
    Continuous,
    Categorical,
}

/// The kind of value a feature holds. Categorical kinds carry the
/// ordered, closed list of labels the feature may take.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub enum FeatureKind {
    IntegerNumeric,
    RealNumeric,
    StringCategorical(Vec<String>),
    IntegerCategorical(Vec<String>),
}

/// A named model field.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Feature {
    name: String,
    kind: FeatureKind,
}

impl Feature {
    /// Create a feature, failing if a categorical kind has no labels.
    pub fn new(name: &str, kind: FeatureKind) -> Result<Self, PmmlError> {
        let feature = Feature {
            name: name.to_string(),
            kind,
        };
        feature.validate()?;
        Ok(feature)
    }

    /// Integer valued numeric feature. Numeric features have no labels to
    /// check, so an empty name is only rejected when the feature is
    /// validated, which every `TransformationContext` does on construction.
    pub fn integer_numeric(name: &str) -> Self {
        Feature {
            name: name.to_string(),
            kind: FeatureKind::IntegerNumeric,
        }
    }

    /// Real valued numeric feature, validated like `integer_numeric`.
    pub fn real_numeric(name: &str) -> Self {
        Feature {
            name: name.to_string(),
            kind: FeatureKind::RealNumeric,
        }
    }

    /// Categorical feature with string labels.
    ///
    /// * `name` - Field name.
    /// * `categories` - Allowed labels, in the order the model encodes them.
    pub fn string_categorical<S: ToString>(name: &str, categories: &[S]) -> Result<Self, PmmlError> {
        Self::new(
            name,
            FeatureKind::StringCategorical(categories.iter().map(|c| c.to_string()).collect()),
        )
    }

    /// Categorical feature stored as integers.
    ///
    /// * `name` - Field name.
    /// * `categories` - Allowed labels, in the order the model encodes them.
    pub fn integer_categorical<S: ToString>(name: &str, categories: &[S]) -> Result<Self, PmmlError> {
        Self::new(
            name,
            FeatureKind::IntegerCategorical(categories.iter().map(|c| c.to_string()).collect()),
        )
    }

    /// Check the invariants of a feature. Used again when features
    /// are deserialized, since serde bypasses the constructors.
    pub fn validate(&self) -> Result<(), PmmlError> {
        if self.name.is_empty() {
            return Err(PmmlError::ConfigurationError("feature name must not be empty".to_string()));
        }
        if self.is_categorical() && self.categories().is_empty() {
            return Err(PmmlError::ConfigurationError(format!(
                "categorical feature {} has no category labels",
                self.name
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    /// Category labels, empty for numeric features.
    pub fn categories(&self) -> &[String] {
        match &self.kind {
            FeatureKind::StringCategorical(c) | FeatureKind::IntegerCategorical(c) => c.as_slice(),
            FeatureKind::IntegerNumeric | FeatureKind::RealNumeric => &[],
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::StringCategorical(_) | FeatureKind::IntegerCategorical(_)
        )
    }

    pub fn is_numeric(&self) -> bool {
        !self.is_categorical()
    }

    pub fn op_type(&self) -> OpType {
        if self.is_categorical() {
            OpType::Categorical
        } else {
            OpType::Continuous
        }
    }

    pub fn data_type(&self) -> DataType {
        match self.kind {
            FeatureKind::IntegerNumeric | FeatureKind::IntegerCategorical(_) => DataType::Integer,
            FeatureKind::RealNumeric => DataType::Double,
            FeatureKind::StringCategorical(_) => DataType::String,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_categorical() {
            write!(f, "{}:{}[{}]", self.name, self.data_type(), self.categories().join(","))
        } else {
            write!(f, "{}:{}", self.name, self.data_type())
        }
    }
}
