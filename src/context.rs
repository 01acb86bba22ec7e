//! Transformation context
//!
//! Aggregates the four feature collections a conversion needs and checks
//! that they agree with each other by name.
use crate::errors::PmmlError;
use crate::features::Feature;
use crate::transformation::DerivedFeature;
use crate::utils::items_to_strings;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::str::FromStr;

/// Role of a field in the mining schema.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UsageType {
    Active,
    Predicted,
}

impl FromStr for UsageType {
    type Err = PmmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UsageType::Active),
            "predicted" => Ok(UsageType::Predicted),
            _ => Err(PmmlError::ParseString(
                s.to_string(),
                "UsageType".to_string(),
                items_to_strings(vec!["active", "predicted"]),
            )),
        }
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UsageType::Active => write!(f, "active"),
            UsageType::Predicted => write!(f, "predicted"),
        }
    }
}

/// Feature collections describing one conversion request.
///
/// * `input` - Fields supplied at scoring time, before any derivation.
/// * `model` - Fields the fitted tree consumes, in the order of the tree's feature indices.
/// * `derived` - Computed fields, each with the transform producing it.
/// * `output` - Prediction target field(s).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TransformationContext {
    input: Vec<Feature>,
    model: Vec<Feature>,
    derived: Vec<DerivedFeature>,
    output: Vec<Feature>,
}

impl TransformationContext {
    pub fn new(
        input: Vec<Feature>,
        model: Vec<Feature>,
        derived: Vec<DerivedFeature>,
        output: Vec<Feature>,
    ) -> Result<Self, PmmlError> {
        let context = TransformationContext {
            input,
            model,
            derived,
            output,
        };
        context.validate()?;
        Ok(context)
    }

    /// Check the cross-collection invariants. Run by `new` and after
    /// loading a context from json.
    pub fn validate(&self) -> Result<(), PmmlError> {
        if self.output.is_empty() {
            return Err(PmmlError::ConfigurationError(
                "the output feature set must not be empty".to_string(),
            ));
        }
        for f in self.input.iter().chain(&self.model).chain(&self.output) {
            f.validate()?;
        }
        for d in &self.derived {
            d.validate()?;
        }

        let input_names = unique_names("input", self.input.iter().map(|f| f.name()))?;
        let derived_names = unique_names("derived", self.derived.iter().map(|d| d.name()))?;
        unique_names("model", self.model.iter().map(|f| f.name()))?;
        unique_names("output", self.output.iter().map(|f| f.name()))?;

        if let Some(name) = input_names.intersection(&derived_names).next() {
            return Err(PmmlError::ConfigurationError(format!(
                "feature {} is declared both as input and derived",
                name
            )));
        }

        for f in &self.model {
            if !input_names.contains(f.name()) && !derived_names.contains(f.name()) {
                return Err(PmmlError::SchemaMismatchError(format!(
                    "model feature {} is neither an input nor a derived feature",
                    f.name()
                )));
            }
        }

        for d in &self.derived {
            for field in d.transformation.input_fields() {
                if !input_names.contains(field) {
                    return Err(PmmlError::SchemaMismatchError(format!(
                        "derived feature {} reads {}, which is not an input feature",
                        d.name(),
                        field
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn input(&self) -> &[Feature] {
        &self.input
    }

    pub fn model(&self) -> &[Feature] {
        &self.model
    }

    pub fn derived(&self) -> &[DerivedFeature] {
        &self.derived
    }

    pub fn output(&self) -> &[Feature] {
        &self.output
    }

    /// Fields of the mining schema: every model feature as active,
    /// followed by the output feature(s) as predicted.
    pub fn mining_fields(&self) -> Vec<(&Feature, UsageType)> {
        self.model
            .iter()
            .map(|f| (f, UsageType::Active))
            .chain(self.output.iter().map(|f| (f, UsageType::Predicted)))
            .collect()
    }

    /// Load a context from a json string, re-running validation.
    pub fn from_json(json_str: &str) -> Result<Self, PmmlError> {
        let context = serde_json::from_str::<TransformationContext>(json_str)
            .map_err(|e| PmmlError::UnableToRead(e.to_string()))?;
        context.validate()?;
        Ok(context)
    }

    /// Load a context from a path to a json file.
    pub fn load(path: &str) -> Result<Self, PmmlError> {
        let json_str = fs::read_to_string(path).map_err(|e| PmmlError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }

    pub fn json_dump(&self) -> Result<String, PmmlError> {
        serde_json::to_string(self).map_err(|e| PmmlError::UnableToWrite(e.to_string()))
    }
}

fn unique_names<'a, I>(collection: &str, names: I) -> Result<HashSet<&'a str>, PmmlError>
where
    I: Iterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(PmmlError::ConfigurationError(format!(
                "feature {} appears more than once in the {} features",
                name, collection
            )));
        }
    }
    Ok(seen)
}
