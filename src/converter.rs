//! Decision tree converter
//!
//! Turns a fitted decision tree and its transformation context into a
//! PMML tree model document.
use crate::constants::{
    APPLICATION_NAME, APPLICATION_VERSION, CLASSIFIER_ALGORITHM_NAME, DEFAULT_MODEL_NAME, PMML_VERSION,
    PREDICTED_PREFIX, PROBABILITY_PREFIX, REGRESSOR_ALGORITHM_NAME,
};
use crate::context::TransformationContext;
use crate::emitter::{LeafEmitter, TreeNodeEmitter};
use crate::errors::PmmlError;
use crate::features::{DataType, Feature, OpType};
use crate::pmml::{
    Application, DataDictionary, DataField, DerivedField, Header, MiningField, MiningFunction, MiningSchema, Output,
    OutputField, Pmml, ResultFeature, TransformationDictionary, TreeModel,
};
use crate::tree::{EstimatorType, TreeEstimator};
use crate::utils::items_to_strings;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the tree is converted as a classifier or a regressor.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ConverterMode {
    Classification,
    Regression,
}

impl ConverterMode {
    fn estimator_type(&self) -> EstimatorType {
        match self {
            ConverterMode::Classification => EstimatorType::Classifier,
            ConverterMode::Regression => EstimatorType::Regressor,
        }
    }

    fn mining_function(&self) -> MiningFunction {
        match self {
            ConverterMode::Classification => MiningFunction::Classification,
            ConverterMode::Regression => MiningFunction::Regression,
        }
    }
}

impl FromStr for ConverterMode {
    type Err = PmmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classification" => Ok(ConverterMode::Classification),
            "regression" => Ok(ConverterMode::Regression),
            _ => Err(PmmlError::ParseString(
                s.to_string(),
                "ConverterMode".to_string(),
                items_to_strings(vec!["classification", "regression"]),
            )),
        }
    }
}

impl fmt::Display for ConverterMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConverterMode::Classification => write!(f, "classification"),
            ConverterMode::Regression => write!(f, "regression"),
        }
    }
}

/// Decision Tree Converter object
pub struct DecisionTreeConverter<E: TreeEstimator> {
    estimator: E,
    context: TransformationContext,
    mode: ConverterMode,
    /// Name written to the tree model's `modelName`.
    model_name: String,
    /// Overrides the mode's default `algorithmName`.
    algorithm_name: Option<String>,
    copyright: Option<String>,
    description: Option<String>,
}

impl<E: TreeEstimator> DecisionTreeConverter<E> {
    /// Decision Tree Converter object
    ///
    /// * `estimator` - The fitted tree, or a reference to it.
    /// * `context` - Feature collections describing inputs, model features, derived features and outputs.
    /// * `mode` - Convert as a classification or a regression model.
    pub fn new(estimator: E, context: TransformationContext, mode: ConverterMode) -> Self {
        DecisionTreeConverter {
            estimator,
            context,
            mode,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            algorithm_name: None,
            copyright: None,
            description: None,
        }
    }

    /// Build the PMML document. Each call builds a fresh document,
    /// nothing is returned if any part of the conversion fails.
    pub fn pmml(&self) -> Result<Pmml, PmmlError> {
        let leaf_emitter = self.leaf_emitter()?;

        let mining_schema = self.mining_schema();
        debug!("Mining schema has {} fields.", mining_schema.mining_fields.len());

        let transformation_dictionary = self.transformation_dictionary();
        debug!(
            "Transformation dictionary has {} derived fields.",
            self.context.derived().len()
        );

        let node = TreeNodeEmitter::new(self.estimator.tree(), self.context.model(), leaf_emitter).emit()?;
        debug!("Emitted {} nodes.", node.node_count());

        let tree_model = TreeModel {
            model_name: self.model_name.clone(),
            function_name: self.mode.mining_function(),
            algorithm_name: self.algorithm_name(),
            split_characteristic: "binarySplit".to_string(),
            mining_schema,
            output: self.output(),
            node,
        };
        info!(
            "Converted {} tree {} with {} nodes and {} mining fields.",
            self.mode,
            tree_model.model_name,
            tree_model.node.node_count(),
            tree_model.mining_schema.mining_fields.len()
        );

        Ok(Pmml {
            version: PMML_VERSION.to_string(),
            header: self.header(),
            data_dictionary: self.data_dictionary(),
            transformation_dictionary,
            tree_models: vec![tree_model],
        })
    }

    /// Check the mode against the estimator and the output feature,
    /// and pick how leaves are scored.
    fn leaf_emitter(&self) -> Result<LeafEmitter<'_>, PmmlError> {
        let estimator_type = self.estimator.estimator_type();
        if estimator_type != self.mode.estimator_type() {
            return Err(PmmlError::ConfigurationError(format!(
                "a {:?} estimator cannot be converted in {} mode",
                estimator_type, self.mode
            )));
        }
        let output = self.target()?;
        match self.mode {
            ConverterMode::Classification => {
                if !output.is_categorical() {
                    return Err(PmmlError::ConfigurationError(format!(
                        "classification needs a categorical output, {} is numeric",
                        output.name()
                    )));
                }
                let n_classes = self.estimator.n_classes().unwrap_or(0);
                if n_classes != output.categories().len() {
                    return Err(PmmlError::ConfigurationError(format!(
                        "the classifier has {} classes but output {} declares {} categories",
                        n_classes,
                        output.name(),
                        output.categories().len()
                    )));
                }
                Ok(LeafEmitter::Classification {
                    categories: output.categories(),
                })
            }
            ConverterMode::Regression => {
                if !output.is_numeric() {
                    return Err(PmmlError::ConfigurationError(format!(
                        "regression needs a numeric output, {} is categorical",
                        output.name()
                    )));
                }
                Ok(LeafEmitter::Regression)
            }
        }
    }

    /// The single output feature.
    fn target(&self) -> Result<&Feature, PmmlError> {
        match self.context.output() {
            [output] => Ok(output),
            outputs => Err(PmmlError::ConfigurationError(format!(
                "exactly one output feature is supported, {} given",
                outputs.len()
            ))),
        }
    }

    fn mining_schema(&self) -> MiningSchema {
        MiningSchema {
            mining_fields: self
                .context
                .mining_fields()
                .into_iter()
                .map(|(f, usage_type)| MiningField {
                    name: f.name().to_string(),
                    usage_type,
                })
                .collect(),
        }
    }

    fn transformation_dictionary(&self) -> Option<TransformationDictionary> {
        if self.context.derived().is_empty() {
            return None;
        }
        let derived_fields = self
            .context
            .derived()
            .iter()
            .map(|d| DerivedField {
                name: d.name().to_string(),
                optype: d.feature.op_type(),
                data_type: d.feature.data_type(),
                expression: d.transformation.clone(),
            })
            .collect();
        Some(TransformationDictionary { derived_fields })
    }

    fn data_dictionary(&self) -> DataDictionary {
        DataDictionary {
            data_fields: self
                .context
                .input()
                .iter()
                .chain(self.context.output())
                .map(|f| DataField {
                    name: f.name().to_string(),
                    optype: f.op_type(),
                    data_type: f.data_type(),
                    values: f.categories().to_vec(),
                })
                .collect(),
        }
    }

    fn output(&self) -> Output {
        let mut output_fields = Vec::new();
        for target in self.context.output() {
            let (optype, data_type) = match self.mode {
                ConverterMode::Classification => (OpType::Categorical, target.data_type()),
                ConverterMode::Regression => (OpType::Continuous, DataType::Double),
            };
            output_fields.push(OutputField {
                name: format!("{}{}", PREDICTED_PREFIX, target.name()),
                optype,
                data_type,
                feature: ResultFeature::PredictedValue,
                value: None,
            });
            if self.mode == ConverterMode::Classification {
                output_fields.extend(target.categories().iter().map(|label| OutputField {
                    name: format!("{}{}", PROBABILITY_PREFIX, label),
                    optype: OpType::Continuous,
                    data_type: DataType::Double,
                    feature: ResultFeature::Probability,
                    value: Some(label.clone()),
                }));
            }
        }
        Output { output_fields }
    }

    fn header(&self) -> Header {
        Header {
            copyright: self.copyright.clone(),
            description: self.description.clone(),
            application: Application {
                name: APPLICATION_NAME.to_string(),
                version: APPLICATION_VERSION.to_string(),
            },
        }
    }

    fn algorithm_name(&self) -> String {
        match (&self.algorithm_name, self.mode) {
            (Some(name), _) => name.clone(),
            (None, ConverterMode::Classification) => CLASSIFIER_ALGORITHM_NAME.to_string(),
            (None, ConverterMode::Regression) => REGRESSOR_ALGORITHM_NAME.to_string(),
        }
    }

    pub fn mode(&self) -> ConverterMode {
        self.mode
    }

    pub fn context(&self) -> &TransformationContext {
        &self.context
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    // Set methods for parameters

    /// Set the model name of the tree model.
    /// * `model_name` - Value written to `modelName`.
    pub fn set_model_name(mut self, model_name: &str) -> Self {
        self.model_name = model_name.to_string();
        self
    }

    /// Set the algorithm name of the tree model.
    /// * `algorithm_name` - Value written to `algorithmName`, `None` restores the default.
    pub fn set_algorithm_name(mut self, algorithm_name: Option<String>) -> Self {
        self.algorithm_name = algorithm_name;
        self
    }

    /// Set the copyright of the document header.
    pub fn set_copyright(mut self, copyright: Option<String>) -> Self {
        self.copyright = copyright;
        self
    }

    /// Set the description of the document header.
    pub fn set_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}
