//! PMML document model
//!
//! In-memory object graph of a PMML tree model document. Rendering the
//! graph as PMML XML is left to a document library; the graph can be
//! dumped as json for inspection and storage.
use crate::context::UsageType;
use crate::errors::PmmlError;
use crate::features::{DataType, OpType};
use crate::transformation::Transformation;
use crate::utils::fmt_number;
use serde::Serialize;
use std::fmt;
use std::fs;

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pmml {
    pub version: String,
    pub header: Header,
    pub data_dictionary: DataDictionary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_dictionary: Option<TransformationDictionary>,
    pub tree_models: Vec<TreeModel>,
}

impl Pmml {
    /// The first tree model of the document.
    pub fn tree_model(&self) -> Option<&TreeModel> {
        self.tree_models.first()
    }

    /// Derived field definitions, empty when there is no transformation dictionary.
    pub fn derived_fields(&self) -> &[DerivedField] {
        match &self.transformation_dictionary {
            Some(td) => td.derived_fields.as_slice(),
            None => &[],
        }
    }

    /// Dump the document as a json object.
    pub fn json_dump(&self) -> Result<String, PmmlError> {
        serde_json::to_string(self).map_err(|e| PmmlError::UnableToWrite(e.to_string()))
    }

    /// Save the document as a json object to a file.
    ///
    /// * `path` - Path to save the document.
    pub fn save(&self, path: &str) -> Result<(), PmmlError> {
        let doc = self.json_dump()?;
        fs::write(path, doc).map_err(|e| PmmlError::UnableToWrite(e.to_string()))
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub application: Application,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Application {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataDictionary {
    pub data_fields: Vec<DataField>,
}

impl DataDictionary {
    pub fn number_of_fields(&self) -> usize {
        self.data_fields.len()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataField {
    pub name: String,
    pub optype: OpType,
    pub data_type: DataType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransformationDictionary {
    pub derived_fields: Vec<DerivedField>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedField {
    pub name: String,
    pub optype: OpType,
    pub data_type: DataType,
    pub expression: Transformation,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MiningFunction {
    Classification,
    Regression,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreeModel {
    pub model_name: String,
    pub function_name: MiningFunction,
    pub algorithm_name: String,
    pub split_characteristic: String,
    pub mining_schema: MiningSchema,
    pub output: Output,
    pub node: Node,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MiningSchema {
    pub mining_fields: Vec<MiningField>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MiningField {
    pub name: String,
    pub usage_type: UsageType,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub output_fields: Vec<OutputField>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ResultFeature {
    PredictedValue,
    Probability,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputField {
    pub name: String,
    pub optype: OpType,
    pub data_type: DataType,
    pub feature: ResultFeature,
    /// Category the probability refers to, only for `Probability` fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    LessOrEqual,
    GreaterThan,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operator::LessOrEqual => write!(f, "<="),
            Operator::GreaterThan => write!(f, ">"),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimplePredicate {
    pub field: String,
    pub operator: Operator,
    pub value: f64,
}

/// Condition under which a record enters a node.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub enum Predicate {
    True,
    SimplePredicate(SimplePredicate),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Predicate::True => write!(f, "True"),
            Predicate::SimplePredicate(p) => write!(f, "{} {} {}", p.field, p.operator, fmt_number(p.value)),
        }
    }
}

/// Predicted class label or regression value of a node.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Score {
    Label(String),
    Value(f64),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Score::Label(l) => write!(f, "{}", l),
            Score::Value(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDistribution {
    pub value: String,
    pub record_count: f64,
    pub probability: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    pub record_count: f64,
    pub predicate: Predicate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub score_distributions: Vec<ScoreDistribution>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the subtree rooted here, this node included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.nodes.iter());
        }
        count
    }

    /// Leaves of the subtree rooted here, left to right.
    pub fn leaves(&self) -> Vec<&Node> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                leaves.push(node);
            } else {
                stack.extend(node.nodes.iter().rev());
            }
        }
        leaves
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<(&Node, usize)> = vec![(self, 0)];
        while let Some((node, depth)) = print_buffer.pop() {
            write!(
                f,
                "{}{}:[{}] records={}",
                "      ".repeat(depth),
                node.id,
                node.predicate,
                fmt_number(node.record_count)
            )?;
            if let Some(score) = &node.score {
                write!(f, ",score={}", score)?;
            }
            writeln!(f)?;
            print_buffer.extend(node.nodes.iter().rev().map(|child| (child, depth + 1)));
        }
        Ok(())
    }
}
