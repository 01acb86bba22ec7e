/// PMML schema version written to every document.
pub const PMML_VERSION: &str = "4.2";
/// Child index marking a leaf in the fitted tree arrays.
pub const TREE_LEAF: i64 = -1;
/// Feature index stored for leaves in the fitted tree arrays.
pub const TREE_UNDEFINED: i64 = -2;
/// Deepest fitted tree accepted for conversion. The emitted node graph is
/// nested one level per tree level.
pub const MAX_TREE_DEPTH: usize = 512;
/// Name of the producing application recorded in the document header.
pub const APPLICATION_NAME: &str = env!("CARGO_PKG_NAME");
pub const APPLICATION_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_MODEL_NAME: &str = "DecisionTree";
pub const CLASSIFIER_ALGORITHM_NAME: &str = "DecisionTreeClassifier";
pub const REGRESSOR_ALGORITHM_NAME: &str = "DecisionTreeRegressor";
/// Prefix for the per-class probability output fields.
pub const PROBABILITY_PREFIX: &str = "probability_";
/// Prefix for the predicted value output field.
pub const PREDICTED_PREFIX: &str = "predicted_";
