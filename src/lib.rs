mod node;

// Modules
pub mod constants;
pub mod context;
pub mod converter;
pub mod emitter;
pub mod errors;
pub mod features;
pub mod pmml;
pub mod transformation;
pub mod tree;
pub mod utils;

// Individual classes, and functions
pub use context::{TransformationContext, UsageType};
pub use converter::{ConverterMode, DecisionTreeConverter};
pub use errors::PmmlError;
pub use features::{Feature, FeatureKind};
pub use node::TreeNode;
pub use pmml::Pmml;
pub use transformation::{pmml_row, DerivedFeature, MapValues, Transformation};
pub use tree::{DecisionTreeClassifier, DecisionTreeRegressor, Tree, TreeEstimator};
