//! Fitted trees
//!
//! Read-only view of a decision tree produced by a fitting library. The tree
//! is kept as an arena of `TreeNode` records addressed by index, mirroring the
//! parallel-array layout the fitting library exposes.
use crate::constants::{MAX_TREE_DEPTH, TREE_LEAF, TREE_UNDEFINED};
use crate::errors::PmmlError;
use crate::node::TreeNode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::fs;

/// Parallel-array representation of a fitted tree, one entry per node.
/// A leaf has `-1` in both child arrays and `-2` as its feature.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub n_node_samples: Vec<usize>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(try_from = "TreeArrays", into = "TreeArrays")]
pub struct Tree {
    nodes: Vec<TreeNode>,
    depth: usize,
}

impl Tree {
    /// Build a tree from the fitting library's parallel arrays.
    ///
    /// * `children_left` - Left child index per node, `-1` for leaves.
    /// * `children_right` - Right child index per node, `-1` for leaves.
    /// * `feature` - Split feature index per node, `-2` for leaves.
    /// * `threshold` - Split threshold per node, ignored for leaves.
    /// * `n_node_samples` - Training samples reaching each node.
    /// * `value` - Class counts or regression value per node.
    pub fn from_arrays(
        children_left: &[i64],
        children_right: &[i64],
        feature: &[i64],
        threshold: &[f64],
        n_node_samples: &[usize],
        value: &[Vec<f64>],
    ) -> Result<Self, PmmlError> {
        let n = children_left.len();
        let lengths = [
            children_right.len(),
            feature.len(),
            threshold.len(),
            n_node_samples.len(),
            value.len(),
        ];
        if lengths.iter().any(|l| *l != n) {
            return Err(PmmlError::ConfigurationError(format!(
                "tree arrays have mismatched lengths, {} nodes but {:?}",
                n, lengths
            )));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let node = match (children_left[i], children_right[i]) {
                (TREE_LEAF, TREE_LEAF) => TreeNode::new_leaf(i, n_node_samples[i], value[i].clone()),
                (l, r) if l >= 0 && r >= 0 => {
                    if feature[i] < 0 {
                        return Err(PmmlError::ConfigurationError(format!(
                            "split node {} has no feature index",
                            i
                        )));
                    }
                    TreeNode::new_split(
                        i,
                        feature[i] as usize,
                        threshold[i],
                        l as usize,
                        r as usize,
                        n_node_samples[i],
                        value[i].clone(),
                    )
                }
                (l, r) => {
                    return Err(PmmlError::ConfigurationError(format!(
                        "node {} has invalid children ({}, {})",
                        i, l, r
                    )))
                }
            };
            nodes.push(node);
        }
        Self::from_nodes(nodes)
    }

    /// Build a tree from node records, checking that they form a
    /// single tree rooted at index 0. Node depths are recomputed.
    pub fn from_nodes(mut nodes: Vec<TreeNode>) -> Result<Self, PmmlError> {
        if nodes.is_empty() {
            return Err(PmmlError::ConfigurationError("tree has no nodes".to_string()));
        }
        let width = nodes[0].value.len();
        if width == 0 {
            return Err(PmmlError::ConfigurationError("tree nodes carry no values".to_string()));
        }

        let n = nodes.len();
        let mut n_parents = vec![0_usize; n];
        for (i, node) in nodes.iter().enumerate() {
            if node.num != i {
                return Err(PmmlError::ConfigurationError(format!(
                    "node stored at {} is numbered {}",
                    i, node.num
                )));
            }
            if node.value.len() != width {
                return Err(PmmlError::ConfigurationError(format!(
                    "node {} has {} values, expected {}",
                    i,
                    node.value.len(),
                    width
                )));
            }
            if let Some((l, r)) = node.children() {
                // Children always come after their parent, which rules out cycles.
                for c in [l, r] {
                    if c <= i || c >= n {
                        return Err(PmmlError::ConfigurationError(format!(
                            "node {} has out of range child {}",
                            i, c
                        )));
                    }
                    n_parents[c] += 1;
                }
            }
        }
        if let Some(i) = (1..n).find(|i| n_parents[*i] != 1) {
            return Err(PmmlError::ConfigurationError(format!(
                "node {} is reachable from {} parents",
                i, n_parents[i]
            )));
        }

        nodes[0].depth = 0;
        let mut depth = 0;
        for i in 0..n {
            let d = nodes[i].depth;
            depth = depth.max(d);
            if let Some((l, r)) = nodes[i].children() {
                nodes[l].depth = d + 1;
                nodes[r].depth = d + 1;
            }
        }
        if depth > MAX_TREE_DEPTH {
            return Err(PmmlError::ConfigurationError(format!(
                "tree depth {} exceeds the supported maximum of {}",
                depth, MAX_TREE_DEPTH
            )));
        }

        Ok(Tree { nodes, depth })
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&TreeNode> {
        self.nodes.get(idx)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Width of each node's value vector.
    pub fn n_values(&self) -> usize {
        self.nodes[0].value.len()
    }
}

impl TryFrom<TreeArrays> for Tree {
    type Error = PmmlError;

    fn try_from(a: TreeArrays) -> Result<Self, Self::Error> {
        Tree::from_arrays(
            &a.children_left,
            &a.children_right,
            &a.feature,
            &a.threshold,
            &a.n_node_samples,
            &a.value,
        )
    }
}

impl From<Tree> for TreeArrays {
    fn from(t: Tree) -> Self {
        let mut a = TreeArrays {
            children_left: Vec::with_capacity(t.nodes.len()),
            children_right: Vec::with_capacity(t.nodes.len()),
            feature: Vec::with_capacity(t.nodes.len()),
            threshold: Vec::with_capacity(t.nodes.len()),
            n_node_samples: Vec::with_capacity(t.nodes.len()),
            value: Vec::with_capacity(t.nodes.len()),
        };
        for node in t.nodes {
            match node.children() {
                Some((l, r)) => {
                    a.children_left.push(l as i64);
                    a.children_right.push(r as i64);
                    a.feature.push(node.split_feature as i64);
                    a.threshold.push(node.split_value);
                }
                None => {
                    a.children_left.push(TREE_LEAF);
                    a.children_right.push(TREE_LEAF);
                    a.feature.push(TREE_UNDEFINED);
                    a.threshold.push(TREE_UNDEFINED as f64);
                }
            }
            a.n_node_samples.push(node.n_node_samples);
            a.value.push(node.value);
        }
        a
    }
}

impl Display for Tree {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<usize> = vec![0];
        let mut r = String::new();
        while let Some(idx) = print_buffer.pop() {
            let node = &self.nodes[idx];
            r += format!("{}{}\n", "      ".repeat(node.depth).as_str(), node).as_str();
            if let Some((l, r)) = node.children() {
                print_buffer.push(r);
                print_buffer.push(l);
            }
        }
        write!(f, "{}", r)
    }
}

/// What a fitted estimator predicts.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorType {
    Classifier,
    Regressor,
}

/// Read access to a fitted single-output decision tree.
pub trait TreeEstimator {
    fn tree(&self) -> &Tree;
    fn estimator_type(&self) -> EstimatorType;
    /// Number of classes for a classifier, `None` for a regressor.
    fn n_classes(&self) -> Option<usize>;
}

impl<T: TreeEstimator + ?Sized> TreeEstimator for &T {
    fn tree(&self) -> &Tree {
        (**self).tree()
    }

    fn estimator_type(&self) -> EstimatorType {
        (**self).estimator_type()
    }

    fn n_classes(&self) -> Option<usize> {
        (**self).n_classes()
    }
}

/// Fitted classification tree. Each node value holds one entry per class.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DecisionTreeClassifier {
    tree: Tree,
}

impl DecisionTreeClassifier {
    pub fn new(tree: Tree) -> Self {
        DecisionTreeClassifier { tree }
    }

    /// Load a classifier from a json string.
    pub fn from_json(json_str: &str) -> Result<Self, PmmlError> {
        from_json(json_str)
    }

    /// Load a classifier from a path to a json file.
    pub fn load(path: &str) -> Result<Self, PmmlError> {
        load(path)
    }
}

impl TreeEstimator for DecisionTreeClassifier {
    fn tree(&self) -> &Tree {
        &self.tree
    }

    fn estimator_type(&self) -> EstimatorType {
        EstimatorType::Classifier
    }

    fn n_classes(&self) -> Option<usize> {
        Some(self.tree.n_values())
    }
}

/// Fitted regression tree. Each node value holds the mean target.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(try_from = "Tree", into = "Tree")]
pub struct DecisionTreeRegressor {
    tree: Tree,
}

impl DecisionTreeRegressor {
    /// Wrap a tree, failing unless every node carries exactly one value.
    pub fn new(tree: Tree) -> Result<Self, PmmlError> {
        if tree.n_values() != 1 {
            return Err(PmmlError::ConfigurationError(format!(
                "a regression tree has one value per node, found {}",
                tree.n_values()
            )));
        }
        Ok(DecisionTreeRegressor { tree })
    }

    /// Load a regressor from a json string.
    pub fn from_json(json_str: &str) -> Result<Self, PmmlError> {
        from_json(json_str)
    }

    /// Load a regressor from a path to a json file.
    pub fn load(path: &str) -> Result<Self, PmmlError> {
        load(path)
    }
}

impl TryFrom<Tree> for DecisionTreeRegressor {
    type Error = PmmlError;

    fn try_from(tree: Tree) -> Result<Self, Self::Error> {
        DecisionTreeRegressor::new(tree)
    }
}

impl From<DecisionTreeRegressor> for Tree {
    fn from(r: DecisionTreeRegressor) -> Self {
        r.tree
    }
}

impl TreeEstimator for DecisionTreeRegressor {
    fn tree(&self) -> &Tree {
        &self.tree
    }

    fn estimator_type(&self) -> EstimatorType {
        EstimatorType::Regressor
    }

    fn n_classes(&self) -> Option<usize> {
        None
    }
}

fn from_json<T: DeserializeOwned>(json_str: &str) -> Result<T, PmmlError> {
    serde_json::from_str::<T>(json_str).map_err(|e| PmmlError::UnableToRead(e.to_string()))
}

fn load<T: DeserializeOwned>(path: &str) -> Result<T, PmmlError> {
    let json_str = fs::read_to_string(path).map_err(|e| PmmlError::UnableToRead(e.to_string()))?;
    from_json(&json_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Depth 2 classifier fit on {(0,0)->0, (0,1)->1, (1,0)->1, (1,1)->1}.
    fn classifier_arrays() -> TreeArrays {
        TreeArrays {
            children_left: vec![1, 2, -1, -1, -1],
            children_right: vec![4, 3, -1, -1, -1],
            feature: vec![0, 1, -2, -2, -2],
            threshold: vec![0.5, 0.5, -2.0, -2.0, -2.0],
            n_node_samples: vec![4, 2, 1, 1, 2],
            value: vec![
                vec![1.0, 3.0],
                vec![1.0, 1.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![0.0, 2.0],
            ],
        }
    }

    #[test]
    fn test_from_arrays() {
        let tree = Tree::try_from(classifier_arrays()).unwrap();
        assert_eq!(tree.nodes().len(), 5);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_values(), 2);
        assert_eq!(tree.node(0).unwrap().n_node_samples, 4);
        assert_eq!(tree.node(1).unwrap().children(), Some((2, 3)));
        assert!(tree.node(4).unwrap().is_leaf);
        assert_eq!(tree.node(3).unwrap().depth, 2);
        println!("{}", tree);
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let mut a = classifier_arrays();
        a.threshold.pop();
        let err = Tree::try_from(a).unwrap_err();
        assert!(matches!(err, PmmlError::ConfigurationError(_)));
    }

    #[test]
    fn test_half_leaf_fails() {
        let mut a = classifier_arrays();
        a.children_right[1] = -1;
        assert!(Tree::try_from(a).is_err());
    }

    #[test]
    fn test_cycle_fails() {
        let mut a = classifier_arrays();
        a.children_left[1] = 0;
        assert!(Tree::try_from(a).is_err());
    }

    #[test]
    fn test_shared_child_fails() {
        let mut a = classifier_arrays();
        a.children_right[0] = 3;
        assert!(Tree::try_from(a).is_err());
    }

    #[test]
    fn test_too_deep_tree_fails() {
        // Node 2k splits into leaf 2k+1 and node 2k+2.
        let depth = MAX_TREE_DEPTH + 1;
        let n = 2 * depth + 1;
        let mut left = vec![-1; n];
        let mut right = vec![-1; n];
        let mut feature = vec![-2; n];
        for k in 0..depth {
            left[2 * k] = (2 * k + 1) as i64;
            right[2 * k] = (2 * k + 2) as i64;
            feature[2 * k] = 0;
        }
        let samples = vec![1; n];
        let value = vec![vec![0.0]; n];
        let threshold = vec![0.5; n];
        let err = Tree::from_arrays(&left, &right, &feature, &threshold, &samples, &value).unwrap_err();
        assert!(matches!(err, PmmlError::ConfigurationError(_)));
    }

    #[test]
    fn test_classifier_json() {
        let json = serde_json::to_string(&classifier_arrays()).unwrap();
        let tree: Tree = serde_json::from_str(&json).unwrap();
        let clf = DecisionTreeClassifier::new(tree);
        assert_eq!(clf.n_classes(), Some(2));
        assert_eq!(clf.estimator_type(), EstimatorType::Classifier);

        let dumped = serde_json::to_string(&clf).unwrap();
        let back = DecisionTreeClassifier::from_json(&dumped).unwrap();
        assert_eq!(back, clf);
    }

    #[test]
    fn test_regressor_requires_single_value() {
        let tree = Tree::try_from(classifier_arrays()).unwrap();
        assert!(DecisionTreeRegressor::new(tree).is_err());

        let tree = Tree::from_arrays(
            &[1, -1, -1],
            &[2, -1, -1],
            &[0, -2, -2],
            &[0.5, -2.0, -2.0],
            &[4, 2, 2],
            &[vec![0.75], vec![0.5], vec![1.0]],
        )
        .unwrap();
        let reg = DecisionTreeRegressor::new(tree).unwrap();
        assert_eq!(reg.n_classes(), None);
        let json = serde_json::to_string(&reg).unwrap();
        assert_eq!(DecisionTreeRegressor::from_json(&json).unwrap(), reg);
    }

    #[test]
    fn test_invalid_json_is_unable_to_read() {
        let err = DecisionTreeRegressor::from_json("{").unwrap_err();
        assert!(matches!(err, PmmlError::UnableToRead(_)));
    }
}
