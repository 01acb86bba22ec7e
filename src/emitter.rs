//! Tree node emitter
//!
//! Walks a fitted tree from its root and builds the PMML `Node` graph.
use crate::errors::PmmlError;
use crate::features::Feature;
use crate::node::TreeNode;
use crate::pmml::{Node, Operator, Predicate, Score, ScoreDistribution, SimplePredicate};
use crate::tree::Tree;
use crate::utils::{argmax, normalize};
use log::warn;

/// How leaves are scored, chosen once per conversion.
#[derive(Debug, Clone, Copy)]
pub enum LeafEmitter<'a> {
    /// Majority class plus a probability per declared category.
    Classification { categories: &'a [String] },
    /// The leaf's stored value.
    Regression,
}

impl LeafEmitter<'_> {
    pub fn emit_leaf(&self, tree_node: &TreeNode, node: &mut Node) -> Result<(), PmmlError> {
        match self {
            LeafEmitter::Classification { categories } => {
                if tree_node.value.len() != categories.len() {
                    return Err(PmmlError::ConfigurationError(format!(
                        "leaf {} has {} class counts but the output declares {} categories",
                        tree_node.num,
                        tree_node.value.len(),
                        categories.len()
                    )));
                }
                let probabilities = match normalize(&tree_node.value) {
                    Some(p) => p,
                    None => {
                        warn!(
                            "Leaf {} has no class mass, using a uniform distribution.",
                            tree_node.num
                        );
                        vec![1.0 / categories.len() as f64; categories.len()]
                    }
                };
                let best = argmax(&tree_node.value).unwrap_or(0);
                node.score = Some(Score::Label(categories[best].clone()));
                node.score_distributions = categories
                    .iter()
                    .zip(probabilities)
                    .map(|(label, p)| ScoreDistribution {
                        value: label.clone(),
                        record_count: p * node.record_count,
                        probability: p,
                    })
                    .collect();
            }
            LeafEmitter::Regression => {
                node.score = Some(Score::Value(tree_node.value[0]));
            }
        }
        Ok(())
    }
}

/// Builds the node graph of one fitted tree.
///
/// * `tree` - The fitted tree.
/// * `features` - Model features, indexed the way the tree's split features are.
/// * `leaf_emitter` - Scoring for leaves.
pub struct TreeNodeEmitter<'a> {
    tree: &'a Tree,
    features: &'a [Feature],
    leaf_emitter: LeafEmitter<'a>,
}

impl<'a> TreeNodeEmitter<'a> {
    pub fn new(tree: &'a Tree, features: &'a [Feature], leaf_emitter: LeafEmitter<'a>) -> Self {
        TreeNodeEmitter {
            tree,
            features,
            leaf_emitter,
        }
    }

    /// Emit the root node, whose predicate is always `True`.
    pub fn emit(&self) -> Result<Node, PmmlError> {
        let n = self.tree.nodes().len();
        let mut emitted: Vec<Option<Node>> = (0..n).map(|_| None).collect();
        let mut order = Vec::with_capacity(n);
        let mut stack = vec![(0, Predicate::True)];
        while let Some((idx, predicate)) = stack.pop() {
            let tree_node = self.tree_node(idx)?;
            let mut node = Node {
                id: idx.to_string(),
                score: None,
                record_count: tree_node.n_node_samples as f64,
                predicate,
                score_distributions: Vec::new(),
                nodes: Vec::new(),
            };
            match tree_node.children() {
                None => self.leaf_emitter.emit_leaf(tree_node, &mut node)?,
                Some((left, right)) => {
                    let feature = self.split_feature(tree_node)?;
                    // Categorical features are split on the numeric encoding the
                    // tree was fit on, so both kinds get threshold predicates.
                    let split_value = tree_node.split_value;
                    stack.push((right, threshold_predicate(feature, Operator::GreaterThan, split_value)));
                    stack.push((left, threshold_predicate(feature, Operator::LessOrEqual, split_value)));
                }
            }
            emitted[idx] = Some(node);
            order.push(idx);
        }

        // Parents come before their children in `order`, so walking it
        // backwards attaches every subtree after it is complete.
        for &idx in order.iter().rev() {
            if let Some((left, right)) = self.tree_node(idx)?.children() {
                let left = take_emitted(&mut emitted, left)?;
                let right = take_emitted(&mut emitted, right)?;
                if let Some(parent) = emitted[idx].as_mut() {
                    parent.nodes.push(left);
                    parent.nodes.push(right);
                }
            }
        }
        take_emitted(&mut emitted, 0)
    }

    fn tree_node(&self, idx: usize) -> Result<&'a TreeNode, PmmlError> {
        self.tree
            .node(idx)
            .ok_or_else(|| PmmlError::ConfigurationError(format!("tree has no node {}", idx)))
    }

    fn split_feature(&self, tree_node: &TreeNode) -> Result<&'a Feature, PmmlError> {
        self.features.get(tree_node.split_feature).ok_or_else(|| {
            PmmlError::SchemaMismatchError(format!(
                "node {} splits on feature index {}, but only {} model features are declared",
                tree_node.num,
                tree_node.split_feature,
                self.features.len()
            ))
        })
    }
}

fn take_emitted(emitted: &mut [Option<Node>], idx: usize) -> Result<Node, PmmlError> {
    emitted
        .get_mut(idx)
        .and_then(Option::take)
        .ok_or_else(|| PmmlError::ConfigurationError(format!("node {} is not reachable from the root", idx)))
}

fn threshold_predicate(feature: &Feature, operator: Operator, value: f64) -> Predicate {
    Predicate::SimplePredicate(SimplePredicate {
        field: feature.name().to_string(),
        operator,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn features() -> Vec<Feature> {
        vec![
            Feature::integer_numeric("x1"),
            Feature::string_categorical("x2", &["zero", "one"]).unwrap(),
        ]
    }

    fn categories() -> Vec<String> {
        vec!["neg".to_string(), "pos".to_string()]
    }

    fn classifier_tree() -> Tree {
        Tree::from_arrays(
            &[1, 2, -1, -1, -1],
            &[4, 3, -1, -1, -1],
            &[0, 1, -2, -2, -2],
            &[0.5, 0.5, -2.0, -2.0, -2.0],
            &[4, 2, 1, 1, 2],
            &[
                vec![1.0, 3.0],
                vec![1.0, 1.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![0.0, 2.0],
            ],
        )
        .unwrap()
    }

    fn check_conservation(node: &Node) {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            if !node.is_leaf() {
                let total: f64 = node.nodes.iter().map(|n| n.record_count).sum();
                assert_eq!(total, node.record_count);
                stack.extend(node.nodes.iter());
            }
        }
    }

    // Node 2k splits into leaf 2k+1 and node 2k+2, the last node is a leaf.
    fn chain_tree(depth: usize) -> Tree {
        let n = 2 * depth + 1;
        let mut left = vec![-1; n];
        let mut right = vec![-1; n];
        let mut feature = vec![-2; n];
        let mut threshold = vec![-2.0; n];
        let mut samples = vec![1; n];
        for k in 0..depth {
            left[2 * k] = (2 * k + 1) as i64;
            right[2 * k] = (2 * k + 2) as i64;
            feature[2 * k] = (k % 2) as i64;
            threshold[2 * k] = k as f64 + 0.5;
            samples[2 * k] = depth - k + 1;
        }
        let value: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        Tree::from_arrays(&left, &right, &feature, &threshold, &samples, &value).unwrap()
    }

    #[test]
    fn test_emit_classification() {
        let tree = classifier_tree();
        let features = features();
        let categories = categories();
        let emitter = TreeNodeEmitter::new(&tree, &features, LeafEmitter::Classification { categories: &categories });
        let root = emitter.emit().unwrap();
        println!("{}", root);

        assert_eq!(root.predicate, Predicate::True);
        assert_eq!(root.record_count, 4.0);
        assert!(root.score.is_none());
        assert_eq!(root.node_count(), tree.nodes().len());
        check_conservation(&root);

        let left = &root.nodes[0];
        match &left.predicate {
            Predicate::SimplePredicate(p) => {
                assert_eq!(p.field, "x1");
                assert_eq!(p.operator, Operator::LessOrEqual);
                assert_eq!(p.value, 0.5);
            }
            Predicate::True => panic!("split children need a simple predicate"),
        }
        // The categorical x2 split still uses the numeric threshold.
        match &left.nodes[1].predicate {
            Predicate::SimplePredicate(p) => {
                assert_eq!(p.field, "x2");
                assert_eq!(p.operator, Operator::GreaterThan);
            }
            Predicate::True => panic!("split children need a simple predicate"),
        }

        let leaves = root.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].score, Some(Score::Label("neg".to_string())));
        assert_eq!(leaves[1].score, Some(Score::Label("pos".to_string())));
        for leaf in leaves {
            assert_eq!(leaf.score_distributions.len(), 2);
            let total: f64 = leaf.score_distributions.iter().map(|d| d.probability).sum();
            assert_relative_eq!(total, 1.0);
        }
        let right = &root.nodes[1];
        assert_eq!(right.score_distributions[0].probability, 0.0);
        assert_eq!(right.score_distributions[1].record_count, 2.0);
    }

    #[test]
    fn test_majority_tie_takes_first_category() {
        let tree = Tree::from_arrays(&[-1], &[-1], &[-2], &[-2.0], &[2], &[vec![1.0, 1.0]]).unwrap();
        let categories = categories();
        let root = TreeNodeEmitter::new(&tree, &[], LeafEmitter::Classification { categories: &categories })
            .emit()
            .unwrap();
        assert_eq!(root.score, Some(Score::Label("neg".to_string())));
        assert_eq!(root.score_distributions[0].probability, 0.5);
    }

    #[test]
    fn test_empty_leaf_gets_uniform_distribution() {
        let tree = Tree::from_arrays(&[-1], &[-1], &[-2], &[-2.0], &[0], &[vec![0.0, 0.0]]).unwrap();
        let categories = categories();
        let root = TreeNodeEmitter::new(&tree, &[], LeafEmitter::Classification { categories: &categories })
            .emit()
            .unwrap();
        assert_eq!(root.score_distributions[1].probability, 0.5);
    }

    #[test]
    fn test_emit_regression() {
        let tree = Tree::from_arrays(
            &[1, -1, -1],
            &[2, -1, -1],
            &[1, -2, -2],
            &[0.5, -2.0, -2.0],
            &[4, 2, 2],
            &[vec![0.75], vec![0.5], vec![1.0]],
        )
        .unwrap();
        let features = features();
        let root = TreeNodeEmitter::new(&tree, &features, LeafEmitter::Regression).emit().unwrap();
        assert_eq!(root.record_count, 4.0);
        check_conservation(&root);
        for leaf in root.leaves() {
            assert!(leaf.score_distributions.is_empty());
            assert!(matches!(leaf.score, Some(Score::Value(_))));
        }
        assert_eq!(root.nodes[1].score, Some(Score::Value(1.0)));
    }

    #[test]
    fn test_emit_deep_chain_tree() {
        let depth = crate::constants::MAX_TREE_DEPTH;
        let tree = chain_tree(depth);
        let features = features();
        let root = TreeNodeEmitter::new(&tree, &features, LeafEmitter::Regression).emit().unwrap();
        assert_eq!(root.record_count, (depth + 1) as f64);
        assert_eq!(root.node_count(), 2 * depth + 1);
        assert_eq!(root.leaves().len(), depth + 1);
        check_conservation(&root);

        let mut node = &root;
        while !node.is_leaf() {
            node = &node.nodes[1];
        }
        assert_eq!(node.id, (2 * depth).to_string());
        assert_eq!(node.score, Some(Score::Value((2 * depth) as f64)));
        assert_eq!(format!("{}", root).lines().count(), 2 * depth + 1);
    }

    #[test]
    fn test_unresolved_feature_index_fails() {
        let tree = classifier_tree();
        let features = vec![Feature::integer_numeric("x1")];
        let categories = categories();
        let err = TreeNodeEmitter::new(&tree, &features, LeafEmitter::Classification { categories: &categories })
            .emit()
            .unwrap_err();
        assert!(matches!(err, PmmlError::SchemaMismatchError(_)));
    }

    #[test]
    fn test_class_count_mismatch_fails() {
        let tree = classifier_tree();
        let features = features();
        let categories = vec!["only".to_string()];
        let err = TreeNodeEmitter::new(&tree, &features, LeafEmitter::Classification { categories: &categories })
            .emit()
            .unwrap_err();
        assert!(matches!(err, PmmlError::ConfigurationError(_)));
    }
}
