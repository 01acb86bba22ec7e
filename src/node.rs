use serde::{Deserialize, Serialize};
use std::fmt;

/// One record of a fitted tree. Child indices address other records
/// in the same `Tree` arena.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub num: usize,
    pub depth: usize,
    pub split_value: f64,
    pub split_feature: usize,
    pub left_child: usize,
    pub right_child: usize,
    pub is_leaf: bool,
    /// Number of training samples that reached this node.
    pub n_node_samples: usize,
    /// Per-class sample counts (classifier) or the mean target (regressor).
    pub value: Vec<f64>,
}

impl TreeNode {
    pub fn new_leaf(num: usize, n_node_samples: usize, value: Vec<f64>) -> Self {
        TreeNode {
            num,
            depth: 0,
            split_value: f64::NAN,
            split_feature: 0,
            left_child: 0,
            right_child: 0,
            is_leaf: true,
            n_node_samples,
            value,
        }
    }

    pub fn new_split(
        num: usize,
        split_feature: usize,
        split_value: f64,
        left_child: usize,
        right_child: usize,
        n_node_samples: usize,
        value: Vec<f64>,
    ) -> Self {
        TreeNode {
            num,
            depth: 0,
            split_value,
            split_feature,
            left_child,
            right_child,
            is_leaf: false,
            n_node_samples,
            value,
        }
    }

    /// Left and right child indices, `None` for a leaf.
    pub fn children(&self) -> Option<(usize, usize)> {
        if self.is_leaf {
            None
        } else {
            Some((self.left_child, self.right_child))
        }
    }
}

impl fmt::Display for TreeNode {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_leaf {
            write!(f, "{}:leaf={:?},samples={}", self.num, self.value, self.n_node_samples)
        } else {
            write!(
                f,
                "{}:[{} <= {}] yes={},no={},samples={}",
                self.num, self.split_feature, self.split_value, self.left_child, self.right_child, self.n_node_samples
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split() {
        let n = TreeNode::new_split(0, 0, 0.5, 1, 2, 4, vec![1.0, 3.0]);
        assert_eq!(n.children(), Some((1, 2)));
        assert_eq!(format!("{}", n), "0:[0 <= 0.5] yes=1,no=2,samples=4");
    }

    #[test]
    fn test_leaf() {
        let n = TreeNode::new_leaf(4, 2, vec![0.0, 2.0]);
        assert!(n.children().is_none());
        assert_eq!(format!("{}", n), "4:leaf=[0.0, 2.0],samples=2");
    }
}
