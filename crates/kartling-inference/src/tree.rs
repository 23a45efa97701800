//! Decision-tree classifier: flat-array structure and threshold traversal.
//!
//! The tree structure file is the JSON export of a fitted sklearn tree: parallel
//! arrays indexed by node id, with `-1` as the leaf sentinel in both child arrays and
//! per-node class-score rows in `values`. Validation happens entirely at load:
//!
//! - the five parallel arrays all have `n_nodes` entries,
//! - a node is either a full leaf (both children `-1`) or a full split (both children
//!   valid in-range ids with a non-negative split feature and finite threshold),
//! - every leaf's first value row is non-empty,
//! - the child links form a single tree rooted at node 0: every node is reached from
//!   the root exactly once, so traversal is guaranteed to terminate.
//!
//! Traversal starts at node 0 and descends left when
//! `sample[feature[node]] <= threshold[node]`, right otherwise - ties go left, the
//! right branch is the strict case. At a leaf, the predicted class is the argmax over
//! `values[leaf][0]`, decoded to a label through the same shared mapping the MLP uses.

use kartling_core::ActionLabel;
use serde::{Deserialize, Serialize};

use crate::classifier::{ActionClassifier, ModelShapeError, argmax, decode_class_index};

/// Sentinel child id marking a leaf.
pub const LEAF: i32 = -1;

/// Raw tree structure as persisted: parallel arrays indexed by node id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeStructure {
    pub n_nodes: usize,
    pub children_left: Vec<i32>,
    pub children_right: Vec<i32>,
    pub feature: Vec<i32>,
    pub threshold: Vec<f32>,
    pub values: Vec<Vec<Vec<f32>>>,
}

/// Why a tree structure file was rejected.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TreeFormatError {
    #[display("invalid tree JSON: {_0}")]
    Json(serde_json::Error),
    #[display("tree has no nodes")]
    Empty,
    #[display("field '{field}' has {got} entries but n_nodes is {expected}")]
    ArrayLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[display("node {node}: children must both be leaves or both be valid ids")]
    HalfLeaf { node: usize },
    #[display("node {node}: child id {child} out of range")]
    ChildOutOfRange { node: usize, child: i32 },
    #[display("node {node} is reachable by more than one path; traversal would not terminate")]
    SharedNode { node: usize },
    #[display("node {node} is not reachable from the root")]
    UnreachableNode { node: usize },
    #[display("node {node}: split feature {feature} is invalid")]
    InvalidSplitFeature { node: usize, feature: i32 },
    #[display("node {node}: split threshold {threshold} is not finite")]
    NonFiniteThreshold { node: usize, threshold: f32 },
    #[display("leaf {node}: first value row is empty")]
    EmptyLeafValues { node: usize },
}

impl From<serde_json::Error> for TreeFormatError {
    fn from(err: serde_json::Error) -> Self {
        TreeFormatError::Json(err)
    }
}

/// Validated, immutable decision-tree classifier.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    structure: DecisionTreeStructure,
    /// Highest feature index any split touches; drives attach-time width checks.
    max_split_feature: Option<usize>,
}

impl DecisionTree {
    /// Parses and validates a tree structure JSON document.
    pub fn from_json(text: &str) -> Result<Self, TreeFormatError> {
        let structure: DecisionTreeStructure = serde_json::from_str(text)?;
        let tree = Self::new(structure)?;
        tracing::debug!(
            n_nodes = tree.structure.n_nodes,
            max_split_feature = ?tree.max_split_feature,
            "loaded decision tree",
        );
        Ok(tree)
    }

    /// Validates a structure and wraps it.
    pub fn new(structure: DecisionTreeStructure) -> Result<Self, TreeFormatError> {
        let n = structure.n_nodes;
        if n == 0 {
            return Err(TreeFormatError::Empty);
        }
        check_len("children_left", structure.children_left.len(), n)?;
        check_len("children_right", structure.children_right.len(), n)?;
        check_len("feature", structure.feature.len(), n)?;
        check_len("threshold", structure.threshold.len(), n)?;
        check_len("values", structure.values.len(), n)?;

        let mut max_split_feature = None;
        for node in 0..n {
            let left = structure.children_left[node];
            let right = structure.children_right[node];
            match (left == LEAF, right == LEAF) {
                (true, true) => {
                    let row = structure.values[node].first();
                    if row.is_none_or(Vec::is_empty) {
                        return Err(TreeFormatError::EmptyLeafValues { node });
                    }
                }
                (false, false) => {
                    for child in [left, right] {
                        let valid = usize::try_from(child)
                            .is_ok_and(|child| child < n && child != node);
                        if !valid {
                            return Err(TreeFormatError::ChildOutOfRange { node, child });
                        }
                    }
                    let feature = structure.feature[node];
                    let Ok(feature) = usize::try_from(feature) else {
                        return Err(TreeFormatError::InvalidSplitFeature { node, feature });
                    };
                    let threshold = structure.threshold[node];
                    if !threshold.is_finite() {
                        return Err(TreeFormatError::NonFiniteThreshold { node, threshold });
                    }
                    max_split_feature =
                        Some(max_split_feature.map_or(feature, |m: usize| m.max(feature)));
                }
                _ => return Err(TreeFormatError::HalfLeaf { node }),
            }
        }

        // Child links must form a single tree rooted at node 0; a cycle or a shared
        // child would make traversal spin forever.
        #[allow(clippy::cast_sign_loss)]
        {
            let mut visited = vec![false; n];
            let mut stack = vec![0_usize];
            while let Some(node) = stack.pop() {
                if visited[node] {
                    return Err(TreeFormatError::SharedNode { node });
                }
                visited[node] = true;
                let left = structure.children_left[node];
                if left != LEAF {
                    stack.push(left as usize);
                    stack.push(structure.children_right[node] as usize);
                }
            }
            if let Some(node) = visited.iter().position(|&seen| !seen) {
                return Err(TreeFormatError::UnreachableNode { node });
            }
        }

        Ok(Self {
            structure,
            max_split_feature,
        })
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.structure.n_nodes
    }

    #[must_use]
    pub fn structure(&self) -> &DecisionTreeStructure {
        &self.structure
    }

    /// Highest feature index any split reads, `None` for a lone leaf.
    #[must_use]
    pub fn max_split_feature(&self) -> Option<usize> {
        self.max_split_feature
    }

    /// Traverses to a leaf and returns the argmax class index of its first value row.
    ///
    /// Validation guarantees the casts: split features are non-negative and child
    /// ids are in range.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn predict_class(&self, sample: &[f32]) -> usize {
        let s = &self.structure;
        let mut node = 0usize;
        while s.children_left[node] != LEAF && s.children_right[node] != LEAF {
            let feature = s.feature[node] as usize;
            let next = if sample[feature] <= s.threshold[node] {
                s.children_left[node]
            } else {
                s.children_right[node]
            };
            node = next as usize;
        }
        argmax(&s.values[node][0])
    }
}

impl ActionClassifier for DecisionTree {
    fn check_input_width(&self, feature_len: usize) -> Result<(), ModelShapeError> {
        if let Some(feature) = self.max_split_feature
            && feature >= feature_len
        {
            return Err(ModelShapeError::TreeFeatureRange {
                feature,
                features: feature_len,
            });
        }
        Ok(())
    }

    fn predict_label(&self, features: &[f32]) -> ActionLabel {
        decode_class_index(self.predict_class(features))
    }
}

fn check_len(
    field: &'static str,
    got: usize,
    expected: usize,
) -> Result<(), TreeFormatError> {
    if got != expected {
        return Err(TreeFormatError::ArrayLength {
            field,
            expected,
            got,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_leaf(values: Vec<f32>) -> DecisionTree {
        DecisionTree::new(DecisionTreeStructure {
            n_nodes: 1,
            children_left: vec![LEAF],
            children_right: vec![LEAF],
            feature: vec![-2],
            threshold: vec![0.0],
            values: vec![vec![values]],
        })
        .unwrap()
    }

    /// Root split on feature 0 at 0.5; left leaf votes class 1, right leaf class 2.
    fn stump() -> DecisionTree {
        DecisionTree::new(DecisionTreeStructure {
            n_nodes: 3,
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![0, -2, -2],
            threshold: vec![0.5, 0.0, 0.0],
            values: vec![
                vec![vec![0.0, 0.0, 0.0]],
                vec![vec![1.0, 9.0, 2.0]],
                vec![vec![1.0, 2.0, 9.0]],
            ],
        })
        .unwrap()
    }

    #[test]
    fn test_root_leaf_ignores_input() {
        let tree = single_leaf(vec![3.0, 8.0, 1.0]);
        assert_eq!(tree.predict_class(&[0.0; 11]), 1);
        assert_eq!(tree.predict_class(&[]), 1, "a root leaf reads no features");
        assert_eq!(tree.predict_label(&[]), ActionLabel::LeftAccelerate);
    }

    #[test]
    fn test_threshold_split_and_tie_goes_left() {
        let tree = stump();
        assert_eq!(tree.predict_class(&[0.4, 7.0]), 1, "0.4 <= 0.5 goes left");
        assert_eq!(tree.predict_class(&[0.6, 7.0]), 2, "0.6 > 0.5 goes right");
        assert_eq!(
            tree.predict_class(&[0.5, 7.0]),
            1,
            "exact boundary must take the left branch",
        );
    }

    #[test]
    fn test_shared_label_decode() {
        let tree = stump();
        assert_eq!(tree.predict_label(&[0.0]), ActionLabel::LeftAccelerate);
        assert_eq!(tree.predict_label(&[1.0]), ActionLabel::RightAccelerate);
    }

    #[test]
    fn test_parse_from_json() {
        let json = r#"{
            "n_nodes": 3,
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [4, -2, -2],
            "threshold": [-0.25, -2.0, -2.0],
            "values": [[[0.0]], [[5.0, 1.0]], [[1.0, 5.0]]]
        }"#;
        let tree = DecisionTree::from_json(json).unwrap();
        assert_eq!(tree.num_nodes(), 3);
        assert_eq!(tree.predict_class(&[0.0, 0.0, 0.0, 0.0, -1.0]), 0);
        assert_eq!(tree.predict_class(&[0.0, 0.0, 0.0, 0.0, 1.0]), 1);
    }

    #[test]
    fn test_array_length_disagreement_rejected() {
        let json = r#"{
            "n_nodes": 2,
            "children_left": [-1],
            "children_right": [-1, -1],
            "feature": [-2, -2],
            "threshold": [0.0, 0.0],
            "values": [[[1.0]], [[1.0]]]
        }"#;
        let err = DecisionTree::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            TreeFormatError::ArrayLength {
                field: "children_left",
                expected: 2,
                got: 1,
            }
        ));
    }

    #[test]
    fn test_missing_field_is_json_error() {
        let err = DecisionTree::from_json(r#"{"n_nodes": 1}"#).unwrap_err();
        assert!(matches!(err, TreeFormatError::Json(_)));
    }

    #[test]
    fn test_half_leaf_rejected() {
        let err = DecisionTree::new(DecisionTreeStructure {
            n_nodes: 2,
            children_left: vec![1, LEAF],
            children_right: vec![LEAF, LEAF],
            feature: vec![0, -2],
            threshold: vec![0.0, 0.0],
            values: vec![vec![vec![1.0]], vec![vec![1.0]]],
        })
        .unwrap_err();
        assert!(matches!(err, TreeFormatError::HalfLeaf { node: 0 }));
    }

    #[test]
    fn test_empty_leaf_values_rejected() {
        let err = DecisionTree::new(DecisionTreeStructure {
            n_nodes: 1,
            children_left: vec![LEAF],
            children_right: vec![LEAF],
            feature: vec![-2],
            threshold: vec![0.0],
            values: vec![vec![]],
        })
        .unwrap_err();
        assert!(matches!(err, TreeFormatError::EmptyLeafValues { node: 0 }));
    }

    #[test]
    fn test_cyclic_structure_rejected() {
        // Nodes 0 and 1 point at each other; traversal would never reach a leaf.
        let err = DecisionTree::new(DecisionTreeStructure {
            n_nodes: 3,
            children_left: vec![1, 0, LEAF],
            children_right: vec![2, 2, LEAF],
            feature: vec![0, 0, -2],
            threshold: vec![0.0, 0.0, 0.0],
            values: vec![vec![vec![1.0]], vec![vec![1.0]], vec![vec![1.0]]],
        })
        .unwrap_err();
        assert!(
            matches!(err, TreeFormatError::SharedNode { .. }),
            "cyclic structure must be rejected at load, got {err}",
        );
    }

    #[test]
    fn test_shared_child_rejected() {
        // Both children of the root are the same leaf.
        let err = DecisionTree::new(DecisionTreeStructure {
            n_nodes: 2,
            children_left: vec![1, LEAF],
            children_right: vec![1, LEAF],
            feature: vec![0, -2],
            threshold: vec![0.0, 0.0],
            values: vec![vec![vec![1.0]], vec![vec![1.0]]],
        })
        .unwrap_err();
        assert!(matches!(err, TreeFormatError::SharedNode { node: 1 }));
    }

    #[test]
    fn test_unreachable_node_rejected() {
        // Node 1 is a well-formed leaf that nothing points at.
        let err = DecisionTree::new(DecisionTreeStructure {
            n_nodes: 2,
            children_left: vec![LEAF, LEAF],
            children_right: vec![LEAF, LEAF],
            feature: vec![-2, -2],
            threshold: vec![0.0, 0.0],
            values: vec![vec![vec![1.0]], vec![vec![1.0]]],
        })
        .unwrap_err();
        assert!(matches!(err, TreeFormatError::UnreachableNode { node: 1 }));
    }

    #[test]
    fn test_attach_width_check_uses_max_split_feature() {
        let tree = stump();
        assert!(tree.check_input_width(1).is_ok());
        assert!(matches!(
            tree.check_input_width(0),
            Err(ModelShapeError::TreeFeatureRange {
                feature: 0,
                features: 0,
            })
        ));
        // A lone leaf accepts any width.
        assert!(single_leaf(vec![1.0]).check_input_width(0).is_ok());
    }
}
