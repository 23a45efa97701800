//! The classifier seam shared by both model representations.
//!
//! The MLP and the decision tree are alternative strategies selected at configuration
//! time; both consume the same encoded feature vector and resolve to the same fixed
//! action taxonomy. They meet in two places:
//!
//! - [`ActionClassifier`], the trait the pipeline drives once per tick, and
//! - [`decode_class_index`], the one shared class-index → label mapping.
//!
//! # The 3-class decode
//!
//! The trained artifacts only ever produce classes 0..=2 - the recorded drivers never
//! braked or coasted, so `BRAKE`/`LEFT_BRAKE`/`RIGHT_BRAKE`/`NONE` never appear in
//! training data. The mapping is therefore deliberately partial: indices 0, 1, 2 decode
//! to `ACCELERATE`, `LEFT_ACCELERATE`, `RIGHT_ACCELERATE`, and anything else falls back
//! to `NONE`. Do not widen it without retraining against a wider label set; the index
//! order is a property of the trained artifact, not of the taxonomy.

use std::fmt;

use kartling_core::ActionLabel;

/// Why a model's shape disagrees with what it is being asked to consume.
///
/// Raised at load time (parameter assembly) or attach time (pipeline construction),
/// never mid-tick.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ModelShapeError {
    #[display("weight file never populated {kind} slot {index}")]
    MissingSlot { kind: &'static str, index: usize },
    #[display("layer {index}: bias has {bias_len} entries but weight matrix has {cols} columns")]
    BiasWidth {
        index: usize,
        cols: usize,
        bias_len: usize,
    },
    #[display(
        "layer {index}: weight matrix has {rows} input rows but the previous layer outputs {prev}"
    )]
    BrokenChain {
        index: usize,
        rows: usize,
        prev: usize,
    },
    #[display("model expects {model} input features but the encoder produces {features}")]
    InputWidth { model: usize, features: usize },
    #[display("tree splits on feature {feature} but the encoder only produces {features}")]
    TreeFeatureRange { feature: usize, features: usize },
}

/// Decodes a classifier output index into an action label.
///
/// Shared by the MLP and decision-tree paths so the mapping cannot diverge.
#[must_use]
pub fn decode_class_index(index: usize) -> ActionLabel {
    match index {
        0 => ActionLabel::Accelerate,
        1 => ActionLabel::LeftAccelerate,
        2 => ActionLabel::RightAccelerate,
        _ => ActionLabel::None,
    }
}

/// A trained model that maps an encoded feature vector to an action label.
///
/// Implementations are immutable after load and shareable across agents. Input width
/// is checked once, when a pipeline attaches the classifier, so `predict_label` can
/// assume a compatible vector.
pub trait ActionClassifier: fmt::Debug + Send + Sync {
    /// Validates that feature vectors of `feature_len` are acceptable input.
    ///
    /// Called at attach time so a width mismatch fails fast with a descriptive error
    /// instead of surfacing as an out-of-bounds read mid-tick.
    fn check_input_width(&self, feature_len: usize) -> Result<(), ModelShapeError>;

    /// Predicts the action for one encoded feature vector.
    fn predict_label(&self, features: &[f32]) -> ActionLabel;
}

/// First (lowest) index of the maximum value; 0 for an empty slice.
///
/// The lowest-index tie-break is part of the prediction contract for both models.
#[must_use]
pub fn argmax(values: &[f32]) -> usize {
    let mut index = 0;
    let mut max = f32::MIN;
    for (i, &value) in values.iter().enumerate() {
        if value > max {
            max = value;
            index = i;
        }
    }
    index
}

pub type BoxedActionClassifier = Box<dyn ActionClassifier>;

impl ActionClassifier for BoxedActionClassifier {
    fn check_input_width(&self, feature_len: usize) -> Result<(), ModelShapeError> {
        self.as_ref().check_input_width(feature_len)
    }

    fn predict_label(&self, features: &[f32]) -> ActionLabel {
        self.as_ref().predict_label(features)
    }
}
