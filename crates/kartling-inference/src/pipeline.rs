//! The per-tick inference entry point.
//!
//! A [`DrivePipeline`] owns one feature encoder and one attached classifier and runs
//! the whole chain for a single control tick: snapshot → encode → predict → signal.
//! It is the explicit-construction replacement for an engine-managed startup hook:
//! a caller builds the encoder and classifier from validated parameters, attaches
//! them, and holds an immutable, shareable handle for the rest of the process.
//!
//! Attachment is where shape coupling is enforced. The encoder's output width is
//! checked against the classifier's expected input width exactly once, here, so a
//! scaler/model mismatch is a descriptive startup error instead of a wrong or
//! out-of-bounds read at argmax time. After that, a tick can only fail inside
//! encoding (wrong ray count, non-finite value); such a failure means "skip this
//! tick's action", never "crash the control loop".

use kartling_core::{ActionLabel, ControlSignal, PerceptionSnapshot};

use crate::{
    classifier::{ActionClassifier, BoxedActionClassifier, ModelShapeError},
    encoder::{EncodeError, FeatureEncoder},
};

/// One agent's encoder + classifier pair.
///
/// Immutable after construction; `Send + Sync`, so agents in a multi-kart deployment
/// can share one or own one each with no locking.
#[derive(Debug)]
pub struct DrivePipeline {
    encoder: FeatureEncoder,
    classifier: BoxedActionClassifier,
}

impl DrivePipeline {
    /// Attaches a classifier to an encoder, validating shape compatibility.
    pub fn new(
        encoder: FeatureEncoder,
        classifier: BoxedActionClassifier,
    ) -> Result<Self, ModelShapeError> {
        classifier.check_input_width(encoder.feature_len())?;
        tracing::debug!(
            feature_len = encoder.feature_len(),
            ray_count = encoder.ray_count(),
            "attached classifier to feature encoder",
        );
        Ok(Self {
            encoder,
            classifier,
        })
    }

    #[must_use]
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Predicts the action label for one snapshot.
    pub fn predict_label(&self, snapshot: &PerceptionSnapshot) -> Result<ActionLabel, EncodeError> {
        let features = self.encoder.encode(snapshot)?;
        Ok(self.classifier.predict_label(&features))
    }

    /// Runs a full tick: snapshot in, control signal out.
    pub fn decide(&self, snapshot: &PerceptionSnapshot) -> Result<ControlSignal, EncodeError> {
        Ok(self.predict_label(snapshot)?.to_signal())
    }
}

#[cfg(test)]
mod tests {
    use kartling_core::{PerceptionSample, Position};

    use crate::{
        mlp::{LayerParams, Matrix, MlpModel, MlpParameters},
        scaler::ScalerParams,
        tree::{DecisionTree, DecisionTreeStructure, LEAF},
    };

    use super::*;

    fn encoder(ray_count: usize) -> FeatureEncoder {
        let len = ray_count + 3;
        FeatureEncoder::new(
            ray_count,
            ScalerParams {
                mean: vec![0.0; len],
                std: vec![1.0; len],
            },
        )
        .unwrap()
    }

    fn snapshot(ray_count: usize) -> PerceptionSnapshot {
        PerceptionSnapshot::new(
            vec![PerceptionSample::hit(1.0); ray_count],
            Position::new(0.0, 0.0, 0.0),
            0.0,
        )
    }

    /// 2-layer MLP over 5 features whose output neuron 0 always dominates.
    fn accelerate_mlp() -> MlpModel {
        let hidden = LayerParams {
            weights: Matrix::zeros(5, 4),
            bias: vec![0.0; 4],
        };
        let output = LayerParams {
            weights: Matrix::zeros(4, 3),
            bias: vec![4.0, -4.0, -4.0],
        };
        MlpModel::new(MlpParameters::from_layers(vec![hidden, output]).unwrap())
    }

    #[test]
    fn test_end_to_end_mlp_tick() {
        let pipeline = DrivePipeline::new(encoder(2), Box::new(accelerate_mlp())).unwrap();
        let signal = pipeline.decide(&snapshot(2)).unwrap();
        assert!(signal.accelerate);
        assert!(!signal.brake);
        assert_eq!(signal.turn, 0.0);
    }

    #[test]
    fn test_end_to_end_tree_tick() {
        // Split on the timestamp slot (index 4 after the y drop, 2 rays + x + z).
        let tree = DecisionTree::new(DecisionTreeStructure {
            n_nodes: 3,
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![4, -2, -2],
            threshold: vec![0.0, 0.0, 0.0],
            values: vec![
                vec![vec![0.0, 0.0, 0.0]],
                vec![vec![9.0, 0.0, 0.0]],
                vec![vec![0.0, 9.0, 0.0]],
            ],
        })
        .unwrap();
        let pipeline = DrivePipeline::new(encoder(2), Box::new(tree)).unwrap();

        let mut snap = snapshot(2);
        assert_eq!(
            pipeline.predict_label(&snap).unwrap(),
            ActionLabel::Accelerate,
        );
        snap.timestamp = 5.0;
        assert_eq!(
            pipeline.predict_label(&snap).unwrap(),
            ActionLabel::LeftAccelerate,
        );
    }

    #[test]
    fn test_attach_rejects_width_mismatch() {
        // 3 rays encode to 6 features; the MLP expects 5.
        let err = DrivePipeline::new(encoder(3), Box::new(accelerate_mlp())).unwrap_err();
        assert!(matches!(
            err,
            ModelShapeError::InputWidth {
                model: 5,
                features: 6,
            }
        ));
    }

    #[test]
    fn test_bad_tick_is_skippable_not_fatal() {
        let pipeline = DrivePipeline::new(encoder(2), Box::new(accelerate_mlp())).unwrap();
        let err = pipeline.decide(&snapshot(3)).unwrap_err();
        assert!(matches!(err, EncodeError::RayCount { expected: 2, got: 3 }));
        // The pipeline is still usable for the next tick.
        assert!(pipeline.decide(&snapshot(2)).is_ok());
    }
}
