//! Multi-layer perceptron: shape-validated parameters and forward propagation.
//!
//! An N-layer network is stored as N-1 layer transitions, each a weight matrix of
//! shape (inputs × outputs) plus a bias vector of length outputs. Parameters come out
//! of the weight-file parser as optionally-populated slots ([`WeightFile`]); turning
//! them into [`MlpParameters`] is where every structural invariant is enforced:
//!
//! - every coefficient and intercept slot populated,
//! - bias length equals weight-matrix column count per layer,
//! - chained shape consistency (layer *i*'s input rows equal layer *i-1*'s outputs).
//!
//! Once constructed, the parameter set is immutable and [`MlpModel`] is a pure
//! function over it.
//!
//! # Numerics
//!
//! The sigmoid is the plain `1 / (1 + e^-x)` with no stability clamp, matching the
//! function the weights were trained against. For large `|x|` it saturates to exactly
//! 0.0 or 1.0 in `f32`; argmax over saturated outputs still picks the first maximal
//! index, so this is a documented precision edge case rather than a correctness bug.

use kartling_core::ActionLabel;

use crate::{
    classifier::{ActionClassifier, ModelShapeError, argmax, decode_class_index},
    weight_format::{WeightFile, WeightFormatError},
};

/// Dense row-major matrix of `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix from row-major data.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    #[must_use]
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), rows * cols, "row-major data length mismatch");
        Self { rows, cols, data }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }

    /// Row-major backing slice.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// One layer transition: weights (inputs × outputs) and bias (outputs).
#[derive(Debug, Clone, PartialEq)]
pub struct LayerParams {
    pub weights: Matrix,
    pub bias: Vec<f32>,
}

/// Validated, immutable MLP parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpParameters {
    layers: Vec<LayerParams>,
}

impl MlpParameters {
    /// Assembles a parameter set from explicit layers, enforcing shape invariants.
    pub fn from_layers(layers: Vec<LayerParams>) -> Result<Self, ModelShapeError> {
        for (index, layer) in layers.iter().enumerate() {
            if layer.bias.len() != layer.weights.cols() {
                return Err(ModelShapeError::BiasWidth {
                    index,
                    cols: layer.weights.cols(),
                    bias_len: layer.bias.len(),
                });
            }
            if index > 0 {
                let prev = layers[index - 1].bias.len();
                if layer.weights.rows() != prev {
                    return Err(ModelShapeError::BrokenChain {
                        index,
                        rows: layer.weights.rows(),
                        prev,
                    });
                }
            }
        }
        Ok(Self { layers })
    }

    /// Assembles a parameter set from a parsed weight file.
    ///
    /// The parser leaves unreferenced slots empty; consuming a partially-populated
    /// file is a load error here, not a runtime surprise later.
    pub fn from_weight_file(file: WeightFile) -> Result<Self, ModelShapeError> {
        let WeightFile {
            coefficients,
            intercepts,
            ..
        } = file;

        let mut layers = Vec::with_capacity(coefficients.len());
        for (index, (weights, bias)) in coefficients.into_iter().zip(intercepts).enumerate() {
            let weights = weights.ok_or(ModelShapeError::MissingSlot {
                kind: "coefficient",
                index,
            })?;
            let bias = bias.ok_or(ModelShapeError::MissingSlot {
                kind: "intercept",
                index,
            })?;
            layers.push(LayerParams { weights, bias });
        }
        Self::from_layers(layers)
    }

    /// Total layer count including the input layer (transitions + 1).
    #[must_use]
    pub fn num_layers(&self) -> usize {
        self.layers.len() + 1
    }

    /// Width of the input layer.
    #[must_use]
    pub fn input_len(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.weights.rows())
    }

    /// Width of the output layer.
    #[must_use]
    pub fn output_len(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.bias.len())
    }

    #[must_use]
    pub fn layers(&self) -> &[LayerParams] {
        &self.layers
    }
}

/// Why an MLP could not be loaded from weight-file text.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum MlpLoadError {
    #[display("{_0}")]
    Format(WeightFormatError),
    #[display("{_0}")]
    Shape(ModelShapeError),
}

impl From<WeightFormatError> for MlpLoadError {
    fn from(err: WeightFormatError) -> Self {
        MlpLoadError::Format(err)
    }
}

impl From<ModelShapeError> for MlpLoadError {
    fn from(err: ModelShapeError) -> Self {
        MlpLoadError::Shape(err)
    }
}

/// Forward-propagating MLP classifier.
#[derive(Debug, Clone)]
pub struct MlpModel {
    params: MlpParameters,
}

impl MlpModel {
    #[must_use]
    pub fn new(params: MlpParameters) -> Self {
        Self { params }
    }

    /// Parses, validates, and wraps weight-file text in one step.
    pub fn from_weight_text(text: &str) -> Result<Self, MlpLoadError> {
        let file = crate::weight_format::parse(text)?;
        let params = MlpParameters::from_weight_file(file)?;
        tracing::debug!(
            num_layers = params.num_layers(),
            input_len = params.input_len(),
            output_len = params.output_len(),
            "loaded MLP parameters",
        );
        Ok(Self::new(params))
    }

    #[must_use]
    pub fn params(&self) -> &MlpParameters {
        &self.params
    }

    /// Propagates an input vector through every layer.
    ///
    /// `input.len()` must equal [`MlpParameters::input_len`]; the pipeline guarantees
    /// this by checking at attach time.
    #[must_use]
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut output = input.to_vec();
        for layer in self.params.layers() {
            output = propagate_layer(&output, &layer.weights, &layer.bias);
        }
        output
    }

    /// Argmax decode of a forward-propagation output, ties to the lowest index.
    #[must_use]
    pub fn predict(&self, output: &[f32]) -> ActionLabel {
        decode_class_index(argmax(output))
    }
}

impl ActionClassifier for MlpModel {
    fn check_input_width(&self, feature_len: usize) -> Result<(), ModelShapeError> {
        if self.params.input_len() != feature_len {
            return Err(ModelShapeError::InputWidth {
                model: self.params.input_len(),
                features: feature_len,
            });
        }
        Ok(())
    }

    fn predict_label(&self, features: &[f32]) -> ActionLabel {
        self.predict(&self.forward(features))
    }
}

fn propagate_layer(input: &[f32], weights: &Matrix, bias: &[f32]) -> Vec<f32> {
    let mut output = Vec::with_capacity(bias.len());
    for neuron in 0..bias.len() {
        let mut sum = bias[neuron];
        for (j, &x) in input.iter().enumerate() {
            sum += x * weights.get(j, neuron);
        }
        output.push(sigmoid(sum));
    }
    output
}

// No stability clamp: saturates in f32 for |x| beyond ~88.
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_layer(len: usize, scale: f32) -> LayerParams {
        let mut weights = Matrix::zeros(len, len);
        for i in 0..len {
            weights.set(i, i, scale);
        }
        LayerParams {
            weights,
            bias: vec![0.0; len],
        }
    }

    #[test]
    fn test_single_layer_is_elementwise_sigmoid() {
        let params = MlpParameters::from_layers(vec![identity_layer(3, 1.0)]).unwrap();
        let model = MlpModel::new(params);

        let input = [0.0, 2.0, -3.5];
        let output = model.forward(&input);
        for (o, x) in output.iter().zip(input.iter()) {
            assert_eq!(*o, sigmoid(*x), "identity layer must apply sigmoid only");
        }
    }

    #[test]
    fn test_dominant_neuron_wins_regardless_of_input() {
        // Two layers, 3 classes; output neuron 2 gets a large positive bias while the
        // others are pushed negative, so its pre-activation is always largest.
        let hidden = identity_layer(3, 1.0);
        let output = LayerParams {
            weights: Matrix::zeros(3, 3),
            bias: vec![-5.0, -5.0, 5.0],
        };
        let params = MlpParameters::from_layers(vec![hidden, output]).unwrap();
        let model = MlpModel::new(params);

        for input in [[0.0, 0.0, 0.0], [1.0, -1.0, 0.5], [-9.0, 3.0, 2.0]] {
            assert_eq!(
                model.predict_label(&input),
                kartling_core::ActionLabel::RightAccelerate,
                "neuron 2 must dominate for input {input:?}",
            );
        }
    }

    #[test]
    fn test_argmax_tie_goes_to_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.1, 0.9, 0.9]), 1);
    }

    #[test]
    fn test_out_of_range_class_decodes_to_none() {
        let params = MlpParameters::from_layers(vec![LayerParams {
            weights: Matrix::zeros(2, 5),
            bias: vec![-1.0, -1.0, -1.0, -1.0, 1.0],
        }])
        .unwrap();
        let model = MlpModel::new(params);
        assert_eq!(
            model.predict_label(&[0.0, 0.0]),
            kartling_core::ActionLabel::None,
            "class 4 is outside the trained taxonomy",
        );
    }

    #[test]
    fn test_broken_chain_rejected() {
        let layers = vec![identity_layer(3, 1.0), identity_layer(4, 1.0)];
        let err = MlpParameters::from_layers(layers).unwrap_err();
        assert!(matches!(
            err,
            ModelShapeError::BrokenChain {
                index: 1,
                rows: 4,
                prev: 3,
            }
        ));
    }

    #[test]
    fn test_bias_width_rejected() {
        let layers = vec![LayerParams {
            weights: Matrix::zeros(2, 3),
            bias: vec![0.0; 2],
        }];
        let err = MlpParameters::from_layers(layers).unwrap_err();
        assert!(matches!(err, ModelShapeError::BiasWidth { index: 0, .. }));
    }

    #[test]
    fn test_attach_width_check() {
        let model = MlpModel::new(
            MlpParameters::from_layers(vec![identity_layer(3, 1.0)]).unwrap(),
        );
        assert!(model.check_input_width(3).is_ok());
        assert!(matches!(
            model.check_input_width(7),
            Err(ModelShapeError::InputWidth {
                model: 3,
                features: 7,
            })
        ));
    }

    #[test]
    fn test_sigmoid_saturates_without_panic() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
    }
}
