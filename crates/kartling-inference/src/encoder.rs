//! Feature encoding: raw sensor readings → normalized classifier input.
//!
//! The encoding contract, in order:
//!
//! 1. Assemble the raw observation `[ranges.., x, y, z, timestamp]` (layout owned by
//!    [`kartling_core::perception`]).
//! 2. Drop the structurally redundant `pos.y` slot at index `ray_count + 1`.
//! 3. Replace every retained element `v[i]` with `(v[i] - mean[i]) / std[i]`.
//!
//! The trained models are fitted against exactly this order; there is no way to detect
//! a reordering at runtime, which is why the layout arithmetic is centralized rather
//! than repeated here. What *can* be validated is shape: the encoder refuses to be
//! built with a scaler whose length disagrees with its output width, and it refuses
//! any snapshot whose ray count disagrees with its configuration.

use kartling_core::{PerceptionSnapshot, perception};

use crate::scaler::{ScalerError, ScalerParams};

/// Why an encoder could not be constructed.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EncoderConfigError {
    #[display("{_0}")]
    Scaler(ScalerError),
    #[display("scaler covers {scaler_len} features but {ray_count} rays encode to {feature_len}")]
    ScalerWidth {
        scaler_len: usize,
        ray_count: usize,
        feature_len: usize,
    },
}

impl From<ScalerError> for EncoderConfigError {
    fn from(err: ScalerError) -> Self {
        EncoderConfigError::Scaler(err)
    }
}

/// Why a single tick's snapshot could not be encoded.
///
/// These are per-tick failures: the caller should skip the tick's action and keep the
/// control loop alive.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EncodeError {
    #[display("snapshot has {got} rays but the encoder is configured for {expected}")]
    RayCount { expected: usize, got: usize },
    #[display("feature vector has {got} entries but the scaler covers {expected}")]
    FeatureWidth { expected: usize, got: usize },
    #[display("feature {index} is not finite after normalization ({value})")]
    NonFinite { index: usize, value: f32 },
}

/// Z-score feature encoder for a fixed ray count.
///
/// Immutable after construction; shareable across agents.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    ray_count: usize,
    scaler: ScalerParams,
}

impl FeatureEncoder {
    /// Builds an encoder for `ray_count` rays, validating the scaler against the
    /// post-drop feature width.
    pub fn new(ray_count: usize, scaler: ScalerParams) -> Result<Self, EncoderConfigError> {
        scaler.validate()?;
        let feature_len = perception::encoded_len(ray_count);
        if scaler.len() != feature_len {
            return Err(EncoderConfigError::ScalerWidth {
                scaler_len: scaler.len(),
                ray_count,
                feature_len,
            });
        }
        Ok(Self { ray_count, scaler })
    }

    /// Number of features produced per snapshot.
    #[must_use]
    pub fn feature_len(&self) -> usize {
        perception::encoded_len(self.ray_count)
    }

    #[must_use]
    pub fn ray_count(&self) -> usize {
        self.ray_count
    }

    /// Encodes one snapshot into a normalized feature vector.
    pub fn encode(&self, snapshot: &PerceptionSnapshot) -> Result<Vec<f32>, EncodeError> {
        if snapshot.ray_count() != self.ray_count {
            return Err(EncodeError::RayCount {
                expected: self.ray_count,
                got: snapshot.ray_count(),
            });
        }

        let mut features = snapshot.raw_observation();
        features.remove(perception::position_y_index(self.ray_count));
        self.normalize(&mut features)?;
        Ok(features)
    }

    /// Normalizes an already-assembled post-drop vector in place.
    ///
    /// Used directly when replaying recorded observations, which are stored raw.
    pub fn normalize(&self, features: &mut [f32]) -> Result<(), EncodeError> {
        if features.len() != self.scaler.len() {
            return Err(EncodeError::FeatureWidth {
                expected: self.scaler.len(),
                got: features.len(),
            });
        }
        for (index, value) in features.iter_mut().enumerate() {
            *value = (*value - self.scaler.mean[index]) / self.scaler.std[index];
            if !value.is_finite() {
                return Err(EncodeError::NonFinite {
                    index,
                    value: *value,
                });
            }
        }
        Ok(())
    }
}
