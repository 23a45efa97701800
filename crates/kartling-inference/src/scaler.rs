//! Per-feature z-score normalization parameters.
//!
//! Produced offline by the training pipeline (sklearn's `StandardScaler`, exported as
//! JSON with `mean` and `std` arrays) and consumed by the feature encoder. Validation
//! happens here, at load time: a zero std entry would turn normalization into a
//! division by zero and quietly poison every downstream decision, so it is rejected
//! before a model can be attached.

use serde::{Deserialize, Serialize};

/// Mean and standard deviation for each retained (post-drop) feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

/// Why a scaler params file was rejected.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ScalerError {
    #[display("invalid scaler JSON: {_0}")]
    Json(serde_json::Error),
    #[display("scaler mean has {mean_len} entries but std has {std_len}")]
    LengthMismatch { mean_len: usize, std_len: usize },
    #[display("scaler std[{index}] is {value}; z-score normalization needs finite non-zero std")]
    DegenerateStd { index: usize, value: f32 },
    #[display("scaler mean[{index}] is {value}; must be finite")]
    NonFiniteMean { index: usize, value: f32 },
}

impl From<serde_json::Error> for ScalerError {
    fn from(err: serde_json::Error) -> Self {
        ScalerError::Json(err)
    }
}

impl ScalerParams {
    /// Parses and validates a scaler params JSON document.
    pub fn from_json(text: &str) -> Result<Self, ScalerError> {
        let params: ScalerParams = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// Checks the invariants every consumer relies on: equal lengths, finite means,
    /// finite non-zero stds.
    pub fn validate(&self) -> Result<(), ScalerError> {
        if self.mean.len() != self.std.len() {
            return Err(ScalerError::LengthMismatch {
                mean_len: self.mean.len(),
                std_len: self.std.len(),
            });
        }
        for (index, &value) in self.mean.iter().enumerate() {
            if !value.is_finite() {
                return Err(ScalerError::NonFiniteMean { index, value });
            }
        }
        for (index, &value) in self.std.iter().enumerate() {
            if !value.is_finite() || value == 0.0 {
                return Err(ScalerError::DegenerateStd { index, value });
            }
        }
        Ok(())
    }

    /// Number of features this scaler covers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_scaler_loads() {
        let params =
            ScalerParams::from_json(r#"{"mean": [0.5, -1.0, 3.0], "std": [1.0, 2.0, 0.5]}"#)
                .unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params.mean[1], -1.0);
    }

    #[test]
    fn test_zero_std_rejected() {
        let err = ScalerParams::from_json(r#"{"mean": [0.0, 0.0], "std": [1.0, 0.0]}"#)
            .unwrap_err();
        assert!(
            matches!(err, ScalerError::DegenerateStd { index: 1, .. }),
            "expected DegenerateStd, got {err}",
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err =
            ScalerParams::from_json(r#"{"mean": [0.0], "std": [1.0, 1.0]}"#).unwrap_err();
        assert!(matches!(err, ScalerError::LengthMismatch { .. }));
    }

    #[test]
    fn test_missing_field_is_json_error() {
        let err = ScalerParams::from_json(r#"{"mean": [0.0]}"#).unwrap_err();
        assert!(matches!(err, ScalerError::Json(_)));
    }
}
