//! Reading recorded CSV datasets back.
//!
//! The read side of the recorder's CSV format, used to replay recorded observations
//! through a classifier offline (model evaluation, regression checks after
//! retraining). Parsing is strict: the header tail must be `time,action`, every row
//! must have the header's field count, and every numeric field must parse as a float.

use std::str::FromStr as _;

use kartling_core::{ActionLabel, PerceptionSample, PerceptionSnapshot, Position, perception};

/// Why a dataset CSV was rejected.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DatasetFormatError {
    #[display("dataset has no header row")]
    Empty,
    #[display("header has {got} columns; need rays plus kartx,karty,kartz,time,action")]
    HeaderTooShort { got: usize },
    #[display("header must end with 'time,action', got '{tail}'")]
    HeaderTail { tail: String },
    #[display("row {row}: expected {expected} fields, got {got}")]
    FieldCount {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[display("row {row}, column '{column}': invalid float '{token}'")]
    InvalidFloat {
        row: usize,
        column: String,
        token: String,
    },
    #[display("row {row}: unknown action label '{token}'")]
    InvalidLabel { row: usize, token: String },
}

/// One recorded (observation, action) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    /// Raw observation including the trailing timestamp; length `ray_count + 4`.
    pub observation: Vec<f32>,
    pub label: ActionLabel,
}

impl DatasetRow {
    #[must_use]
    pub fn timestamp(&self) -> f32 {
        *self.observation.last().unwrap_or(&0.0)
    }

    /// Number of ray readings in this row's observation.
    #[must_use]
    pub fn ray_count(&self) -> usize {
        self.observation.len().saturating_sub(4)
    }

    /// Reconstructs the perception snapshot this row was captured from.
    ///
    /// The ray count is derived from the observation length, so a row parsed from any
    /// valid dataset reconstructs without a caller-supplied count. A recorded range
    /// equal to the undetected sentinel comes back as a miss; any non-negative range
    /// as a hit.
    ///
    /// # Panics
    ///
    /// Panics on a hand-built row whose observation is shorter than the position and
    /// timestamp tail; parsed datasets always satisfy this.
    #[must_use]
    pub fn to_snapshot(&self) -> PerceptionSnapshot {
        let ray_count = self.ray_count();
        let rays = self.observation[..ray_count]
            .iter()
            .map(|&range| PerceptionSample {
                detected: range >= 0.0,
                distance: range,
            })
            .collect();
        let position = Position::new(
            self.observation[ray_count],
            self.observation[ray_count + 1],
            self.observation[ray_count + 2],
        );
        PerceptionSnapshot::new(rays, position, self.timestamp())
    }
}

/// A parsed recorded dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    ray_count: usize,
    rows: Vec<DatasetRow>,
}

impl Dataset {
    /// Parses a recorded CSV document.
    pub fn from_csv(text: &str) -> Result<Self, DatasetFormatError> {
        let mut lines = text.lines();
        let header = lines.next().ok_or(DatasetFormatError::Empty)?;
        let columns: Vec<String> = header.split(',').map(str::to_owned).collect();

        // rays + kartx/karty/kartz + time + action
        if columns.len() < 6 {
            return Err(DatasetFormatError::HeaderTooShort {
                got: columns.len(),
            });
        }
        let tail = &columns[columns.len() - 2..];
        if tail != ["time", "action"] {
            return Err(DatasetFormatError::HeaderTail {
                tail: tail.join(","),
            });
        }
        let ray_count = columns.len() - 5;

        let mut rows = Vec::new();
        for (index, line) in lines.enumerate() {
            let row = index + 1;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != columns.len() {
                return Err(DatasetFormatError::FieldCount {
                    row,
                    expected: columns.len(),
                    got: fields.len(),
                });
            }

            let (label_field, value_fields) =
                fields.split_last().unwrap_or((&"", &[]));
            let observation = value_fields
                .iter()
                .enumerate()
                .map(|(i, token)| {
                    token
                        .trim()
                        .parse::<f32>()
                        .map_err(|_| DatasetFormatError::InvalidFloat {
                            row,
                            column: columns[i].clone(),
                            token: (*token).to_owned(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let label = ActionLabel::from_str(label_field.trim()).map_err(|err| {
                DatasetFormatError::InvalidLabel {
                    row,
                    token: err.name,
                }
            })?;
            rows.push(DatasetRow { observation, label });
        }

        Ok(Self {
            columns,
            ray_count,
            rows,
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn ray_count(&self) -> usize {
        self.ray_count
    }

    /// Raw observation length per row, timestamp included.
    #[must_use]
    pub fn observation_len(&self) -> usize {
        perception::raw_observation_len(self.ray_count)
    }

    #[must_use]
    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use kartling_core::ControlSignal;

    use crate::recorder::DatasetRecorder;

    use super::*;

    const CSV: &str = "\
r0,r1,kartx,karty,kartz,time,action
1.5,-1,4,0.5,-2,0.25,ACCELERATE
-1,3,4.1,0.5,-2.2,0.75,RIGHT_ACCELERATE
";

    #[test]
    fn test_parse_and_layout() {
        let dataset = Dataset::from_csv(CSV).unwrap();
        assert_eq!(dataset.ray_count(), 2);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.observation_len(), 6);

        let row = &dataset.rows()[0];
        assert_eq!(row.observation, vec![1.5, -1.0, 4.0, 0.5, -2.0, 0.25]);
        assert_eq!(row.label, ActionLabel::Accelerate);
        assert_eq!(row.timestamp(), 0.25);
    }

    #[test]
    fn test_snapshot_reconstruction() {
        let dataset = Dataset::from_csv(CSV).unwrap();
        let row = &dataset.rows()[1];
        assert_eq!(
            row.ray_count(),
            dataset.ray_count(),
            "per-row ray count must agree with the header",
        );
        let snap = row.to_snapshot();

        assert_eq!(snap.ray_count(), 2);
        assert!(!snap.rays[0].detected, "sentinel range must read as a miss");
        assert_eq!(snap.rays[1], PerceptionSample::hit(3.0));
        assert_eq!(snap.position, Position::new(4.1, 0.5, -2.2));
        assert_eq!(snap.timestamp, 0.75);
        // The reconstructed snapshot reproduces the recorded observation.
        assert_eq!(snap.raw_observation(), dataset.rows()[1].observation);
    }

    #[test]
    fn test_recorder_round_trip() {
        let mut recorder = DatasetRecorder::new(&["r0", "r1"]);
        let snap = PerceptionSnapshot::new(
            vec![PerceptionSample::hit(1.5), PerceptionSample::miss()],
            Position::new(4.0, 0.5, -2.0),
            0.25,
        );
        recorder
            .record(
                &snap,
                ControlSignal {
                    accelerate: true,
                    brake: false,
                    turn: 0.0,
                },
            )
            .unwrap();

        let dataset = Dataset::from_csv(&recorder.to_csv()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows()[0].label, ActionLabel::Accelerate);
        assert_eq!(
            dataset.rows()[0].to_snapshot().raw_observation(),
            snap.raw_observation(),
        );
    }

    #[test]
    fn test_bad_header_tail_rejected() {
        let err = Dataset::from_csv("a,b,c,d,e,f\n").unwrap_err();
        assert!(matches!(err, DatasetFormatError::HeaderTail { .. }));
    }

    #[test]
    fn test_field_count_mismatch_rejected() {
        let csv = "r0,r1,kartx,karty,kartz,time,action\n1,2,3\n";
        let err = Dataset::from_csv(csv).unwrap_err();
        assert!(matches!(
            err,
            DatasetFormatError::FieldCount {
                row: 1,
                expected: 7,
                got: 3,
            }
        ));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let csv = "r0,r1,kartx,karty,kartz,time,action\n1,2,3,4,5,6,WIGGLE\n";
        let err = Dataset::from_csv(csv).unwrap_err();
        assert!(matches!(err, DatasetFormatError::InvalidLabel { row: 1, .. }));
    }
}
