//! The line-oriented MLP weight-file wire format.
//!
//! This is a stable wire format produced by the offline training exporter; the object
//! model is intentionally flat arrays, not nested JSON. A file looks like:
//!
//! ```text
//! num_layers:3
//! parameter:0
//! dims:[11, 8]
//! name:coefficient_0
//! values:[0.25, -1.5, ...]
//! parameter:0
//! dims:[8]
//! name:intercepts_0
//! values:[0.0, ...]
//! ...
//! ```
//!
//! Rules:
//!
//! - `num_layers:<N>` must appear before any other key, with `N > 0`. An N-layer
//!   network gets N-1 coefficient slots and N-1 intercept slots, indexed `0..N-2`.
//! - `parameter:<idx>` selects the slot the following `dims`/`name`/`values` lines
//!   populate.
//! - A `name` starting with `coefficient` routes the next `values` into the slot's
//!   weight matrix, row-major over the declared `dims:[rows, cols]`; any other name
//!   routes into the bias vector (`dims:[len]`).
//! - List payloads are bracket-delimited and comma-separated; `dims` entries may be
//!   single-quoted. Blank lines are skipped; unknown keys are ignored.
//!
//! The parser is strict about everything else and fails with a line-numbered
//! [`WeightFormatError`]. It does *not* check that every slot ends up populated -
//! that is a property of the whole file, enforced when
//! [`MlpParameters::from_weight_file`](crate::mlp::MlpParameters::from_weight_file)
//! consumes the result.
//!
//! [`serialize`] is the inverse, used only to build test fixtures; it round-trips
//! exactly because `f32` `Display` output re-parses to the same bits.

use std::fmt::Write as _;

use crate::mlp::{Matrix, MlpParameters};

/// A parsed weight file: slots are `None` until a block populates them.
#[derive(Debug, Clone)]
pub struct WeightFile {
    pub num_layers: usize,
    pub coefficients: Vec<Option<Matrix>>,
    pub intercepts: Vec<Option<Vec<f32>>>,
}

impl WeightFile {
    fn with_layers(num_layers: usize) -> Self {
        let slots = num_layers - 1;
        Self {
            num_layers,
            coefficients: vec![None; slots],
            intercepts: vec![None; slots],
        }
    }

    /// Number of coefficient (equivalently intercept) slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.coefficients.len()
    }
}

/// Line-numbered reasons a weight file is malformed.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum WeightFormatError {
    #[display("weight file has no num_layers header")]
    MissingHeader,
    #[display("line {line}: expected num_layers before '{key}'")]
    HeaderNotFirst { line: usize, key: String },
    #[display("line {line}: num_layers must be a positive integer, got '{value}'")]
    InvalidLayerCount { line: usize, value: String },
    #[display("line {line}: expected '<key>:<value>'")]
    MissingSeparator { line: usize },
    #[display("line {line}: expected a bracket-delimited list")]
    UnbracketedList { line: usize },
    #[display("line {line}: invalid integer '{token}'")]
    InvalidInteger { line: usize, token: String },
    #[display("line {line}: invalid float '{token}'")]
    InvalidFloat { line: usize, token: String },
    #[display("line {line}: parameter index {slot} out of range ({slots} slots)")]
    SlotOutOfRange {
        line: usize,
        slot: usize,
        slots: usize,
    },
    #[display("line {line}: '{key}' before any parameter index")]
    MissingParameterIndex { line: usize, key: String },
    #[display("line {line}: name before dims")]
    MissingDims { line: usize },
    #[display("line {line}: expected {expected} dims entries, got {got}")]
    DimsArity {
        line: usize,
        expected: usize,
        got: usize,
    },
    #[display("line {line}: values before a name declared the target")]
    MissingName { line: usize },
    #[display("line {line}: expected {expected} values, got {got}")]
    ValueCount {
        line: usize,
        expected: usize,
        got: usize,
    },
}

#[derive(Debug, Clone, Copy)]
enum ValueTarget {
    Coefficient(usize),
    Intercept(usize),
}

/// Parses weight-file text into populated slots.
pub fn parse(text: &str) -> Result<WeightFile, WeightFormatError> {
    let mut file: Option<WeightFile> = None;
    let mut current_slot: Option<usize> = None;
    let mut current_dims: Option<Vec<usize>> = None;
    let mut target: Option<ValueTarget> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw_line.trim();
        if content.is_empty() {
            continue;
        }

        let (key, value) = content
            .split_once(':')
            .ok_or(WeightFormatError::MissingSeparator { line })?;
        let (key, value) = (key.trim(), value.trim());

        if key == "num_layers" {
            let count: i64 = value
                .parse()
                .map_err(|_| WeightFormatError::InvalidLayerCount {
                    line,
                    value: value.to_owned(),
                })?;
            if count <= 0 {
                return Err(WeightFormatError::InvalidLayerCount {
                    line,
                    value: value.to_owned(),
                });
            }
            let count = usize::try_from(count).map_err(|_| {
                WeightFormatError::InvalidLayerCount {
                    line,
                    value: value.to_owned(),
                }
            })?;
            file = Some(WeightFile::with_layers(count));
            continue;
        }

        let Some(file) = file.as_mut() else {
            return Err(WeightFormatError::HeaderNotFirst {
                line,
                key: key.to_owned(),
            });
        };

        match key {
            "parameter" => {
                let slot = parse_int(value, line)?;
                if slot >= file.slot_count() {
                    return Err(WeightFormatError::SlotOutOfRange {
                        line,
                        slot,
                        slots: file.slot_count(),
                    });
                }
                current_slot = Some(slot);
                current_dims = None;
                target = None;
            }
            "dims" => {
                let list = strip_brackets(value, line)?;
                let dims = list
                    .split(',')
                    .map(|token| parse_int(strip_quotes(token.trim()), line))
                    .collect::<Result<Vec<_>, _>>()?;
                current_dims = Some(dims);
            }
            "name" => {
                let slot = current_slot.ok_or_else(|| {
                    WeightFormatError::MissingParameterIndex {
                        line,
                        key: key.to_owned(),
                    }
                })?;
                let dims = current_dims
                    .as_deref()
                    .ok_or(WeightFormatError::MissingDims { line })?;
                if value.starts_with("coefficient") {
                    let &[rows, cols] = dims else {
                        return Err(WeightFormatError::DimsArity {
                            line,
                            expected: 2,
                            got: dims.len(),
                        });
                    };
                    file.coefficients[slot] = Some(Matrix::zeros(rows, cols));
                    target = Some(ValueTarget::Coefficient(slot));
                } else {
                    let &[len] = dims else {
                        return Err(WeightFormatError::DimsArity {
                            line,
                            expected: 1,
                            got: dims.len(),
                        });
                    };
                    file.intercepts[slot] = Some(vec![0.0; len]);
                    target = Some(ValueTarget::Intercept(slot));
                }
            }
            "values" => {
                let list = strip_brackets(value, line)?;
                let values = list
                    .split(',')
                    .map(|token| {
                        let token = token.trim();
                        token
                            .parse::<f32>()
                            .map_err(|_| WeightFormatError::InvalidFloat {
                                line,
                                token: token.to_owned(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                match target.ok_or(WeightFormatError::MissingName { line })? {
                    ValueTarget::Coefficient(slot) => {
                        let matrix = file.coefficients[slot]
                            .as_mut()
                            .ok_or(WeightFormatError::MissingName { line })?;
                        let expected = matrix.rows() * matrix.cols();
                        if values.len() != expected {
                            return Err(WeightFormatError::ValueCount {
                                line,
                                expected,
                                got: values.len(),
                            });
                        }
                        let cols = matrix.cols();
                        for (i, v) in values.into_iter().enumerate() {
                            matrix.set(i / cols, i % cols, v);
                        }
                    }
                    ValueTarget::Intercept(slot) => {
                        let bias = file.intercepts[slot]
                            .as_mut()
                            .ok_or(WeightFormatError::MissingName { line })?;
                        if values.len() != bias.len() {
                            return Err(WeightFormatError::ValueCount {
                                line,
                                expected: bias.len(),
                                got: values.len(),
                            });
                        }
                        bias.copy_from_slice(&values);
                    }
                }
            }
            // Unknown keys are ignored, matching the exporter's freedom to add
            // metadata lines.
            _ => {}
        }
    }

    file.ok_or(WeightFormatError::MissingHeader)
}

/// Serializes a validated parameter set back into the wire format.
///
/// Exists for building test fixtures; production weight files come from the offline
/// trainer.
#[must_use]
pub fn serialize(params: &MlpParameters) -> String {
    let mut out = String::new();
    writeln!(out, "num_layers:{}", params.num_layers()).unwrap();
    for (slot, layer) in params.layers().iter().enumerate() {
        writeln!(out, "parameter:{slot}").unwrap();
        writeln!(out, "dims:[{}, {}]", layer.weights.rows(), layer.weights.cols()).unwrap();
        writeln!(out, "name:coefficient_{slot}").unwrap();
        writeln!(out, "values:[{}]", join_floats(layer.weights.data())).unwrap();
        writeln!(out, "parameter:{slot}").unwrap();
        writeln!(out, "dims:[{}]", layer.bias.len()).unwrap();
        writeln!(out, "name:intercepts_{slot}").unwrap();
        writeln!(out, "values:[{}]", join_floats(&layer.bias)).unwrap();
    }
    out
}

fn join_floats(values: &[f32]) -> String {
    let mut out = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write!(out, "{v}").unwrap();
    }
    out
}

fn parse_int(token: &str, line: usize) -> Result<usize, WeightFormatError> {
    token
        .parse()
        .map_err(|_| WeightFormatError::InvalidInteger {
            line,
            token: token.to_owned(),
        })
}

fn strip_brackets(value: &str, line: usize) -> Result<&str, WeightFormatError> {
    value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or(WeightFormatError::UnbracketedList { line })
}

fn strip_quotes(token: &str) -> &str {
    token
        .strip_prefix('\'')
        .map_or(token, |rest| rest.strip_suffix('\'').unwrap_or(rest))
}
