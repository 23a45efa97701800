//! Snapshot capture and CSV serialization.
//!
//! The recorder is fed by the engine loop (an external collaborator): once per frame
//! the caller advances a [`SnapshotTimer`] with the frame delta, and when a snapshot
//! is due it hands the recorder the current perception snapshot plus the human's
//! control input. The input is labeled through the action codec, so the recorded
//! ground truth and the inference-time decode speak the same taxonomy.
//!
//! The CSV uses `.` as the decimal separator regardless of locale (Rust float
//! formatting guarantees this), one header row, one row per snapshot:
//!
//! ```text
//! ray0,ray1,...,kartx,karty,kartz,time,action
//! 2.5,-1,...,10.2,0.5,-3.1,12.25,LEFT_ACCELERATE
//! ```

use std::{fmt::Write as _, fs, io, path::Path};

use kartling_core::{ActionLabel, ControlSignal, PerceptionSnapshot};

/// Accumulate-and-subtract cadence timer for snapshot capture.
///
/// Carrying the remainder over instead of resetting to zero keeps the average
/// cadence exact even when frame deltas do not divide the interval.
#[derive(Debug, Clone)]
pub struct SnapshotTimer {
    interval: f32,
    elapsed: f32,
}

impl SnapshotTimer {
    #[must_use]
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// Advances by a frame delta; returns true when a snapshot is due.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed > self.interval {
            self.elapsed -= self.interval;
            true
        } else {
            false
        }
    }
}

/// Why a snapshot could not be recorded.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum RecordError {
    #[display("snapshot has {got} rays but the recorder is configured for {expected}")]
    RayCount { expected: usize, got: usize },
}

#[derive(Debug, Clone)]
struct RecordedRow {
    /// Raw observation including the trailing timestamp.
    observation: Vec<f32>,
    label: ActionLabel,
}

/// Accumulates (observation, action) rows and serializes them as CSV.
#[derive(Debug, Clone)]
pub struct DatasetRecorder {
    columns: Vec<String>,
    ray_count: usize,
    rows: Vec<RecordedRow>,
}

impl DatasetRecorder {
    /// Creates a recorder with one named column per ray.
    ///
    /// The position columns `kartx`/`karty`/`kartz` and the `time`/`action` tail are
    /// appended automatically.
    #[must_use]
    pub fn new<S>(ray_names: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        let ray_count = ray_names.len();
        let mut columns: Vec<String> = ray_names
            .iter()
            .map(|name| name.as_ref().to_owned())
            .collect();
        columns.extend(["kartx", "karty", "kartz"].map(str::to_owned));
        Self {
            columns,
            ray_count,
            rows: Vec::new(),
        }
    }

    /// Records one snapshot, labeling the human input through the action codec.
    pub fn record(
        &mut self,
        snapshot: &PerceptionSnapshot,
        input: ControlSignal,
    ) -> Result<(), RecordError> {
        if snapshot.ray_count() != self.ray_count {
            return Err(RecordError::RayCount {
                expected: self.ray_count,
                got: snapshot.ray_count(),
            });
        }
        self.rows.push(RecordedRow {
            observation: snapshot.raw_observation(),
            label: ActionLabel::from_signal(input),
        });
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serializes the captured rows as CSV, header included.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        for column in &self.columns {
            csv.push_str(column);
            csv.push(',');
        }
        csv.push_str("time,action\n");

        for row in &self.rows {
            for value in &row.observation {
                write!(csv, "{value},").unwrap();
            }
            csv.push_str(row.label.wire_name());
            csv.push('\n');
        }
        csv
    }

    /// Writes the CSV to disk.
    pub fn save<P>(&self, path: P) -> io::Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        fs::write(path, self.to_csv())?;
        tracing::info!(path = %path.display(), rows = self.len(), "saved recorded dataset");
        Ok(())
    }
}
