//! Behavior-cloning dataset capture and read-back.
//!
//! During a recording run, a human drives while the recorder snapshots
//! (observation, action) pairs at a fixed cadence; the resulting CSV is the training
//! input for the offline pipeline that produces the weight, tree, and scaler files
//! the inference side consumes.
//!
//! - [`recorder`] - [`recorder::DatasetRecorder`] accumulates rows and serializes the
//!   CSV; [`recorder::SnapshotTimer`] decides when a snapshot is due.
//! - [`dataset`] - [`dataset::Dataset`] reads a recorded CSV back, for replaying
//!   observations through a classifier offline.
//!
//! The CSV layout is the raw observation layout from [`kartling_core::perception`]
//! plus a `time` column and an `action` column holding the label's wire name. Rows
//! are stored raw (no y-drop, no normalization); encoding happens at consumption
//! time so one dataset can serve scalers fitted later.

pub mod dataset;
pub mod recorder;
