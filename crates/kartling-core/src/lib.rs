//! Shared domain types for the kartling driving agent.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//!
//! - [`action`] - The fixed 7-action taxonomy ([`ActionLabel`]), the continuous control
//!   signal ([`ControlSignal`]), and the bidirectional codec between them. Classifier
//!   output is decoded through it, and recorded human input is labeled through it, so
//!   both sides of the behavior-cloning loop agree on what an action means.
//! - [`perception`] - One tick's worth of sensing: per-ray range readings, agent
//!   position, and the raw observation vector layout shared by the dataset recorder and
//!   the feature encoder. Keeping the layout here means the recorded CSV columns and the
//!   inference-time feature order cannot drift apart.
//!
//! Everything here is plain data: no I/O, no model state, no engine hooks.

pub use self::{action::*, perception::*};

pub mod action;
pub mod perception;
