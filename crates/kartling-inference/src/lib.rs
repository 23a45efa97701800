//! Inference subsystem for the kartling driving agent.
//!
//! This crate turns one perception snapshot into one discrete driving action, once per
//! control tick:
//!
//! ```text
//! PerceptionSnapshot
//!     ↓ FeatureEncoder (assemble raw vector, drop pos.y, z-score with ScalerParams)
//! feature vector
//!     ↓ ActionClassifier (MlpModel | DecisionTree)
//! class index
//!     ↓ decode_class_index (shared 0/1/2 → label mapping)
//! ActionLabel → ControlSignal
//! ```
//!
//! # Modules
//!
//! - [`scaler`] - Per-feature mean/std for z-score normalization, loaded from JSON and
//!   validated (equal lengths, non-zero std) before anything consumes them.
//! - [`encoder`] - [`encoder::FeatureEncoder`], the normalization and encoding contract
//!   between raw sensor readings and classifier input.
//! - [`weight_format`] - Strict parser (and test-fixture serializer) for the
//!   line-oriented MLP weight-file wire format.
//! - [`mlp`] - [`mlp::MlpModel`]: layer-by-layer sigmoid forward propagation plus the
//!   shape-validated parameter set it runs on.
//! - [`tree`] - [`tree::DecisionTree`]: flat-array binary tree with threshold traversal.
//! - [`classifier`] - The [`classifier::ActionClassifier`] seam both models implement,
//!   and the single shared class-index → [`kartling_core::ActionLabel`] decoder.
//! - [`pipeline`] - [`pipeline::DrivePipeline`], the per-tick request/response entry
//!   point. Shape compatibility between encoder and classifier is checked once, when
//!   the pipeline is assembled, never mid-tick.
//!
//! # Load discipline
//!
//! Model parameters (weights, tree structure, scaler) are parsed and validated once at
//! startup and are immutable afterwards. Every handle is `Send + Sync`;
//! a multi-agent deployment can share them read-only or give each agent its own, with
//! no locking either way. Load failures are typed, reported errors - the operator sees
//! a message and the affected classifier path stays disabled; nothing panics.
//!
//! # Per-tick failures
//!
//! Encoding can reject a tick (wrong ray count, non-finite normalized value). Callers
//! should skip that tick's action rather than crash the control loop; inference itself
//! is a bounded, deterministic computation over fixed-size arrays and cannot fail once
//! its inputs are validated.

pub mod classifier;
pub mod encoder;
pub mod mlp;
pub mod pipeline;
pub mod scaler;
pub mod tree;
pub mod weight_format;
