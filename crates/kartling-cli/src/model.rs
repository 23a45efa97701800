use std::{fs, path::Path};

use anyhow::Context as _;
use kartling_inference::{
    classifier::BoxedActionClassifier, mlp::MlpModel, scaler::ScalerParams, tree::DecisionTree,
};

/// Which trained classifier representation to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelKind {
    /// Multi-layer perceptron from a line-oriented weight file.
    Mlp,
    /// Decision tree from a JSON structure file.
    Tree,
}

pub fn load_scaler(path: &Path) -> anyhow::Result<ScalerParams> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scaler params file {}", path.display()))?;
    let params = ScalerParams::from_json(&text)
        .with_context(|| format!("failed to load scaler params from {}", path.display()))?;
    Ok(params)
}

pub fn load_mlp(path: &Path) -> anyhow::Result<MlpModel> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read weight file {}", path.display()))?;
    let model = MlpModel::from_weight_text(&text)
        .with_context(|| format!("failed to load MLP from {}", path.display()))?;
    Ok(model)
}

pub fn load_tree(path: &Path) -> anyhow::Result<DecisionTree> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tree structure file {}", path.display()))?;
    let tree = DecisionTree::from_json(&text)
        .with_context(|| format!("failed to load decision tree from {}", path.display()))?;
    Ok(tree)
}

/// Loads the configured classifier behind the shared trait object.
pub fn load_classifier(kind: ModelKind, path: &Path) -> anyhow::Result<BoxedActionClassifier> {
    Ok(match kind {
        ModelKind::Mlp => Box::new(load_mlp(path)?),
        ModelKind::Tree => Box::new(load_tree(path)?),
    })
}
