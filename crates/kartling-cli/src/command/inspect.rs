use std::path::PathBuf;

use kartling_inference::tree::LEAF;

use crate::model::{self, ModelKind};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    /// Classifier representation stored in the file
    #[arg(long, value_enum)]
    model: ModelKind,
    /// Path to the model file
    #[arg(long)]
    model_file: PathBuf,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    match arg.model {
        ModelKind::Mlp => {
            let model = model::load_mlp(&arg.model_file)?;
            let params = model.params();
            println!("mlp with {} layers", params.num_layers());
            println!("input width:  {}", params.input_len());
            println!("output width: {}", params.output_len());
            for (index, layer) in params.layers().iter().enumerate() {
                println!(
                    "layer {index}: weights {}x{}, bias {}",
                    layer.weights.rows(),
                    layer.weights.cols(),
                    layer.bias.len(),
                );
            }
        }
        ModelKind::Tree => {
            let tree = model::load_tree(&arg.model_file)?;
            let structure = tree.structure();
            let leaves = structure
                .children_left
                .iter()
                .filter(|&&child| child == LEAF)
                .count();
            println!("decision tree with {} nodes", tree.num_nodes());
            println!("leaves:        {leaves}");
            println!("splits:        {}", tree.num_nodes() - leaves);
            match tree.max_split_feature() {
                Some(feature) => println!("feature range: 0..={feature}"),
                None => println!("feature range: none (single leaf)"),
            }
        }
    }
    Ok(())
}
