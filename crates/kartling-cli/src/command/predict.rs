use std::{fs, path::PathBuf};

use anyhow::Context as _;
use kartling_inference::{encoder::FeatureEncoder, pipeline::DrivePipeline};
use kartling_record::dataset::Dataset;

use crate::model::{self, ModelKind};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PredictArg {
    /// Classifier representation to load
    #[arg(long, value_enum)]
    model: ModelKind,
    /// Path to the weight file (mlp) or tree structure file (tree)
    #[arg(long)]
    model_file: PathBuf,
    /// Path to the scaler params JSON
    #[arg(long)]
    scaler: PathBuf,
    /// Recorded dataset CSV to replay
    #[arg(long)]
    dataset: PathBuf,
    /// Print every row's prediction, not just the summary
    #[arg(long)]
    show_rows: bool,
}

pub(crate) fn run(arg: &PredictArg) -> anyhow::Result<()> {
    let text = fs::read_to_string(&arg.dataset)
        .with_context(|| format!("failed to read dataset {}", arg.dataset.display()))?;
    let dataset = Dataset::from_csv(&text)
        .with_context(|| format!("failed to parse dataset {}", arg.dataset.display()))?;

    let scaler = model::load_scaler(&arg.scaler)?;
    let encoder = FeatureEncoder::new(dataset.ray_count(), scaler)
        .context("scaler does not fit the dataset's ray count")?;
    let classifier = model::load_classifier(arg.model, &arg.model_file)?;
    let pipeline =
        DrivePipeline::new(encoder, classifier).context("classifier does not fit the encoder")?;

    let mut agreed = 0usize;
    let mut skipped = 0usize;
    for (index, row) in dataset.rows().iter().enumerate() {
        let snapshot = row.to_snapshot();
        let predicted = match pipeline.predict_label(&snapshot) {
            Ok(label) => label,
            Err(err) => {
                tracing::warn!(row = index, %err, "skipping row");
                skipped += 1;
                continue;
            }
        };
        if predicted == row.label {
            agreed += 1;
        }
        if arg.show_rows {
            let marker = if predicted == row.label { ' ' } else { '*' };
            println!("{index:6} {marker} predicted={predicted} recorded={}", row.label);
        }
    }

    let scored = dataset.len() - skipped;
    println!("rows:      {}", dataset.len());
    println!("skipped:   {skipped}");
    if scored > 0 {
        #[allow(clippy::cast_precision_loss)]
        let pct = 100.0 * agreed as f64 / scored as f64;
        println!("agreement: {agreed}/{scored} ({pct:.1}%)");
    }
    Ok(())
}
