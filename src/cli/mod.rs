// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// clap front end. Parses arguments, hands them to a use case and
// prints the result; all pipeline logic lives in Layer 2.
//
//   train    — full pipeline, prints summary + test loss
//   predict  — checkpoint + feature table → prediction table
//   summary  — layer table for a JSON architecture

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, PredictArgs, SummaryArgs, TrainArgs};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use crate::application::{
    predict_use_case::PredictUseCase,
    train_use_case::{load_architecture, TrainUseCase},
};
use crate::data::table::write_table;
use crate::ml::summary::ModelSummary;

#[derive(Parser, Debug)]
#[command(
    name = "genomic-predict",
    version,
    about = "Predict phenotypic traits from marker genotypes with dense, convolutional or recurrent networks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Summary(args) => run_summary(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!(
        "Starting training on '{}' / '{}'",
        args.features.display(),
        args.targets.display()
    );
    let checkpoint_dir = args.checkpoint_dir.clone();
    let outcome = TrainUseCase::new(args.into()).execute()?;

    println!("{}", outcome.summary);
    println!();
    println!(
        "Trained {} epochs{} on {} samples",
        outcome.report.epochs_run(),
        if outcome.report.stopped_early { " (stopped early)" } else { "" },
        outcome.split.train.len()
    );
    for warning in &outcome.report.warnings {
        println!("warning: {warning}");
    }
    println!("Test loss on {} samples: {:.6}", outcome.split.test.len(), outcome.test_loss);
    println!("Checkpoint saved to '{}'", checkpoint_dir.display());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let predictions = PredictUseCase::new(&args.checkpoint_dir, &args.features)
        .with_delimiter(args.delimiter)
        .execute()?;

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Cannot create '{}'", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    write_table(out, predictions.view())?;

    if let Some(path) = &args.output {
        tracing::info!("Wrote {} predictions to '{}'", predictions.nrows(), path.display());
    }
    Ok(())
}

fn run_summary(args: SummaryArgs) -> Result<()> {
    let spec = load_architecture(&args.architecture)?;
    let plan = spec.plan()?;
    println!("{}", ModelSummary::from_plan(&plan));
    Ok(())
}
