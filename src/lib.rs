//! Genomic prediction: map marker genotypes to phenotypic traits with
//! dense, convolutional or recurrent networks.
//!
//! The pipeline runs Loader → Splitter → Model build → Trainer → Evaluator
//! and is laid out in layers:
//!
//! 1. [`cli`]         — clap front end (`train`, `predict`, `summary`)
//! 2. [`application`] — use cases that wire the layers together
//! 3. [`domain`]      — plain data types, configuration and errors
//! 4. [`data`]        — table parsing, splitting, burn datasets and batchers
//! 5. [`ml`]          — networks, losses, optimizers and the training loop
//! 6. [`infra`]       — checkpoints and metrics on disk
#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;

pub use domain::error::{PipelineError, Result};
