//! # Embsweep
//!
//! Compare pretrained word embeddings on a text-classification task. Each
//! embedding is trained by an external program, retried on failure and
//! replaced by placeholder data if it never completes, so the comparison plot
//! always shows every embedding.
//!
//! See [`embsweep_core`] for the runner and its data model, and
//! [`embsweep_trainer`] for the concrete loader, training bridge and plots.

pub use embsweep_core::*;
pub use embsweep_trainer::{
    CommandStep, ComparisonSettings, Dataset, EMBEDDING_TYPES, JsonSummary, SingleSettings,
    SvgPlotter, TrainerCommand, load_dataset, load_splits, run_comparison, run_single_experiment,
};
