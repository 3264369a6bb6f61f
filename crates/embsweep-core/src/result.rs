use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{EmbeddingId, TrainConfig};

/// How a [`RunResult`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// Values produced by the training step.
    Completed,
    /// Sentinel values substituted after every attempt failed.
    Degraded,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

/// Outcome of one configuration: per-epoch validation accuracy and loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Embedding the configuration was trained with.
    pub embedding: EmbeddingId,

    /// Whether the series came from training or from the placeholder.
    pub kind: RunKind,

    /// Number of attempts spent on this configuration.
    pub attempts: u32,

    /// Validation accuracy per epoch.
    pub dev_accuracies: Vec<f64>,

    /// Validation loss per epoch.
    pub dev_losses: Vec<f64>,
}

impl RunResult {
    /// A result holding the series returned by the training step.
    #[must_use]
    pub fn completed(
        config: &TrainConfig,
        attempts: u32,
        dev_accuracies: Vec<f64>,
        dev_losses: Vec<f64>,
    ) -> Self {
        Self {
            embedding: config.embeddings.clone(),
            kind: RunKind::Completed,
            attempts,
            dev_accuracies,
            dev_losses,
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.kind == RunKind::Degraded
    }

    /// Final-epoch validation accuracy, if any epochs were recorded.
    #[must_use]
    pub fn final_accuracy(&self) -> Option<f64> {
        self.dev_accuracies.last().copied()
    }

    /// Highest validation accuracy over all epochs.
    #[must_use]
    pub fn best_accuracy(&self) -> Option<f64> {
        self.dev_accuracies.iter().copied().reduce(f64::max)
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunResult({}, {}", self.embedding, self.kind)?;
        write!(f, ", attempts={}", self.attempts)?;
        if let Some(acc) = self.final_accuracy() {
            write!(f, ", final_acc={acc:.4}")?;
        }
        write!(f, ")")
    }
}

/// Sentinel values standing in for "no data" when a configuration never
/// completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    pub accuracy: f64,
    pub loss: f64,
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            accuracy: 0.5,
            loss: 1.0,
        }
    }
}

impl Placeholder {
    /// Builds the degraded result for `config`: `num_epochs` copies of each
    /// sentinel.
    #[must_use]
    pub fn series(&self, config: &TrainConfig, attempts: u32) -> RunResult {
        RunResult {
            embedding: config.embeddings.clone(),
            kind: RunKind::Degraded,
            attempts,
            dev_accuracies: vec![self.accuracy; config.num_epochs],
            dev_losses: vec![self.loss; config.num_epochs],
        }
    }
}

/// Ordered results, one per configuration, index-aligned with the plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    entries: Vec<RunResult>,
}

impl ResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, result: RunResult) {
        self.entries.push(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RunResult> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunResult> {
        self.entries.iter()
    }

    /// Embedding identifiers in result order.
    pub fn labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|r| r.embedding.to_string())
            .collect()
    }

    /// Validation accuracy series, one per configuration.
    pub fn accuracies(&self) -> Vec<&[f64]> {
        self.entries
            .iter()
            .map(|r| r.dev_accuracies.as_slice())
            .collect()
    }

    /// Validation loss series, one per configuration.
    pub fn losses(&self) -> Vec<&[f64]> {
        self.entries.iter().map(|r| r.dev_losses.as_slice()).collect()
    }

    pub fn degraded_count(&self) -> usize {
        self.entries.iter().filter(|r| r.is_degraded()).count()
    }

    pub fn completed_count(&self) -> usize {
        self.len() - self.degraded_count()
    }
}

impl FromIterator<RunResult> for ResultSet {
    fn from_iter<I: IntoIterator<Item = RunResult>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a RunResult;
    type IntoIter = std::slice::Iter<'a, RunResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
