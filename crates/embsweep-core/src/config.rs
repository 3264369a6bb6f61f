//! # Experiment configuration
//!
//! Typed, immutable records describing one experiment variant, and the
//! ordered plan the runner walks through.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SweepError};

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("static pattern compiles"));

/// Pretrained word vectors the training step knows how to fetch.
pub const KNOWN_EMBEDDINGS: &[&str] = &[
    "glove-twitter-25",
    "glove-twitter-50",
    "glove-twitter-100",
    "glove-twitter-200",
    "glove-wiki-gigaword-50",
    "glove-wiki-gigaword-100",
    "glove-wiki-gigaword-200",
    "glove-wiki-gigaword-300",
    "word2vec-google-news-300",
    "fasttext-wiki-news-subwords-300",
    "conceptnet-numberbatch-17-06-300",
];

/// Identifier of a pretrained embedding, e.g. `glove-twitter-50`.
///
/// Only ASCII alphanumerics, `-`, `_` and `.` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmbeddingId(String);

impl EmbeddingId {
    /// Validates and wraps an embedding identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(SweepError::InvalidConfig(
                "embedding identifier is empty".into(),
            ));
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(SweepError::InvalidConfig(format!(
                "embedding identifier {id:?} contains invalid character {bad:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this identifier is in [`KNOWN_EMBEDDINGS`].
    #[must_use]
    pub fn is_known(&self) -> bool {
        KNOWN_EMBEDDINGS.contains(&self.0.as_str())
    }

    /// File-name friendly form: every run of non-alphanumeric characters
    /// becomes a single `_`.
    #[must_use]
    pub fn artifact_stem(&self) -> String {
        NON_ALNUM.replace_all(&self.0, "_").into_owned()
    }
}

impl TryFrom<String> for EmbeddingId {
    type Error = SweepError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<EmbeddingId> for String {
    fn from(id: EmbeddingId) -> Self {
        id.0
    }
}

impl fmt::Display for EmbeddingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Training hyperparameters shared by every configuration of a study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    /// Mini-batch size.
    pub batch_size: usize,
    /// Optimizer learning rate.
    pub learning_rate: f64,
    /// Number of training epochs.
    pub num_epochs: usize,
    /// Number of target classes.
    pub num_classes: usize,
}

impl Default for HyperParams {
    fn default() -> Self {
        Self {
            batch_size: 64,
            learning_rate: 0.025,
            num_epochs: 20,
            num_classes: 2,
        }
    }
}

impl HyperParams {
    /// Create hyperparameters with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the number of epochs.
    pub fn with_epochs(mut self, num_epochs: usize) -> Self {
        self.num_epochs = num_epochs;
        self
    }

    /// Set the number of classes.
    pub fn with_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }

    /// Checks that the values can describe a real training run.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(SweepError::InvalidConfig("batch size must be > 0".into()));
        }
        if self.num_epochs == 0 {
            return Err(SweepError::InvalidConfig("epoch count must be > 0".into()));
        }
        if self.num_classes < 2 {
            return Err(SweepError::InvalidConfig(format!(
                "need at least 2 classes, got {}",
                self.num_classes
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(SweepError::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// One experiment variant: an embedding plus the hyperparameters to train with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub batch_size: usize,
    #[serde(rename = "lr")]
    pub learning_rate: f64,
    pub num_epochs: usize,
    /// Where the training step saves its checkpoint.
    pub save_path: PathBuf,
    /// Embedding identifier; unique within a plan.
    pub embeddings: EmbeddingId,
    pub num_classes: usize,
}

impl TrainConfig {
    /// Builds the configuration for `embedding`, deriving the checkpoint
    /// path as `model_<stem>.pth`.
    pub fn for_embedding(params: &HyperParams, embedding: EmbeddingId) -> Self {
        let save_path = PathBuf::from(format!("model_{}.pth", embedding.artifact_stem()));
        Self {
            batch_size: params.batch_size,
            learning_rate: params.learning_rate,
            num_epochs: params.num_epochs,
            save_path,
            embeddings: embedding,
            num_classes: params.num_classes,
        }
    }

    /// Replaces the checkpoint path.
    pub fn with_save_path(mut self, path: impl AsRef<Path>) -> Self {
        self.save_path = path.as_ref().to_path_buf();
        self
    }

    /// Moves the checkpoint path under `dir`, keeping its file name.
    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.save_path = dir.as_ref().join(&self.save_path);
        self
    }

    /// The hyperparameters this configuration was built from.
    pub fn params(&self) -> HyperParams {
        HyperParams {
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            num_epochs: self.num_epochs,
            num_classes: self.num_classes,
        }
    }

    /// Short label used in logs and plot legends.
    pub fn label(&self) -> &str {
        self.embeddings.as_str()
    }
}

/// Ordered, non-empty list of configurations with unique embedding identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentPlan {
    configs: Vec<TrainConfig>,
}

impl ExperimentPlan {
    /// Validates and wraps `configs`, keeping their order.
    pub fn new(configs: Vec<TrainConfig>) -> Result<Self> {
        if configs.is_empty() {
            return Err(SweepError::InvalidConfig(
                "experiment plan has no configurations".into(),
            ));
        }

        let mut seen = HashSet::new();
        for config in &configs {
            config.params().validate()?;
            if !seen.insert(config.embeddings.clone()) {
                return Err(SweepError::InvalidConfig(format!(
                    "duplicate embedding identifier {}",
                    config.embeddings
                )));
            }
        }

        Ok(Self { configs })
    }

    /// Builds one configuration per identifier in `ids`.
    ///
    /// Identifiers missing from `catalogue` are rejected here, before any
    /// training attempt is made.
    pub fn from_embeddings<S: AsRef<str>>(
        params: &HyperParams,
        ids: &[S],
        catalogue: &[&str],
    ) -> Result<Self> {
        let configs = ids
            .iter()
            .map(|id| {
                let id = EmbeddingId::new(id.as_ref())?;
                if !catalogue.contains(&id.as_str()) {
                    return Err(SweepError::InvalidConfig(format!(
                        "unknown embedding {id}"
                    )));
                }
                Ok(TrainConfig::for_embedding(params, id))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(configs)
    }

    /// Moves every checkpoint path under `dir`.
    pub fn in_dir(self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            configs: self.configs.into_iter().map(|c| c.in_dir(dir)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainConfig> {
        self.configs.iter()
    }

    /// Embedding identifiers in plan order.
    pub fn labels(&self) -> Vec<String> {
        self.configs.iter().map(|c| c.label().to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a ExperimentPlan {
    type Item = &'a TrainConfig;
    type IntoIter = std::slice::Iter<'a, TrainConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.configs.iter()
    }
}
