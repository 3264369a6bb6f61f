//! Data loading for the dev/train/test classification splits.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use embsweep_core::{Result, Splits, SweepError};
use serde::Deserialize;
use tracing::info;

/// Split file names, in dev/train/test order.
pub const SPLIT_FILES: [&str; 3] = ["dev.json", "train.json", "test.json"];

/// On-disk layout: one column per field.
#[derive(Debug, Deserialize)]
struct Columns {
    text: Vec<String>,
    label: Vec<usize>,
}

/// One labelled text split.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub path: PathBuf,
    pub texts: Vec<String>,
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Largest label present, if any.
    pub fn max_label(&self) -> Option<usize> {
        self.labels.iter().copied().max()
    }

    /// Number of examples per label.
    pub fn label_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

/// Load one split from a columnar JSON file (`{"text": [..], "label": [..]}`).
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| SweepError::DataLoad(format!("{}: {e}", path.display())))?;

    let columns: Columns = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| SweepError::DataLoad(format!("{}: {e}", path.display())))?;

    if columns.text.len() != columns.label.len() {
        return Err(SweepError::DataLoad(format!(
            "{}: {} texts but {} labels",
            path.display(),
            columns.text.len(),
            columns.label.len()
        )));
    }
    if columns.text.is_empty() {
        return Err(SweepError::DataLoad(format!(
            "{}: split is empty",
            path.display()
        )));
    }

    Ok(Dataset {
        path: path.to_path_buf(),
        texts: columns.text,
        labels: columns.label,
    })
}

/// Load `dev.json`, `train.json` and `test.json` from `dir`.
pub fn load_splits<P: AsRef<Path>>(dir: P) -> Result<Splits<Dataset>> {
    let dir = dir.as_ref();
    let [dev, train, test] = SPLIT_FILES;

    let splits = Splits::new(
        load_dataset(dir.join(dev))?,
        load_dataset(dir.join(train))?,
        load_dataset(dir.join(test))?,
    );

    info!(
        "Loaded {} dev / {} train / {} test examples from {}",
        splits.dev.len(),
        splits.train.len(),
        splits.test.len(),
        dir.display()
    );

    Ok(splits)
}

/// Rejects splits holding a label outside `0..num_classes`.
pub fn check_labels(splits: &Splits<Dataset>, num_classes: usize) -> Result<()> {
    for split in [&splits.dev, &splits.train, &splits.test] {
        if let Some(max) = split.max_label() {
            if max >= num_classes {
                return Err(SweepError::DataLoad(format!(
                    "{} has label {} but the model expects {} classes",
                    split.path.display(),
                    max,
                    num_classes
                )));
            }
        }
    }
    Ok(())
}
