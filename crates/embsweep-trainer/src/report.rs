//! Machine-readable summary of a comparison run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use embsweep_core::{ReportingSink, Result, ResultSet, SweepError};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct Summary<'a> {
    labels: &'a [String],
    completed: usize,
    degraded: usize,
    results: &'a ResultSet,
}

/// Writes the result set as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonSummary {
    path: PathBuf,
}

impl JsonSummary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write(&self, summary: &Summary<'_>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, summary)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl ReportingSink for JsonSummary {
    fn report(&mut self, results: &ResultSet, labels: &[String]) -> Result<()> {
        let summary = Summary {
            labels,
            completed: results.completed_count(),
            degraded: results.degraded_count(),
            results,
        };

        self.write(&summary)
            .map_err(|e| SweepError::Reporting(format!("{}: {e}", self.path.display())))?;

        info!("Summary written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embsweep_core::{EmbeddingId, HyperParams, Placeholder, RunResult, TrainConfig};

    #[test]
    fn writes_summary_json() {
        let params = HyperParams::default().with_epochs(2);
        let ok = TrainConfig::for_embedding(&params, EmbeddingId::new("glove-twitter-50").unwrap());
        let bad = TrainConfig::for_embedding(&params, EmbeddingId::new("glove-twitter-200").unwrap());
        let results: ResultSet = [
            RunResult::completed(&ok, 2, vec![0.7, 0.8], vec![0.5, 0.4]),
            Placeholder::default().series(&bad, 3),
        ]
        .into_iter()
        .collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("summary.json");
        JsonSummary::new(&path)
            .report(&results, &results.labels())
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["completed"], 1);
        assert_eq!(json["degraded"], 1);
        assert_eq!(json["labels"][1], "glove-twitter-200");
        assert_eq!(json["results"][0]["attempts"], 2);
        assert_eq!(json["results"][1]["dev_losses"][0], 1.0);
    }

    #[test]
    fn unwritable_path_is_reporting_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened as a file
        let err = JsonSummary::new(dir.path())
            .report(&ResultSet::new(), &[])
            .unwrap_err();
        assert!(matches!(err, SweepError::Reporting(_)));
    }
}
