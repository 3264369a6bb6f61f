//! SVG rendering for comparison and single-run loss plots.

use std::error::Error;
use std::path::{Path, PathBuf};

use embsweep_core::{LossCurveSink, ReportingSink, Result, ResultSet, RunResult, SweepError};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// One named curve on a chart.
struct Curve<'a> {
    label: String,
    values: &'a [f64],
    faded: bool,
}

/// Writes plots as SVG files.
#[derive(Debug, Clone)]
pub struct SvgPlotter {
    path: PathBuf,
    size: (u32, u32),
}

impl SvgPlotter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: (1200, 500),
        }
    }

    /// Set the canvas size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn prepare_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SweepError::Reporting(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        Ok(())
    }

    fn draw_comparison(&self, accuracies: &[Curve<'_>], losses: &[Curve<'_>]) -> DrawResult {
        let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let panels = root.split_evenly((1, 2));
        draw_panel(&panels[0], "Validation accuracy", "Accuracy", accuracies)?;
        draw_panel(&panels[1], "Validation loss", "Loss", losses)?;

        root.present()?;
        Ok(())
    }

    fn draw_epochs(&self, curves: &[Curve<'_>]) -> DrawResult {
        let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        draw_panel(&root, "Training vs validation loss", "Loss", curves)?;
        root.present()?;
        Ok(())
    }
}

/// One curve per result; degraded results are faded and marked in the legend.
fn comparison_curves<'a>(
    results: &'a ResultSet,
    labels: &[String],
    pick: impl Fn(&'a RunResult) -> &'a [f64],
) -> Vec<Curve<'a>> {
    results
        .iter()
        .zip(labels)
        .map(|(r, label)| Curve {
            label: if r.is_degraded() {
                format!("{label} (placeholder)")
            } else {
                label.clone()
            },
            values: pick(r),
            faded: r.is_degraded(),
        })
        .collect()
}

/// Y range covering every finite value, padded so flat lines stay visible.
fn value_range(curves: &[Curve<'_>]) -> (f64, f64) {
    let (min, max) = curves
        .iter()
        .flat_map(|c| c.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 0.5 };
    (min - pad, max + pad)
}

fn draw_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    caption: &str,
    y_desc: &str,
    curves: &[Curve<'_>],
) -> DrawResult {
    let epochs = curves.iter().map(|c| c.values.len()).max().unwrap_or(1).max(2);
    let (y_min, y_max) = value_range(curves);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(1f64..epochs as f64, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc(y_desc)
        .draw()?;

    for (i, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(i);
        let style = if curve.faded {
            color.mix(0.35).stroke_width(1)
        } else {
            color.stroke_width(2)
        };

        let points = curve
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(epoch, v)| ((epoch + 1) as f64, *v));

        chart
            .draw_series(LineSeries::new(points, style))?
            .label(curve.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

impl ReportingSink for SvgPlotter {
    fn report(&mut self, results: &ResultSet, labels: &[String]) -> Result<()> {
        if results.is_empty() {
            return Err(SweepError::Reporting("no results to plot".into()));
        }
        if labels.len() != results.len() {
            return Err(SweepError::Reporting(format!(
                "{} labels for {} results",
                labels.len(),
                results.len()
            )));
        }

        let accuracies = comparison_curves(results, labels, |r| r.dev_accuracies.as_slice());
        let losses = comparison_curves(results, labels, |r| r.dev_losses.as_slice());

        self.prepare_dir()?;
        self.draw_comparison(&accuracies, &losses)
            .map_err(|e| SweepError::Reporting(format!("{}: {e}", self.path.display())))?;

        info!("Comparison plot saved to {}", self.path.display());
        Ok(())
    }
}

impl LossCurveSink for SvgPlotter {
    fn plot_epochs(&mut self, train_losses: &[f64], dev_losses: &[f64]) -> Result<()> {
        if train_losses.is_empty() || train_losses.len() != dev_losses.len() {
            return Err(SweepError::Reporting(format!(
                "cannot plot {} train losses against {} dev losses",
                train_losses.len(),
                dev_losses.len()
            )));
        }

        let curves = [
            Curve {
                label: "train loss".into(),
                values: train_losses,
                faded: false,
            },
            Curve {
                label: "dev loss".into(),
                values: dev_losses,
                faded: false,
            },
        ];

        self.prepare_dir()?;
        self.draw_epochs(&curves)
            .map_err(|e| SweepError::Reporting(format!("{}: {e}", self.path.display())))?;

        info!("Plot saved as {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embsweep_core::{EmbeddingId, HyperParams, Placeholder, TrainConfig};

    fn config(id: &str) -> TrainConfig {
        let params = HyperParams::default().with_epochs(3);
        TrainConfig::for_embedding(&params, EmbeddingId::new(id).unwrap())
    }

    fn results() -> ResultSet {
        [
            RunResult::completed(
                &config("glove-twitter-50"),
                1,
                vec![0.61, 0.70, 0.74],
                vec![0.66, 0.58, 0.55],
            ),
            Placeholder::default().series(&config("glove-twitter-100"), 3),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn value_range_pads_flat_series() {
        let flat = [1.0, 1.0];
        let curves = [Curve {
            label: "x".into(),
            values: &flat,
            faded: false,
        }];
        assert_eq!(value_range(&curves), (0.5, 1.5));
        assert_eq!(value_range(&[]), (0.0, 1.0));
    }

    #[test]
    fn renders_comparison_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("comparison.svg");
        let mut plotter = SvgPlotter::new(&path);

        let results = results();
        plotter.report(&results, &results.labels()).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("glove-twitter-50"));
    }

    #[test]
    fn renders_single_run_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single_run_loss.svg");
        let mut plotter = SvgPlotter::new(&path).with_size(800, 600);

        plotter
            .plot_epochs(&[0.9, 0.7, 0.6], &[0.8, 0.75, 0.74])
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rejects_empty_and_mismatched_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.svg");
        let mut plotter = SvgPlotter::new(&path);

        assert!(matches!(
            plotter.report(&ResultSet::new(), &[]),
            Err(SweepError::Reporting(_))
        ));
        assert!(plotter.report(&results(), &["one".to_string()]).is_err());
        assert!(plotter.plot_epochs(&[0.1, 0.2], &[0.3]).is_err());
        assert!(!path.exists());
    }
}
