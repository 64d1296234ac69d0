//! Reading validation metrics written by the external trainer.

use crate::common::*;

/// Box detection metrics of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub epoch: usize,
    #[serde(rename = "metrics/precision(B)")]
    pub precision: f64,
    #[serde(rename = "metrics/recall(B)")]
    pub recall: f64,
    #[serde(rename = "metrics/mAP50(B)")]
    pub map50: f64,
    #[serde(rename = "metrics/mAP50-95(B)")]
    pub map50_95: f64,
}

impl Metrics {
    /// The weighted score the trainer ranks epochs by to keep `best.pt`.
    pub fn fitness(&self) -> f64 {
        0.1 * self.map50 + 0.9 * self.map50_95
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epoch {}: mAP50 {:.3}, mAP50-95 {:.3}, precision {:.3}, recall {:.3}",
            self.epoch, self.map50, self.map50_95, self.precision, self.recall
        )
    }
}

/// Parse `results.csv` in a run directory and return the epoch whose
/// weights were saved as `best.pt`.
///
/// That is the epoch of highest fitness, the later one on ties. Returns
/// `None` if the file has no data rows.
pub fn read_best_metrics(run_dir: impl AsRef<Path>) -> Result<Option<Metrics>> {
    let path = run_dir.as_ref().join("results.csv");
    let rows: Vec<Metrics> = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("failed to open '{}'", path.display()))?
        .deserialize()
        .try_collect()
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    let best = rows
        .into_iter()
        .max_by(|lhs, rhs| lhs.fitness().total_cmp(&rhs.fitness()));
    Ok(best)
}
