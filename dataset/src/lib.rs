//! Deterministic train/val/test partitioning of a two-class X-ray corpus
//! into a YOLO directory tree with a `data.yaml` manifest.
//!
//! The pipeline is strictly linear:
//! [discover] → [partition] → [materialize] → [write_manifest], optionally
//! followed by [verify]. A failing stage aborts the run with its error.

mod common;
pub mod config;
pub mod error;
pub mod manifest;
pub mod materialize;
pub mod record;
pub mod split;
pub mod verify;

pub use config::*;
pub use error::*;
pub use manifest::*;
pub use materialize::*;
pub use record::*;
pub use split::*;
pub use verify::*;

use crate::common::*;

/// Run the whole preparation pipeline and return the manifest path.
pub fn prepare(config: &PrepareConfig) -> Result<PathBuf, PrepareError> {
    let PrepareConfig {
        source_dir,
        output_dir,
        ratios,
        seed,
        class_names,
        layout,
    } = config;

    // fail on bad ratios before touching the filesystem
    ratios.validate()?;

    info!("collecting images from '{}'", source_dir.display());
    let records = discover(source_dir, layout)?;
    let positive = records
        .iter()
        .filter(|record| record.finding == Finding::Positive)
        .count();
    info!(
        "found {} images, {} {}, {} {}",
        records.len(),
        positive,
        Finding::Positive.as_ref(),
        records.len() - positive,
        Finding::Negative.as_ref()
    );

    info!("classes: {}", class_names.iter().join(", "));

    let total = records.len();
    let assignment = partition(records, ratios, *seed)?;
    for split in Split::all() {
        let count = assignment.get(split).len();
        info!("{}: {} of {} images", split, count, total);
    }

    let corpus = materialize(&assignment, output_dir)?;
    let manifest_path = write_manifest(output_dir, class_names.as_slice())?;

    info!(
        "dataset with {} images prepared in '{}'",
        corpus.total_images(),
        output_dir.display()
    );

    Ok(manifest_path)
}
