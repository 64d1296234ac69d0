//! Integrity checks of a prepared dataset.

use crate::{
    common::*,
    error::PrepareError,
    manifest::MANIFEST_FILE_NAME,
    materialize::{image_dir, label_dir},
    record::{list_files, SourceLayout},
    split::Split,
};
use prettytable::{cell, row, Table};

/// A split whose image and label counts differ. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountMismatchWarning {
    pub split: Split,
    pub images: usize,
    pub labels: usize,
}

impl fmt::Display for CountMismatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: number of images ({}) and labels ({}) do not match",
            self.split, self.images, self.labels
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReport {
    pub split: Split,
    pub images: usize,
    pub labels: usize,
    /// Label files with no boxes.
    pub empty_labels: usize,
    /// Image stems without a label file.
    pub missing_labels: Vec<String>,
    /// Label stems without an image file.
    pub orphan_labels: Vec<String>,
    /// Label files that failed to parse, with the reason.
    pub invalid_labels: Vec<(String, String)>,
}

impl SplitReport {
    pub fn warning(&self) -> Option<CountMismatchWarning> {
        (self.images != self.labels).then(|| CountMismatchWarning {
            split: self.split,
            images: self.images,
            labels: self.labels,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub output_dir: PathBuf,
    pub splits: Vec<SplitReport>,
    pub manifest_path: PathBuf,
    pub manifest_found: bool,
}

impl VerificationReport {
    pub fn warnings(&self) -> Vec<CountMismatchWarning> {
        self.splits.iter().filter_map(SplitReport::warning).collect()
    }

    pub fn split(&self, split: Split) -> Option<&SplitReport> {
        self.splits.iter().find(|report| report.split == split)
    }

    /// No count mismatch, no stray file and the manifest exists.
    pub fn is_clean(&self) -> bool {
        self.manifest_found
            && self.splits.iter().all(|report| {
                report.warning().is_none()
                    && report.missing_labels.is_empty()
                    && report.orphan_labels.is_empty()
                    && report.invalid_labels.is_empty()
            })
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new();
        table.add_row(row!["split", "images", "labels", "empty labels", "status"]);

        for report in &self.splits {
            let status = if report.warning().is_some() {
                "count mismatch"
            } else {
                "ok"
            };
            table.add_row(row![
                report.split,
                report.images,
                report.labels,
                report.empty_labels,
                status
            ]);
        }
        write!(f, "{}", table)?;

        for report in &self.splits {
            if let Some(warning) = report.warning() {
                writeln!(f, "warning: {}", warning)?;
            }
            for stem in &report.missing_labels {
                writeln!(f, "warning: {}: image '{}' has no label", report.split, stem)?;
            }
            for stem in &report.orphan_labels {
                writeln!(f, "warning: {}: label '{}' has no image", report.split, stem)?;
            }
            for (stem, reason) in &report.invalid_labels {
                writeln!(f, "warning: {}: label '{}' is invalid: {}", report.split, stem, reason)?;
            }
        }

        if self.manifest_found {
            writeln!(f, "manifest found: {}", self.manifest_path.display())
        } else {
            writeln!(f, "manifest not found: {}", self.manifest_path.display())
        }
    }
}

/// Check a prepared dataset whose images use the default extension.
pub fn verify(output_dir: impl AsRef<Path>) -> Result<VerificationReport, PrepareError> {
    verify_with_extension(output_dir, &SourceLayout::default().extension)
}

/// Count images and labels per split and look for the manifest.
///
/// Problems found here are recorded in the report. Only a failure to
/// list a directory is returned as an error.
pub fn verify_with_extension(
    output_dir: impl AsRef<Path>,
    extension: &str,
) -> Result<VerificationReport, PrepareError> {
    let output_dir = output_dir.as_ref();
    info!("verifying dataset '{}'", output_dir.display());

    let splits: Vec<_> = Split::all()
        .map(|split| verify_split(output_dir, split, extension))
        .collect::<Result<_, _>>()?;

    for warning in splits.iter().filter_map(SplitReport::warning) {
        warn!("{}", warning);
    }

    let manifest_path = output_dir.join(MANIFEST_FILE_NAME);
    let manifest_found = manifest_path.is_file();
    if !manifest_found {
        warn!("manifest '{}' not found", manifest_path.display());
    }

    Ok(VerificationReport {
        output_dir: output_dir.to_owned(),
        splits,
        manifest_path,
        manifest_found,
    })
}

fn verify_split(
    output_dir: &Path,
    split: Split,
    extension: &str,
) -> Result<SplitReport, PrepareError> {
    let list = |dir: PathBuf, extension: &str| -> Result<Vec<PathBuf>, PrepareError> {
        if dir.is_dir() {
            list_files(&dir, extension)
        } else {
            Ok(vec![])
        }
    };
    let stems = |paths: &[PathBuf]| -> BTreeSet<String> {
        paths
            .iter()
            .filter_map(|path| path.file_stem()?.to_str().map(ToOwned::to_owned))
            .collect()
    };

    let images = list(image_dir(output_dir, split), extension)?;
    let labels = list(label_dir(output_dir, split), "txt")?;

    let image_stems = stems(&images);
    let label_stems = stems(&labels);

    let mut empty_labels = 0;
    let mut invalid_labels = vec![];

    for path in &labels {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        match label::read_label_file(path) {
            Ok(boxes) if boxes.is_empty() => empty_labels += 1,
            Ok(_) => {}
            Err(err) => invalid_labels.push((stem.to_owned(), format!("{:#}", err))),
        }
    }

    Ok(SplitReport {
        split,
        images: images.len(),
        labels: labels.len(),
        empty_labels,
        missing_labels: image_stems.difference(&label_stems).cloned().collect(),
        orphan_labels: label_stems.difference(&image_stems).cloned().collect(),
        invalid_labels,
    })
}
