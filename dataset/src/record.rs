//! Source corpus discovery.

use crate::{common::*, error::PrepareError};

/// The binary image-level class of a source image.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Finding {
    /// The image shows a finding, e.g. a fracture.
    Positive,
    /// The image shows no finding.
    Negative,
}

/// One source image, discovered once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub finding: Finding,
    /// The same-stem annotation file, if the source provides one.
    pub annotation: Option<PathBuf>,
}

impl ImageRecord {
    /// The file name without extension, shared by the image and its label.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

/// Directory layout of the raw corpus, relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    pub image_dir: PathBuf,
    pub positive_dir: String,
    pub negative_dir: String,
    pub annotation_dir: PathBuf,
    /// Image file extension, without the dot.
    pub extension: String,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            image_dir: "images".into(),
            positive_dir: "Fractured".into(),
            negative_dir: "Non_fractured".into(),
            annotation_dir: Path::new("Annotations").join("YOLO"),
            extension: "jpg".into(),
        }
    }
}

impl SourceLayout {
    pub fn class_dir(&self, source_dir: &Path, finding: Finding) -> PathBuf {
        let name = match finding {
            Finding::Positive => &self.positive_dir,
            Finding::Negative => &self.negative_dir,
        };
        source_dir.join(&self.image_dir).join(name)
    }

    pub fn annotation_file(&self, source_dir: &Path, stem: &str) -> PathBuf {
        source_dir
            .join(&self.annotation_dir)
            .join(format!("{}.txt", stem))
    }
}

/// List the images of both classes under `source_dir`.
///
/// Positive images come first, then negative ones. Within a class the
/// order is the lexicographic order of file paths. A missing class
/// directory contributes no images. Two images with the same stem are
/// rejected, since they would share one label file.
pub fn discover(
    source_dir: impl AsRef<Path>,
    layout: &SourceLayout,
) -> Result<Vec<ImageRecord>, PrepareError> {
    let source_dir = source_dir.as_ref();
    if !source_dir.is_dir() {
        return Err(PrepareError::SourceNotFound {
            path: source_dir.to_owned(),
        });
    }

    let mut records = vec![];
    let mut stems: HashMap<String, PathBuf> = HashMap::new();

    for finding in [Finding::Positive, Finding::Negative] {
        let class_dir = layout.class_dir(source_dir, finding);
        if !class_dir.is_dir() {
            warn!("class directory '{}' not found", class_dir.display());
            continue;
        }

        for path in list_files(&class_dir, &layout.extension)? {
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_owned();
            if let Some(first) = stems.insert(stem.clone(), path.clone()) {
                return Err(PrepareError::DuplicateStem {
                    stem,
                    first,
                    second: path,
                });
            }

            let annotation = Some(layout.annotation_file(source_dir, &stem))
                .filter(|annotation| annotation.is_file());

            records.push(ImageRecord {
                path,
                finding,
                annotation,
            });
        }
    }

    Ok(records)
}

/// Sorted list of regular files in `dir` with the given extension.
pub(crate) fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PrepareError> {
    let invalid = |reason: String| {
        PrepareError::read(dir, io::Error::new(io::ErrorKind::InvalidInput, reason))
    };

    let dir_str = dir
        .to_str()
        .ok_or_else(|| invalid("path is not valid UTF-8".into()))?;
    let pattern = format!("{}/*.{}", glob::Pattern::escape(dir_str), extension);
    let paths = glob::glob(&pattern).map_err(|err| invalid(err.to_string()))?;

    let mut files: Vec<PathBuf> = paths
        .map(|result| {
            result.map_err(|err| {
                let path = err.path().to_owned();
                PrepareError::read(path, err.into())
            })
        })
        .collect::<Result<_, _>>()?;
    files.retain(|path| path.is_file());
    files.sort();
    Ok(files)
}
