//! The `data.yaml` manifest consumed by the YOLO training entry point.

use crate::{common::*, error::PrepareError, split::Split};

/// File name of the manifest under the output directory.
pub const MANIFEST_FILE_NAME: &str = "data.yaml";

/// Dataset layout and class mapping.
///
/// Field order is the order written to the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Absolute path of the dataset root.
    pub path: PathBuf,
    pub train: String,
    pub val: String,
    pub test: String,
    /// Class id to class name.
    pub names: BTreeMap<usize, String>,
    /// Number of classes.
    pub nc: usize,
}

impl Manifest {
    pub fn new<S>(dataset_dir: impl Into<PathBuf>, class_names: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        let names: BTreeMap<_, _> = class_names
            .iter()
            .enumerate()
            .map(|(id, name)| (id, name.as_ref().to_owned()))
            .collect();

        Self {
            path: dataset_dir.into(),
            train: split_subpath(Split::Train),
            val: split_subpath(Split::Val),
            test: split_subpath(Split::Test),
            nc: names.len(),
            names,
        }
    }

    /// Read a manifest file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PrepareError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| PrepareError::read(path, err))?;
        serde_yaml::from_str(&text).map_err(|source| PrepareError::Manifest {
            path: path.to_owned(),
            source,
        })
    }

    /// The relative image directory declared for `split`.
    pub fn split_path(&self, split: Split) -> &str {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    /// Whether the class count agrees with the class mapping.
    pub fn is_consistent(&self) -> bool {
        self.nc == self.names.len()
    }
}

fn split_subpath(split: Split) -> String {
    format!("images/{}", split.dir_name())
}

/// Write `data.yaml` into `output_dir` and return its path.
///
/// The stored dataset path is made absolute against the current
/// directory without resolving symlinks.
pub fn write_manifest<S>(
    output_dir: impl AsRef<Path>,
    class_names: &[S],
) -> Result<PathBuf, PrepareError>
where
    S: AsRef<str>,
{
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir).map_err(|err| PrepareError::write(output_dir, err))?;

    let absolute_dir = if output_dir.is_absolute() {
        output_dir.to_owned()
    } else {
        std::env::current_dir()
            .map_err(|err| PrepareError::read(".", err))?
            .join(output_dir)
    };

    let manifest = Manifest::new(absolute_dir, class_names);
    let text = serde_yaml::to_string(&manifest).map_err(|source| PrepareError::Manifest {
        path: output_dir.join(MANIFEST_FILE_NAME),
        source,
    })?;

    let manifest_path = output_dir.join(MANIFEST_FILE_NAME);
    fs::write(&manifest_path, text).map_err(|err| PrepareError::write(&manifest_path, err))?;
    info!("manifest saved to '{}'", manifest_path.display());

    Ok(manifest_path)
}
