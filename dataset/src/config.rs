//! Dataset preparation options.

use crate::{
    common::*,
    record::SourceLayout,
    split::{SplitRatios, DEFAULT_SEED},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareConfig {
    /// The raw corpus root.
    pub source_dir: PathBuf,
    /// The root of the YOLO directory tree to produce.
    pub output_dir: PathBuf,
    #[serde(default)]
    pub ratios: SplitRatios,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Class names in class id order.
    #[serde(default = "default_class_names")]
    pub class_names: Vec<String>,
    #[serde(default)]
    pub layout: SourceLayout,
}

impl PrepareConfig {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            ratios: SplitRatios::default(),
            seed: DEFAULT_SEED,
            class_names: default_class_names(),
            layout: SourceLayout::default(),
        }
    }

    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_class_names() -> Vec<String> {
    vec!["fracture".into()]
}
