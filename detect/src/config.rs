//! Detection boundary configuration.
//!
//! Everything is read once at startup. Nothing here is looked up from the
//! process environment at request time.

use crate::common::*;

pub use model::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    /// The external YOLO command line program.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    /// Class names in class id order, used to name detections.
    #[serde(default = "default_class_names")]
    pub class_names: Vec<String>,
    /// Minimum confidence of reported detections.
    pub confidence: Option<R64>,
    /// Inference image size.
    pub image_size: Option<NonZeroUsize>,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

mod model {
    use super::*;

    /// Where to find the detection model weights.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ModelConfig {
        /// An explicit weight file. If set it must exist.
        pub model_path: Option<PathBuf>,
        /// Candidate weight files tried in order when `model_path` is unset.
        #[serde(default)]
        pub model_search_paths: Vec<PathBuf>,
        /// Generic pretrained weights used when no candidate exists.
        /// Unset means no fallback.
        pub default_pretrained_name: Option<String>,
    }
}

fn default_executable() -> PathBuf {
    "yolo".into()
}

fn default_class_names() -> Vec<String> {
    vec!["fracture".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detect.json5");
        fs::write(
            &path,
            r#"{
                model: {
                    model_search_paths: ["../last.pt", "models/fracatlas_best.pt"],
                    default_pretrained_name: "yolo11n.pt",
                },
                confidence: 0.25,
            }"#,
        )
        .unwrap();

        let config = Config::open(&path).unwrap();
        assert!(config.model.model_path.is_none());
        assert_eq!(config.model.model_search_paths.len(), 2);
        assert_eq!(config.executable, Path::new("yolo"));
        assert_eq!(config.class_names, ["fracture"]);
        assert_eq!(config.confidence, Some(r64(0.25)));
        assert!(config.image_size.is_none());
    }
}
