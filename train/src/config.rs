//! Training program configuration format.

use crate::common::*;

pub use export::*;
pub use model::*;
pub use training::*;

/// The main training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The directory where runs, configs and saved models are written.
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,
    /// The dataset manifest produced by dataset preparation.
    pub data_file: PathBuf,
    /// The external YOLO command line program.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    /// If set, the saved model is exported to this format.
    pub export: Option<ExportConfig>,
    /// The file name of the best weights under `<project_dir>/models`.
    #[serde(default = "default_save_as")]
    pub save_as: String,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

mod model {
    use super::*;

    /// The YOLO11 model scale.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
    #[serde(rename_all = "lowercase")]
    #[strum(serialize_all = "lowercase")]
    pub enum ModelSize {
        N,
        S,
        M,
        L,
        X,
    }

    /// The model configuration.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelConfig {
        pub size: ModelSize,
        /// Initial weights. Defaults to the pretrained `yolo11<size>.pt`.
        pub weights: Option<PathBuf>,
    }

    impl Default for ModelConfig {
        fn default() -> Self {
            Self {
                size: ModelSize::S,
                weights: None,
            }
        }
    }

    impl ModelConfig {
        pub fn pretrained_name(&self) -> String {
            format!("yolo11{}.pt", self.size)
        }

        pub fn initial_weights(&self) -> PathBuf {
            self.weights
                .clone()
                .unwrap_or_else(|| self.pretrained_name().into())
        }
    }
}

mod training {
    use super::*;

    /// The training hyperparameters passed to the external trainer.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TrainingConfig {
        pub epochs: NonZeroUsize,
        pub image_size: NonZeroUsize,
        pub batch_size: NonZeroUsize,
        /// Epochs without improvement before early stopping.
        pub patience: usize,
        /// Device selector, e.g. `"0"`, `"0,1"` or `"cpu"`.
        pub device: String,
        /// Initial learning rate.
        pub lr0: R64,
        /// Final learning rate as a fraction of `lr0`.
        pub lrf: R64,
        pub momentum: R64,
        pub weight_decay: R64,
        pub warmup_epochs: R64,
        pub warmup_momentum: R64,
        /// Box loss gain.
        pub box_gain: R64,
        /// Classification loss gain.
        pub cls_gain: R64,
        pub augment: bool,
        pub save: bool,
        pub plots: bool,
    }

    impl Default for TrainingConfig {
        fn default() -> Self {
            Self {
                epochs: NonZeroUsize::new(100).unwrap(),
                image_size: NonZeroUsize::new(640).unwrap(),
                batch_size: NonZeroUsize::new(32).unwrap(),
                patience: 50,
                device: "0".into(),
                lr0: r64(0.01),
                lrf: r64(0.01),
                momentum: r64(0.937),
                weight_decay: r64(0.0005),
                warmup_epochs: r64(3.0),
                warmup_momentum: r64(0.8),
                box_gain: r64(7.5),
                cls_gain: r64(0.5),
                augment: true,
                save: true,
                plots: true,
            }
        }
    }
}

mod export {
    use super::*;

    /// Model export options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ExportConfig {
        /// Target format understood by the external exporter, e.g. `torchscript` or `onnx`.
        pub format: String,
    }
}

fn default_project_dir() -> PathBuf {
    "fracatlas_training".into()
}

fn default_executable() -> PathBuf {
    "yolo".into()
}

fn default_save_as() -> String {
    "fracatlas_best.pt".into()
}
