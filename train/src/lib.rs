//! The training program for the fracture detection model.
//!
//! Training, evaluation and export are delegated to the external YOLO
//! command line program. This crate prepares the project directory,
//! passes the hyperparameters and collects the results.

pub mod common;
pub mod config;
pub mod metrics;
pub mod runner;

use crate::{
    common::*,
    config::Config,
    metrics::{read_best_metrics, Metrics},
    runner::{Invocation, ProcessRunner, Runner},
};

pub const FILE_STRFTIME: &str = "%Y-%m-%d-%H-%M-%S.%3f%z";

/// Drives the train, evaluate, save and export stages of one run.
#[derive(Debug)]
pub struct Trainer<R>
where
    R: Runner,
{
    config: Arc<Config>,
    runner: R,
}

impl<R> Trainer<R>
where
    R: Runner,
{
    /// Create the project directories and save a copy of the config.
    pub fn new(config: Arc<Config>, runner: R) -> Result<Self> {
        for dir in [config.project_dir.join("models"), config.project_dir.join("datasets")] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
        }

        let config_dir = config.project_dir.join("configs");
        fs::create_dir_all(&config_dir)?;
        let path = config_dir.join(format!("{}.json5", Local::now().format(FILE_STRFTIME)));
        let text = serde_json::to_string_pretty(&*config)?;
        fs::write(&path, text)?;

        Ok(Self { config, runner })
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// The run name, e.g. `fracatlas_yolo11s`.
    pub fn run_name(&self) -> String {
        format!("fracatlas_yolo11{}", self.config.model.size)
    }

    pub fn run_dir(&self) -> PathBuf {
        self.config.project_dir.join(self.run_name())
    }

    pub fn best_weights(&self) -> PathBuf {
        self.run_dir().join("weights").join("best.pt")
    }

    pub fn train_invocation(&self) -> Invocation {
        let Config {
            project_dir,
            data_file,
            executable,
            model,
            training,
            ..
        } = &*self.config;

        Invocation::new(executable)
            .arg("detect")
            .arg("train")
            .kv("data", data_file.display())
            .kv("model", model.initial_weights().display())
            .kv("epochs", training.epochs)
            .kv("imgsz", training.image_size)
            .kv("batch", training.batch_size)
            .kv("name", self.run_name())
            .kv("project", project_dir.display())
            .flag("exist_ok", true)
            .kv("patience", training.patience)
            .flag("save", training.save)
            .flag("plots", training.plots)
            .kv("device", &training.device)
            .kv("lr0", training.lr0)
            .kv("lrf", training.lrf)
            .kv("momentum", training.momentum)
            .kv("weight_decay", training.weight_decay)
            .kv("warmup_epochs", training.warmup_epochs)
            .kv("warmup_momentum", training.warmup_momentum)
            .kv("box", training.box_gain)
            .kv("cls", training.cls_gain)
            .flag("augment", training.augment)
    }

    pub fn val_invocation(&self) -> Invocation {
        let Config {
            project_dir,
            data_file,
            executable,
            training,
            ..
        } = &*self.config;

        Invocation::new(executable)
            .arg("detect")
            .arg("val")
            .kv("model", self.best_weights().display())
            .kv("data", data_file.display())
            .kv("imgsz", training.image_size)
            .kv("device", &training.device)
            .kv("project", project_dir.display())
            .kv("name", format!("{}_val", self.run_name()))
            .flag("exist_ok", true)
    }

    /// Train the model on the dataset manifest.
    pub fn train(&mut self) -> Result<()> {
        let training = &self.config.training;
        info!("start training {}", self.run_name());
        info!("epochs: {}", training.epochs);
        info!("image size: {}", training.image_size);
        info!("batch size: {}", training.batch_size);

        let invocation = self.train_invocation();
        self.runner.run(&invocation)?;
        Ok(())
    }

    /// Validate the best weights and report the metrics of their epoch.
    pub fn evaluate(&mut self) -> Result<Option<Metrics>> {
        info!("evaluating model");
        let invocation = self.val_invocation();
        self.runner.run(&invocation)?;

        let metrics = read_best_metrics(self.run_dir())?;
        match &metrics {
            Some(metrics) => info!("{}", metrics),
            None => warn!("no metrics found in '{}'", self.run_dir().display()),
        }
        Ok(metrics)
    }

    /// Copy the best weights of the run into `<project_dir>/models`.
    pub fn save_best(&self) -> Result<PathBuf> {
        let src = self.best_weights();
        ensure!(
            src.is_file(),
            "best weights '{}' not found, did training finish?",
            src.display()
        );
        let dst = self.config.project_dir.join("models").join(&self.config.save_as);
        fs::copy(&src, &dst).with_context(|| {
            format!("failed to copy '{}' to '{}'", src.display(), dst.display())
        })?;
        info!("model saved to '{}'", dst.display());
        Ok(dst)
    }

    /// Export saved weights to the configured format, if any.
    pub fn export(&mut self, model_file: &Path) -> Result<()> {
        let export = match &self.config.export {
            Some(export) => export,
            None => return Ok(()),
        };
        info!("exporting '{}' to {}", model_file.display(), export.format);

        let invocation = Invocation::new(&self.config.executable)
            .arg("export")
            .kv("model", model_file.display())
            .kv("format", &export.format);
        self.runner.run(&invocation)?;
        Ok(())
    }

    /// Run all stages in order and return the saved model path.
    pub fn run(&mut self) -> Result<PathBuf> {
        ensure!(
            self.config.data_file.is_file(),
            "dataset manifest '{}' not found, prepare the dataset first",
            self.config.data_file.display()
        );

        self.train()?;
        self.evaluate()?;
        let model_file = self.save_best()?;
        self.export(&model_file)?;
        Ok(model_file)
    }
}

/// The entry of training program.
pub fn start(config: Arc<Config>) -> Result<PathBuf> {
    let mut trainer = Trainer::new(config, ProcessRunner)?;
    let model_file = trainer.run()?;
    info!("training finished, model saved to '{}'", model_file.display());
    Ok(model_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportConfig, ModelConfig, ModelSize, TrainingConfig};

    /// Records invocations and fakes the files the trainer would write.
    #[derive(Debug, Default)]
    struct FakeRunner {
        invocations: Vec<Invocation>,
        fail_on: Option<&'static str>,
    }

    impl Runner for FakeRunner {
        fn run(&mut self, invocation: &Invocation) -> Result<()> {
            self.invocations.push(invocation.clone());
            let stage = match invocation.args.first().map(String::as_str) {
                Some("detect") => invocation.args[1].as_str(),
                other => other.unwrap_or_default(),
            };
            if self.fail_on == Some(stage) {
                bail!("{} failed", stage);
            }

            if stage == "train" {
                let run_dir = Path::new(invocation.value("project").unwrap())
                    .join(invocation.value("name").unwrap());
                fs::create_dir_all(run_dir.join("weights"))?;
                fs::write(run_dir.join("weights").join("best.pt"), b"weights")?;
                fs::write(
                    run_dir.join("results.csv"),
                    "epoch,metrics/precision(B),metrics/recall(B),metrics/mAP50(B),metrics/mAP50-95(B)\n1,0.5,0.4,0.45,0.2\n",
                )?;
            }
            Ok(())
        }
    }

    fn config(dir: &Path) -> Config {
        let data_file = dir.join("data.yaml");
        fs::write(&data_file, "nc: 1\n").unwrap();
        Config {
            project_dir: dir.join("project"),
            data_file,
            executable: "yolo".into(),
            model: ModelConfig {
                size: ModelSize::M,
                weights: None,
            },
            training: TrainingConfig::default(),
            export: Some(ExportConfig {
                format: "onnx".into(),
            }),
            save_as: "fracatlas_best.pt".into(),
        }
    }

    #[test]
    fn run_all_stages() {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(config(dir.path()));
        let mut trainer = Trainer::new(config.clone(), FakeRunner::default()).unwrap();

        let model_file = trainer.run().unwrap();
        assert_eq!(
            model_file,
            config.project_dir.join("models").join("fracatlas_best.pt")
        );
        assert_eq!(fs::read(&model_file).unwrap(), b"weights");
        assert!(config.project_dir.join("datasets").is_dir());
        assert_eq!(fs::read_dir(config.project_dir.join("configs")).unwrap().count(), 1);

        let invocations = &trainer.runner().invocations;
        assert_eq!(invocations.len(), 3);

        let train = &invocations[0];
        assert_eq!(train.args[..2], ["detect", "train"]);
        assert_eq!(train.value("model"), Some("yolo11m.pt"));
        assert_eq!(train.value("name"), Some("fracatlas_yolo11m"));
        assert_eq!(train.value("epochs"), Some("100"));
        assert_eq!(train.value("batch"), Some("32"));
        assert_eq!(train.value("momentum"), Some("0.937"));
        assert_eq!(train.value("augment"), Some("True"));

        assert_eq!(invocations[1].args[..2], ["detect", "val"]);
        assert!(invocations[1].value("model").unwrap().ends_with("best.pt"));

        assert_eq!(invocations[2].args[0], "export");
        assert_eq!(invocations[2].value("format"), Some("onnx"));
    }

    #[test]
    fn failed_training_aborts_remaining_stages() {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(config(dir.path()));
        let runner = FakeRunner {
            fail_on: Some("train"),
            ..Default::default()
        };
        let mut trainer = Trainer::new(config, runner).unwrap();

        assert!(trainer.run().is_err());
        assert_eq!(trainer.runner().invocations.len(), 1);
    }

    #[test]
    fn missing_manifest_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.data_file = dir.path().join("missing.yaml");
        let mut trainer = Trainer::new(Arc::new(config), FakeRunner::default()).unwrap();

        assert!(trainer.run().is_err());
        assert!(trainer.runner().invocations.is_empty());
    }
}
