use anyhow::{Context, Result};
use clap::Parser;
use dataset::{PrepareConfig, SplitRatios};
use log::warn;
use std::{env, path::PathBuf};

#[derive(Debug, Clone, Parser)]
/// FracAtlas dataset toolkit
enum Opts {
    /// Split the raw corpus into train/val/test and write data.yaml
    Prepare {
        /// raw dataset directory
        #[clap(long, default_value = "FracAtlas/FracAtlas")]
        source_dir: PathBuf,
        /// output dataset directory
        #[clap(long, default_value = "fracatlas_training/datasets/fracatlas")]
        output_dir: PathBuf,
        /// optional json5 file with all preparation options, overrides other flags
        #[clap(long)]
        config_file: Option<PathBuf>,
        #[clap(long, default_value_t = 0.7)]
        train_ratio: f64,
        #[clap(long, default_value_t = 0.2)]
        val_ratio: f64,
        #[clap(long, default_value_t = 0.1)]
        test_ratio: f64,
        /// shuffling seed
        #[clap(long, default_value_t = dataset::DEFAULT_SEED)]
        seed: u64,
        /// class names in class id order
        #[clap(long = "class-name", default_value = "fracture")]
        class_names: Vec<String>,
        /// skip verification after preparation
        #[clap(long)]
        no_verify: bool,
    },
    /// Check a prepared dataset
    Verify {
        /// prepared dataset directory
        output_dir: PathBuf,
        /// image file extension
        #[clap(long, default_value = "jpg")]
        extension: String,
    },
}

fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    match Opts::parse() {
        Opts::Prepare {
            source_dir,
            output_dir,
            config_file,
            train_ratio,
            val_ratio,
            test_ratio,
            seed,
            class_names,
            no_verify,
        } => {
            let config = match config_file {
                Some(config_file) => PrepareConfig::open(&config_file).with_context(|| {
                    format!("failed to load config file '{}'", config_file.display())
                })?,
                None => PrepareConfig {
                    ratios: SplitRatios {
                        train: train_ratio,
                        val: val_ratio,
                        test: test_ratio,
                    },
                    seed,
                    class_names,
                    ..PrepareConfig::new(source_dir, output_dir)
                },
            };
            prepare(&config, !no_verify)?;
        }
        Opts::Verify {
            output_dir,
            extension,
        } => {
            let report = dataset::verify_with_extension(&output_dir, &extension)?;
            print!("{}", report);
        }
    }

    Ok(())
}

fn prepare(config: &PrepareConfig, verify: bool) -> Result<()> {
    let manifest_path = dataset::prepare(config)?;
    println!("{}", manifest_path.display());

    if verify {
        let report = dataset::verify_with_extension(&config.output_dir, &config.layout.extension)?;
        print!("{}", report);
        if !report.is_clean() {
            warn!("the prepared dataset has warnings");
        }
    }

    Ok(())
}
