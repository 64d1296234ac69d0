use anyhow::{Context, Result};
use detect::{config::Config, Upload};
use serde_json::Value;
use std::{env, path::PathBuf};
use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
/// Detect fractures in X-ray images
struct Args {
    #[structopt(long, default_value = "detect.json5")]
    /// configuration file
    pub config_file: PathBuf,
    #[structopt(long)]
    /// extra JSON data echoed back in each response
    pub data: Option<String>,
    #[structopt(long)]
    /// print the health report before processing images
    pub health: bool,
    /// input image files
    pub images: Vec<PathBuf>,
}

pub fn main() -> Result<()> {
    // setup logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    // parse arguments
    let Args {
        config_file,
        data,
        health,
        images,
    } = Args::from_args();
    let config = Config::open(&config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))?;
    let additional_data: Value = match data {
        Some(text) => serde_json::from_str(&text).context("--data is not valid JSON")?,
        None => Value::Object(Default::default()),
    };

    let service = detect::start(&config)?;

    if health {
        println!("{}", serde_json::to_string_pretty(&service.health())?);
    }

    for path in images {
        let upload = Upload::open(&path)?;
        let response = service.detect(Some(&upload), additional_data.clone());
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
