//! The boundary between clients and the external fracture detection model.
//!
//! Configuration is resolved and the external program is probed once at
//! startup. The outcome selects a real or a mock [Detector], and the
//! [Service] handlers turn detections into JSON responses.

mod common;
pub mod capability;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod model;
pub mod resolve;
pub mod service;

pub use capability::*;
pub use config::Config;
pub use detection::*;
pub use detector::*;
pub use error::*;
pub use model::*;
pub use resolve::*;
pub use service::*;

/// Build the service for a configuration, probing the external program.
pub fn start(config: &Config) -> Result<Service, DetectError> {
    let capability = Capability::probe(&config.executable);
    let detector = Detector::new(config, &capability)?;
    if let Some(source) = detector.model_source() {
        log::info!("detector ready with {}", source);
    }
    Ok(Service::new(detector))
}
