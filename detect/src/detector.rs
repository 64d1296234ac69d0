//! Real or mocked detection, selected once from the capability.

use crate::{
    capability::Capability,
    common::*,
    config::Config,
    detection::Detection,
    error::DetectError,
    model::{DetectionModel, YoloCliModel},
    resolve::{resolve_model, ModelSource},
};

pub enum Detector {
    /// Detections come from the external model.
    Real {
        model: Box<dyn DetectionModel>,
        source: ModelSource,
    },
    /// The external model is unavailable and every call reports so.
    Mock { reason: String },
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real { source, .. } => f.debug_struct("Real").field("source", source).finish(),
            Self::Mock { reason } => f.debug_struct("Mock").field("reason", reason).finish(),
        }
    }
}

impl Detector {
    /// Pick the strategy for a probed capability.
    ///
    /// With the program available, the model weights must resolve.
    pub fn new(config: &Config, capability: &Capability) -> Result<Self, DetectError> {
        let executable = match capability {
            Capability::Available { executable } => executable.clone(),
            Capability::Unavailable { reason } => {
                return Ok(Self::Mock {
                    reason: reason.clone(),
                })
            }
        };

        let source = resolve_model(&config.model)?;
        let model = YoloCliModel {
            executable,
            model: source.model_arg(),
            class_names: config.class_names.clone(),
            confidence: config.confidence,
            image_size: config.image_size,
        };

        Ok(Self::Real {
            model: Box::new(model),
            source,
        })
    }

    pub fn with_model(model: impl DetectionModel + 'static, source: ModelSource) -> Self {
        Self::Real {
            model: Box::new(model),
            source,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock { .. })
    }

    pub fn model_source(&self) -> Option<&ModelSource> {
        match self {
            Self::Real { source, .. } => Some(source),
            Self::Mock { .. } => None,
        }
    }

    /// Detect objects in an encoded image.
    pub fn detect(&self, image: &[u8]) -> Result<Vec<Detection>, DetectError> {
        match self {
            Self::Mock { reason } => Err(DetectError::DependencyUnavailable {
                reason: reason.clone(),
            }),
            Self::Real { model, .. } => {
                imagesize::blob_size(image)
                    .map_err(|err| DetectError::InvalidImage(format!("{:?}", err)))?;
                let detections = model.predict(image)?;
                Ok(detections)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;

    fn config(model: ModelConfig) -> Config {
        Config {
            model,
            executable: "yolo".into(),
            class_names: vec!["fracture".into()],
            confidence: None,
            image_size: None,
        }
    }

    #[test]
    fn unavailable_selects_mock() {
        let capability = Capability::Unavailable {
            reason: "'yolo' not found".into(),
        };
        // model resolution is skipped for the mock strategy
        let detector = Detector::new(&config(ModelConfig::default()), &capability).unwrap();
        assert!(detector.is_mock());
        assert!(matches!(
            detector.detect(b"anything"),
            Err(DetectError::DependencyUnavailable { .. })
        ));
    }

    #[test]
    fn available_requires_weights() {
        let capability = Capability::Available {
            executable: "/usr/bin/yolo".into(),
        };
        let err = Detector::new(&config(ModelConfig::default()), &capability).unwrap_err();
        assert!(matches!(err, DetectError::ModelNotFound { .. }));

        let detector = Detector::new(
            &config(ModelConfig {
                default_pretrained_name: Some("yolo11n.pt".into()),
                ..Default::default()
            }),
            &capability,
        )
        .unwrap();
        assert!(!detector.is_mock());
        assert!(detector.model_source().unwrap().is_pretrained());
    }
}
