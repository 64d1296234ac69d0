//! One-time model weight resolution.

use crate::{common::*, config::ModelConfig, error::DetectError};

/// Where the model weights came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSource {
    /// The explicitly configured weight file.
    Configured { path: PathBuf },
    /// The first existing file among the search paths.
    Searched { path: PathBuf },
    /// Generic pretrained weights, fetched by the external program.
    Pretrained { name: String },
}

impl ModelSource {
    /// The argument that names the model for the external program.
    pub fn model_arg(&self) -> String {
        match self {
            Self::Configured { path } | Self::Searched { path } => path.display().to_string(),
            Self::Pretrained { name } => name.clone(),
        }
    }

    pub fn is_pretrained(&self) -> bool {
        matches!(self, Self::Pretrained { .. })
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured { path } => write!(f, "configured weights '{}'", path.display()),
            Self::Searched { path } => write!(f, "found weights '{}'", path.display()),
            Self::Pretrained { name } => write!(f, "generic pretrained weights '{}'", name),
        }
    }
}

/// Decide which weights to use.
///
/// An explicit `model_path` must exist. Otherwise the search paths are
/// tried in order. The pretrained fallback is taken only when configured,
/// and it is logged as a warning since it is not a fracture model.
pub fn resolve_model(config: &ModelConfig) -> Result<ModelSource, DetectError> {
    if let Some(path) = &config.model_path {
        if path.is_file() {
            info!("using configured model weights '{}'", path.display());
            return Ok(ModelSource::Configured { path: path.clone() });
        }
        return Err(DetectError::ModelNotFound {
            searched: vec![path.clone()],
        });
    }

    if let Some(path) = config.model_search_paths.iter().find(|path| path.is_file()) {
        info!("using model weights '{}'", path.display());
        return Ok(ModelSource::Searched { path: path.clone() });
    }

    match &config.default_pretrained_name {
        Some(name) => {
            warn!(
                "no trained weights found in {:?}, falling back to generic pretrained weights '{}'",
                config.model_search_paths, name
            );
            Ok(ModelSource::Pretrained { name: name.clone() })
        }
        None => Err(DetectError::ModelNotFound {
            searched: config.model_search_paths.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("best.pt");
        fs::write(&weights, b"").unwrap();

        let config = ModelConfig {
            model_path: Some(weights.clone()),
            model_search_paths: vec![dir.path().join("other.pt")],
            default_pretrained_name: Some("yolo11n.pt".into()),
        };
        assert_eq!(
            resolve_model(&config).unwrap(),
            ModelSource::Configured { path: weights }
        );
    }

    #[test]
    fn missing_configured_path_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            model_path: Some(dir.path().join("missing.pt")),
            model_search_paths: vec![],
            default_pretrained_name: Some("yolo11n.pt".into()),
        };
        assert!(matches!(
            resolve_model(&config),
            Err(DetectError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn first_existing_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("second.pt");
        let third = dir.path().join("third.pt");
        fs::write(&second, b"").unwrap();
        fs::write(&third, b"").unwrap();

        let config = ModelConfig {
            model_path: None,
            model_search_paths: vec![dir.path().join("first.pt"), second.clone(), third],
            default_pretrained_name: None,
        };
        assert_eq!(
            resolve_model(&config).unwrap(),
            ModelSource::Searched { path: second }
        );
    }

    #[test]
    fn pretrained_fallback_is_explicit() {
        let config = ModelConfig {
            model_path: None,
            model_search_paths: vec!["/nonexistent/last.pt".into()],
            default_pretrained_name: Some("yolo11n.pt".into()),
        };
        let source = resolve_model(&config).unwrap();
        assert!(source.is_pretrained());
        assert_eq!(source.model_arg(), "yolo11n.pt");

        let config = ModelConfig {
            default_pretrained_name: None,
            ..config
        };
        assert!(matches!(
            resolve_model(&config),
            Err(DetectError::ModelNotFound { searched }) if searched.len() == 1
        ));
    }
}
