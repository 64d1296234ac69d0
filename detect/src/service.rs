//! Framework-independent request handlers of the detection API.

use crate::{
    common::*,
    detection::MockDetection,
    detector::Detector,
    error::DetectError,
};

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

const INSTALL_HINT: &str = "Make sure ultralytics is installed: pip install ultralytics";

/// An uploaded image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Read an upload from a local file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read image '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            content_type: None,
            bytes,
        })
    }
}

/// A status code and JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn missing_image() -> Self {
        Self::new(STATUS_BAD_REQUEST, json!({ "error": "No image provided" }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug)]
pub struct Service {
    detector: Detector,
}

impl Service {
    pub fn new(detector: Detector) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Run detection on an uploaded image.
    pub fn detect(&self, upload: Option<&Upload>, additional_data: Value) -> Response {
        let upload = match upload {
            Some(upload) => upload,
            None => return Response::missing_image(),
        };

        let detections = match self.detector.detect(&upload.bytes) {
            Ok(detections) => serde_json::to_value(detections),
            Err(DetectError::DependencyUnavailable { reason }) => {
                warn!("returning a mock detection: {}", reason);
                serde_json::to_value([MockDetection::default()])
            }
            Err(err) => {
                warn!("detection failed on '{}': {:#}", upload.name, err);
                return Response::new(
                    STATUS_INTERNAL_SERVER_ERROR,
                    json!({
                        "error": format!("YOLO processing error: {}", err),
                        "message": INSTALL_HINT,
                    }),
                );
            }
        };

        match detections {
            Ok(detections) => Response::new(
                STATUS_OK,
                json!({
                    "success": true,
                    "detections": detections,
                    "image_name": upload.name,
                    "image_size": upload.bytes.len(),
                    "additional_data": additional_data,
                }),
            ),
            Err(err) => Response::new(
                STATUS_INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            ),
        }
    }

    /// Acknowledge an uploaded image and echo its metadata.
    pub fn upload(&self, upload: Option<&Upload>, description: &str, tags: &str) -> Response {
        let upload = match upload {
            Some(upload) => upload,
            None => return Response::missing_image(),
        };

        Response::new(
            STATUS_CREATED,
            json!({
                "success": true,
                "message": "Image received successfully",
                "image_name": upload.name,
                "image_size": upload.bytes.len(),
                "content_type": upload.content_type,
                "description": description,
                "tags": tags,
            }),
        )
    }

    pub fn health(&self) -> Response {
        Response::new(
            STATUS_OK,
            json!({
                "status": "healthy",
                "message": "API is running",
                "yolo_available": !self.detector.is_mock(),
                "model_source": self.detector.model_source(),
            }),
        )
    }
}
