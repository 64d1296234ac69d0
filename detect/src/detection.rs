//! Detection records as returned to clients.

use crate::common::*;

/// One predicted object instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_id: usize,
    pub class_name: String,
    /// Class confidence in [0, 1].
    pub confidence: f64,
    /// `[x1, y1, x2, y2]` in pixel units of the input image.
    pub bbox: [f64; 4],
}

/// The placeholder returned when the detection program is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockDetection {
    pub message: String,
    pub note: String,
    /// Always true, so clients can tell it from a real detection.
    pub mock_detection: bool,
    pub class_name: String,
    pub confidence: f64,
    pub bbox: [f64; 4],
}

impl Default for MockDetection {
    fn default() -> Self {
        Self {
            message: "YOLO not installed".into(),
            note: "Install with: pip install ultralytics".into(),
            mock_detection: true,
            class_name: "example".into(),
            confidence: 0.95,
            bbox: [100.0, 100.0, 200.0, 200.0],
        }
    }
}

/// Convert YOLO prediction labels into pixel-space detections.
///
/// Boxes below `min_confidence` are dropped. Unknown class ids are named
/// `class_<id>`.
pub fn to_detections(
    labels: &[label::YoloLabel],
    width: usize,
    height: usize,
    class_names: &[String],
    min_confidence: Option<R64>,
) -> Vec<Detection> {
    labels
        .iter()
        .filter(|label| match (label.confidence, min_confidence) {
            (Some(confidence), Some(min)) => confidence >= min,
            _ => true,
        })
        .map(|label| Detection {
            class_id: label.class,
            class_name: class_names
                .get(label.class)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", label.class)),
            confidence: label.confidence.map(|conf| conf.raw()).unwrap_or(1.0),
            bbox: label.to_pixel_tlbr(width, height),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn convert_and_filter() {
        let labels: Vec<label::YoloLabel> = ["0 0.5 0.5 0.5 0.5 0.9", "3 0.25 0.25 0.1 0.1 0.1"]
            .iter()
            .map(|line| line.parse().unwrap())
            .collect();
        let names = vec!["fracture".to_owned()];

        let detections = to_detections(&labels, 100, 200, &names, None);
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_name, "fracture");
        assert_eq!(detections[1].class_name, "class_3");
        assert_abs_diff_eq!(detections[0].confidence, 0.9);
        assert_abs_diff_eq!(detections[0].bbox[0], 25.0);
        assert_abs_diff_eq!(detections[0].bbox[3], 150.0);

        let detections = to_detections(&labels, 100, 200, &names, Some(r64(0.5)));
        assert_eq!(detections.len(), 1);
    }

    #[test]
    fn serialized_field_names() {
        let detection = Detection {
            class_id: 0,
            class_name: "fracture".into(),
            confidence: 0.5,
            bbox: [1.0, 2.0, 3.0, 4.0],
        };
        let value = serde_json::to_value(&detection).unwrap();
        assert_eq!(value["class"], 0);
        assert_eq!(value["bbox"], json!([1.0, 2.0, 3.0, 4.0]));

        let mock = serde_json::to_value(MockDetection::default()).unwrap();
        assert_eq!(mock["mock_detection"], true);
    }
}
