//! YOLO label file format.
//!
//! Each non-empty line describes one box as `class cx cy w h`, where the
//! center and size are normalized by the image dimensions. Prediction
//! outputs append a confidence score as the sixth column.

use anyhow::{bail, ensure, Context, Result};
use itertools::Itertools;
use noisy_float::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};

/// One bounding box in normalized center format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YoloLabel {
    pub class: usize,
    pub cx: R64,
    pub cy: R64,
    pub w: R64,
    pub h: R64,
    /// Present on prediction outputs only.
    pub confidence: Option<R64>,
}

impl YoloLabel {
    /// Convert to `[x1, y1, x2, y2]` in pixel units of a `width` x `height` image.
    pub fn to_pixel_tlbr(&self, width: usize, height: usize) -> [f64; 4] {
        let width = width as f64;
        let height = height as f64;
        let cx = self.cx.raw() * width;
        let cy = self.cy.raw() * height;
        let half_w = self.w.raw() * width / 2.0;
        let half_h = self.h.raw() * height / 2.0;
        [cx - half_w, cy - half_h, cx + half_w, cy + half_h]
    }
}

impl FromStr for YoloLabel {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        parse_line(line)?.ok_or_else(|| anyhow::format_err!("empty label line"))
    }
}

impl fmt::Display for YoloLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {} {}", self.class, self.cx, self.cy, self.w, self.h)?;
        if let Some(confidence) = self.confidence {
            write!(f, " {}", confidence)?;
        }
        Ok(())
    }
}

/// Parse a single label line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<YoloLabel>> {
    let tokens: Vec<_> = line.split_whitespace().take(7).collect();

    let (class, values) = match tokens.as_slice() {
        [] => return Ok(None),
        [class, values @ ..] if values.len() == 4 || values.len() == 5 => (class, values),
        _ => bail!(
            "expect 5 or 6 columns in a label line, but found {}",
            tokens.len()
        ),
    };

    let class: usize = class
        .parse()
        .with_context(|| format!("invalid class id '{}'", class))?;
    let values: Vec<R64> = values
        .iter()
        .map(|token| -> Result<_> {
            let value: f64 = token
                .parse()
                .with_context(|| format!("invalid number '{}'", token))?;
            R64::try_new(value).ok_or_else(|| anyhow::format_err!("not a finite value '{}'", token))
        })
        .try_collect()?;

    let (cx, cy, w, h) = (values[0], values[1], values[2], values[3]);
    ensure!(
        w >= 0.0 && h >= 0.0,
        "box size must be non-negative, but get w={} h={}",
        w,
        h
    );
    let confidence = values.get(4).copied();
    if let Some(confidence) = confidence {
        ensure!(
            (0.0..=1.0).contains(&confidence.raw()),
            "confidence must be within [0, 1], but get {}",
            confidence
        );
    }

    Ok(Some(YoloLabel {
        class,
        cx,
        cy,
        w,
        h,
        confidence,
    }))
}

/// Read every box from a label file. An empty file yields no boxes.
pub fn read_label_file(path: impl AsRef<Path>) -> Result<Vec<YoloLabel>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read label file '{}'", path.display()))?;

    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            parse_line(line)
                .with_context(|| format!("'{}' line {}", path.display(), index + 1))
                .transpose()
        })
        .try_collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parse_annotation_line() {
        let label = parse_line("0 0.5 0.25 0.2 0.1").unwrap().unwrap();
        assert_eq!(label.class, 0);
        assert_eq!(label.cx, r64(0.5));
        assert_eq!(label.cy, r64(0.25));
        assert_eq!(label.confidence, None);
    }

    #[test]
    fn parse_prediction_line() {
        let label: YoloLabel = "1 0.5 0.5 1.0 1.0 0.875".parse().unwrap();
        assert_eq!(label.class, 1);
        assert_eq!(label.confidence, Some(r64(0.875)));
    }

    #[test]
    fn blank_line_is_skipped() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn reject_malformed_lines() {
        assert!(parse_line("0 0.5 0.5 0.1").is_err());
        assert!(parse_line("0 0.1 0.2 0.3 0.4 0.5 0.6 0.7").is_err());
        assert!(parse_line("-1 0.5 0.5 0.1 0.1").is_err());
        assert!(parse_line("0 0.5 0.5 x 0.1").is_err());
        assert!(parse_line("0 0.5 0.5 0.1 0.1 1.5").is_err());
    }

    #[test]
    fn pixel_tlbr_conversion() {
        let label = parse_line("0 0.5 0.5 0.5 0.25").unwrap().unwrap();
        let [x1, y1, x2, y2] = label.to_pixel_tlbr(200, 400);
        assert_abs_diff_eq!(x1, 50.0);
        assert_abs_diff_eq!(y1, 150.0);
        assert_abs_diff_eq!(x2, 150.0);
        assert_abs_diff_eq!(y2, 250.0);
    }

    #[test]
    fn read_file_with_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.txt");
        fs::write(&path, "0 0.5 0.5 0.1 0.1\n\n0 0.2 0.2 0.1 0.1\n").unwrap();
        let labels = read_label_file(&path).unwrap();
        assert_eq!(labels.len(), 2);

        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "").unwrap();
        assert!(read_label_file(&empty).unwrap().is_empty());
    }

    #[test]
    fn read_file_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        fs::write(&path, "0 0.5 0.5 0.1 0.1\n0 oops\n").unwrap();
        let err = read_label_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}
