//! The external detection model seam.

use crate::{common::*, detection::{to_detections, Detection}};

/// A detector that maps an encoded image to detections.
pub trait DetectionModel: Send + Sync {
    fn predict(&self, image: &[u8]) -> Result<Vec<Detection>>;
}

/// Runs `yolo detect predict` on each image and reads its text output.
#[derive(Debug, Clone)]
pub struct YoloCliModel {
    pub executable: PathBuf,
    /// Weight file or pretrained weight name.
    pub model: String,
    pub class_names: Vec<String>,
    pub confidence: Option<R64>,
    pub image_size: Option<NonZeroUsize>,
}

impl DetectionModel for YoloCliModel {
    fn predict(&self, image: &[u8]) -> Result<Vec<Detection>> {
        let imagesize::ImageSize { width, height } =
            imagesize::blob_size(image).map_err(|err| format_err!("{:?}", err))?;

        let work_dir = tempfile::tempdir()?;
        let input = work_dir
            .path()
            .join(format!("input.{}", guess_extension(image)));
        fs::write(&input, image)?;

        let mut command = Command::new(&self.executable);
        command
            .args(["detect", "predict"])
            .arg(format!("model={}", self.model))
            .arg(format!("source={}", input.display()))
            .arg(format!("project={}", work_dir.path().display()))
            .args(["name=pred", "exist_ok=True", "save=False"])
            .args(["save_txt=True", "save_conf=True", "verbose=False"]);
        if let Some(confidence) = self.confidence {
            command.arg(format!("conf={}", confidence));
        }
        if let Some(image_size) = self.image_size {
            command.arg(format!("imgsz={}", image_size));
        }

        let output = command
            .output()
            .with_context(|| format!("failed to launch '{}'", self.executable.display()))?;
        ensure!(
            output.status.success(),
            "'{}' exited with {}: {}",
            self.executable.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );

        // no label file is written when nothing is detected
        let label_file = work_dir.path().join("pred").join("labels").join("input.txt");
        if !label_file.is_file() {
            return Ok(vec![]);
        }
        let labels = label::read_label_file(&label_file)?;

        Ok(to_detections(
            &labels,
            width,
            height,
            &self.class_names,
            self.confidence,
        ))
    }
}

/// File extension matching the image signature. Defaults to `jpg`.
pub fn guess_extension(image: &[u8]) -> &'static str {
    match image {
        [0x89, b'P', b'N', b'G', ..] => "png",
        [b'B', b'M', ..] => "bmp",
        [b'G', b'I', b'F', ..] => "gif",
        [b'I', b'I', 0x2a, 0x00, ..] | [b'M', b'M', 0x00, 0x2a, ..] => "tif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A PNG signature and IHDR chunk of a 640x480 image.
    #[cfg(unix)]
    fn png_640x480() -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&640u32.to_be_bytes());
        bytes.extend_from_slice(&480u32.to_be_bytes());
        bytes.extend_from_slice(&[8, 2, 0, 0, 0, 0, 0, 0, 0]);
        bytes
    }

    /// Write a shell script standing in for the `yolo` program.
    ///
    /// It records its arguments to `args_file`, then runs `body` with
    /// `$out` set to the prediction directory.
    #[cfg(unix)]
    fn fake_yolo(path: &Path, args_file: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let script = format!(
            "#!/bin/sh\n\
             echo \"$@\" > '{}'\n\
             for arg in \"$@\"; do\n\
             case \"$arg\" in\n\
             project=*) project=\"${{arg#project=}}\" ;;\n\
             name=*) name=\"${{arg#name=}}\" ;;\n\
             esac\n\
             done\n\
             out=\"$project/$name\"\n\
             {}\n",
            args_file.display(),
            body
        );
        fs::write(path, script).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    fn model(executable: PathBuf) -> YoloCliModel {
        YoloCliModel {
            executable,
            model: "best.pt".into(),
            class_names: vec!["fracture".into()],
            confidence: Some(r64(0.25)),
            image_size: NonZeroUsize::new(320),
        }
    }

    #[cfg(unix)]
    #[test]
    fn predict_with_external_program() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args.txt");
        let detecting = dir.path().join("yolo-detecting");
        let silent = dir.path().join("yolo-silent");
        let failing = dir.path().join("yolo-failing");

        // all scripts are written before any of them is spawned
        fake_yolo(
            &detecting,
            &args_file,
            "mkdir -p \"$out/labels\"\n\
             printf '0 0.5 0.5 0.5 0.5 0.9\\n1 0.1 0.1 0.1 0.1 0.1\\n' > \"$out/labels/input.txt\"",
        );
        fake_yolo(&silent, &args_file, "true");
        fake_yolo(&failing, &args_file, "echo 'model not found' >&2\nexit 1");

        let image = png_640x480();

        let detections = model(detecting).predict(&image).unwrap();
        assert_eq!(
            detections,
            [Detection {
                class_id: 0,
                class_name: "fracture".into(),
                confidence: 0.9,
                bbox: [160.0, 120.0, 480.0, 360.0],
            }]
        );

        let args = fs::read_to_string(&args_file).unwrap();
        let args: Vec<_> = args.split_whitespace().collect();
        assert_eq!(args[..3], ["detect", "predict", "model=best.pt"]);
        assert!(args[3].starts_with("source=") && args[3].ends_with("input.png"));
        assert!(args.contains(&"name=pred"));
        assert!(args.contains(&"save_txt=True"));
        assert!(args.contains(&"save_conf=True"));
        assert!(args.contains(&"conf=0.25"));
        assert!(args.contains(&"imgsz=320"));

        // no label file is written when nothing is found
        assert!(model(silent).predict(&image).unwrap().is_empty());

        let err = model(failing).predict(&image).unwrap_err();
        assert!(format!("{:#}", err).contains("model not found"));
    }

    #[test]
    fn extension_from_signature() {
        assert_eq!(guess_extension(&[0x89, b'P', b'N', b'G', 0x0d]), "png");
        assert_eq!(guess_extension(&[0xff, 0xd8, 0xff, 0xe0]), "jpg");
        assert_eq!(guess_extension(b"RIFF\0\0\0\0WEBPVP8 "), "webp");
        assert_eq!(guess_extension(b"BM\0\0"), "bmp");
        assert_eq!(guess_extension(&[]), "jpg");
    }
}
