//! Writing the YOLO directory tree for a split assignment.

use crate::{
    common::*,
    error::PrepareError,
    split::{Split, SplitAssignment},
};

/// Per-split statistics of a materialized corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub images: usize,
    /// Label files copied from source annotations.
    pub annotated: usize,
    /// Label files created empty because no annotation exists.
    pub empty_labels: usize,
}

/// The on-disk result of [materialize].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionedCorpus {
    pub output_dir: PathBuf,
    pub splits: IndexMap<Split, SplitSummary>,
}

impl PartitionedCorpus {
    pub fn image_dir(&self, split: Split) -> PathBuf {
        image_dir(&self.output_dir, split)
    }

    pub fn label_dir(&self, split: Split) -> PathBuf {
        label_dir(&self.output_dir, split)
    }

    pub fn total_images(&self) -> usize {
        self.splits.values().map(|summary| summary.images).sum()
    }
}

pub fn image_dir(output_dir: &Path, split: Split) -> PathBuf {
    output_dir.join("images").join(split.dir_name())
}

pub fn label_dir(output_dir: &Path, split: Split) -> PathBuf {
    output_dir.join("labels").join(split.dir_name())
}

/// Copy images and labels of each split into `output_dir`.
///
/// Images go to `images/<split>/` and labels to `labels/<split>/`. An image
/// without a source annotation gets an empty label file. Existing files
/// are overwritten, so running it twice leaves the same tree.
pub fn materialize(
    assignment: &SplitAssignment,
    output_dir: impl AsRef<Path>,
) -> Result<PartitionedCorpus, PrepareError> {
    let output_dir = output_dir.as_ref();

    for split in Split::all() {
        for dir in [image_dir(output_dir, split), label_dir(output_dir, split)] {
            fs::create_dir_all(&dir).map_err(|err| PrepareError::write(&dir, err))?;
        }
    }

    let mut splits = IndexMap::new();

    for split in Split::all() {
        info!("copying files for {}", split);
        let image_dir = image_dir(output_dir, split);
        let label_dir = label_dir(output_dir, split);
        let mut summary = SplitSummary::default();

        for record in assignment.get(split) {
            let image_dst = image_dir.join(record.file_name());
            copy_file(&record.path, &image_dst)?;
            summary.images += 1;

            let label_dst = label_dir.join(format!("{}.txt", record.stem()));
            match &record.annotation {
                Some(annotation) => {
                    copy_file(annotation, &label_dst)?;
                    summary.annotated += 1;
                }
                None => {
                    fs::File::create(&label_dst)
                        .map_err(|err| PrepareError::write(&label_dst, err))?;
                    summary.empty_labels += 1;
                }
            }
        }

        info!(
            "{}: {} images with annotations, {} empty labels",
            split, summary.annotated, summary.empty_labels
        );
        splits.insert(split, summary);
    }

    Ok(PartitionedCorpus {
        output_dir: output_dir.to_owned(),
        splits,
    })
}

fn copy_file(src: &Path, dst: &Path) -> Result<(), PrepareError> {
    if !src.is_file() {
        return Err(PrepareError::read(
            src,
            io::Error::new(io::ErrorKind::NotFound, "source file vanished"),
        ));
    }
    fs::copy(src, dst).map_err(|err| PrepareError::write(dst, err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Finding, ImageRecord};

    #[test]
    fn materialize_creates_empty_labels_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        fs::create_dir_all(&src).unwrap();

        let image_a = src.join("a.jpg");
        let image_b = src.join("b.jpg");
        let label_a = src.join("a.txt");
        fs::write(&image_a, b"image-a").unwrap();
        fs::write(&image_b, b"image-b").unwrap();
        fs::write(&label_a, "0 0.5 0.5 0.1 0.1\n").unwrap();

        let assignment = SplitAssignment {
            seed: 0,
            train: vec![ImageRecord {
                path: image_a,
                finding: Finding::Positive,
                annotation: Some(label_a),
            }],
            val: vec![],
            test: vec![ImageRecord {
                path: image_b,
                finding: Finding::Negative,
                annotation: None,
            }],
        };

        let corpus = materialize(&assignment, &out).unwrap();
        assert_eq!(corpus.total_images(), 2);
        assert_eq!(corpus.splits[&Split::Train].annotated, 1);
        assert_eq!(corpus.splits[&Split::Test].empty_labels, 1);
        assert!(corpus.image_dir(Split::Val).is_dir());

        let empty_label = corpus.label_dir(Split::Test).join("b.txt");
        assert_eq!(fs::metadata(&empty_label).unwrap().len(), 0);

        // a stale label is replaced, not appended to
        fs::write(&empty_label, "garbage").unwrap();
        let again = materialize(&assignment, &out).unwrap();
        assert_eq!(again, corpus);
        assert_eq!(fs::metadata(&empty_label).unwrap().len(), 0);
        assert_eq!(
            fs::read_to_string(corpus.label_dir(Split::Train).join("a.txt")).unwrap(),
            "0 0.5 0.5 0.1 0.1\n"
        );
    }
}
