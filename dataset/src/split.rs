//! Seeded train/val/test partitioning.

use crate::{common::*, error::PrepareError, record::ImageRecord};

/// The seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 42;

/// Allowed deviation of the ratio sum from 1.0.
pub const RATIO_TOLERANCE: f64 = 1e-6;

/// A disjoint partition of the corpus.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    /// All splits in pipeline order.
    pub fn all() -> impl Iterator<Item = Split> {
        Split::iter()
    }

    /// Directory name of the split under `images/` and `labels/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

/// Fractions of the corpus assigned to each split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            val: 0.2,
            test: 0.1,
        }
    }
}

impl SplitRatios {
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self, PrepareError> {
        let ratios = Self { train, val, test };
        ratios.validate()?;
        Ok(ratios)
    }

    /// Check that every ratio is within [0, 1] and the sum is 1.
    pub fn validate(&self) -> Result<(), PrepareError> {
        let Self { train, val, test } = *self;

        for (name, value) in [("train", train), ("val", val), ("test", test)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(PrepareError::InvalidRatio {
                    reason: format!("{} ratio must be within [0, 1], but get {}", name, value),
                });
            }
        }

        let sum = train + val + test;
        if !abs_diff_eq!(sum, 1.0, epsilon = RATIO_TOLERANCE) {
            return Err(PrepareError::InvalidRatio {
                reason: format!(
                    "ratios must sum to 1.0, but get {} + {} + {} = {}",
                    train, val, test, sum
                ),
            });
        }

        Ok(())
    }

    /// Number of train and val records for a corpus of `total` records.
    ///
    /// Each count is the floor of the ratio times the total; the test
    /// split receives the remainder.
    pub fn counts(&self, total: usize) -> (usize, usize) {
        let train = ((total as f64 * self.train).floor() as usize).min(total);
        let val = ((total as f64 * self.val).floor() as usize).min(total - train);
        (train, val)
    }
}

/// Each record assigned to exactly one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
    pub seed: u64,
    pub train: Vec<ImageRecord>,
    pub val: Vec<ImageRecord>,
    pub test: Vec<ImageRecord>,
}

impl SplitAssignment {
    pub fn get(&self, split: Split) -> &[ImageRecord] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over `(split, record)` pairs in split order.
    pub fn iter(&self) -> impl Iterator<Item = (Split, &ImageRecord)> {
        Split::all().flat_map(move |split| self.get(split).iter().map(move |record| (split, record)))
    }
}

/// Shuffle `records` with `seed` and cut them into train, val and test.
///
/// The ratios are validated before anything else. The same records in
/// the same order with the same seed always give the same assignment on
/// every platform.
pub fn partition(
    records: Vec<ImageRecord>,
    ratios: &SplitRatios,
    seed: u64,
) -> Result<SplitAssignment, PrepareError> {
    ratios.validate()?;

    let mut records = records;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    records.shuffle(&mut rng);

    let (train_size, val_size) = ratios.counts(records.len());
    let test = records.split_off(train_size + val_size);
    let val = records.split_off(train_size);
    let train = records;

    Ok(SplitAssignment {
        seed,
        train,
        val,
        test,
    })
}
