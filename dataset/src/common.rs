pub use anyhow::Result;
pub use approx::abs_diff_eq;
pub use indexmap::IndexMap;
pub use itertools::Itertools as _;
pub use log::{info, warn};
pub use rand::{seq::SliceRandom, SeedableRng};
pub use rand_chacha::ChaCha8Rng;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt, fs, io,
    path::{Path, PathBuf},
};
pub use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator as _};
