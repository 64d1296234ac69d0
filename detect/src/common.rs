pub use anyhow::{ensure, format_err, Context as _, Result};
pub use log::{info, warn};
pub use noisy_float::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value};
pub use std::{
    env, fmt, fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    process::Command,
};
