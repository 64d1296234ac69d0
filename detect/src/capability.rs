//! Availability of the external detection program.

use crate::common::*;

/// Whether the external program can be run, probed once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capability {
    Available { executable: PathBuf },
    Unavailable { reason: String },
}

impl Capability {
    /// Locate `executable`. Bare names are searched in `PATH`.
    pub fn probe(executable: impl AsRef<Path>) -> Self {
        let executable = executable.as_ref();

        let found = if executable.components().count() > 1 || executable.is_absolute() {
            executable.is_file().then(|| executable.to_owned())
        } else {
            env::var_os("PATH").and_then(|paths| {
                env::split_paths(&paths).find_map(|dir| {
                    let candidate = dir.join(executable);
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                    let candidate = candidate.with_extension(env::consts::EXE_EXTENSION);
                    candidate.is_file().then(|| candidate)
                })
            })
        };

        match found {
            Some(executable) => {
                info!("detection program found at '{}'", executable.display());
                Capability::Available { executable }
            }
            None => {
                let reason = format!("'{}' not found", executable.display());
                warn!("{}, detections will be mocked", reason);
                Capability::Unavailable { reason }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}
