// Artifact discovery
// Every raw input is located by a glob pattern relative to the session folder

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::AcquisitionError;

/// Raw artifacts a session folder is expected to contain exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    AcquisitionFolder,
    ProbeMetadata,
    TonguePose,
    EyePose,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::AcquisitionFolder => "acquisition_folder",
            ArtifactKind::ProbeMetadata => "probe_metadata",
            ArtifactKind::TonguePose => "tongue_pose",
            ArtifactKind::EyePose => "eye_pose",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::AcquisitionFolder => "acquisition log folder",
            ArtifactKind::ProbeMetadata => "probe metadata",
            ArtifactKind::TonguePose => "tongue pose estimate",
            ArtifactKind::EyePose => "eye pose estimate",
        };
        f.write_str(name)
    }
}

/// Resolve `pattern` under `session_dir` to exactly one path
/// Zero or several matches are both errors; nothing is guessed
pub fn locate_artifact(
    session_dir: &Path,
    kind: ArtifactKind,
    pattern: &str,
) -> Result<PathBuf, AcquisitionError> {
    let full_pattern = session_dir.join(pattern);
    let full_pattern = full_pattern.to_string_lossy();

    let mut matches: Vec<PathBuf> = glob::glob(&full_pattern)?
        .filter_map(Result::ok)
        .collect();

    match matches.len() {
        0 => Err(AcquisitionError::ArtifactNotFound {
            kind,
            pattern: pattern.to_string(),
        }),
        1 => {
            let path = matches.remove(0);
            log::debug!("Located {} at {}", kind, path.display());
            Ok(path)
        }
        count => Err(AcquisitionError::AmbiguousArtifact {
            kind,
            pattern: pattern.to_string(),
            count,
        }),
    }
}
