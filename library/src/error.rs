// Error taxonomy for the whole patch workflow. Every variant carries the
// offending path so the operator can diagnose without re-running.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug)]
pub enum PatchError {
    /// The configured Slack directory does not exist or is not a directory.
    DirectoryNotFound(PathBuf),
    /// The Slack directory contains no `app-X.Y[.Z]` subdirectories.
    NoVersionFound(PathBuf),
    /// `recover` was asked to restore a file that was never backed up.
    BackupMissing(PathBuf),
    /// The asar archive could not be read or unpacked.
    ExtractionFailed {
        archive: PathBuf,
        source: anyhow::Error,
    },
    /// The extracted archive does not contain the member we patch. Usually
    /// means an incompatible Slack version.
    MemberNotFound { archive: PathBuf, member: String },
    /// Repacking the scratch directory failed; the archive on disk must be
    /// considered corrupted and recovered from backup.
    RepackFailed {
        archive: PathBuf,
        source: anyhow::Error,
    },
    /// The CSS base URL did not parse as an absolute URL.
    InvalidUrl {
        input: String,
        source: url::ParseError,
    },
    /// Any other filesystem failure.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for PatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchError::DirectoryNotFound(path) => {
                write!(f, "Directory not found: {}", path.display())
            }
            PatchError::NoVersionFound(path) => {
                write!(f, "No app-<version> directory found in {}", path.display())
            }
            PatchError::BackupMissing(path) => {
                write!(f, "No backup for {}", path.display())
            }
            PatchError::ExtractionFailed { archive, source } => {
                write!(f, "Failed to extract {}: {:#}", archive.display(), source)
            }
            PatchError::MemberNotFound { archive, member } => {
                write!(f, "{} not found in {}", member, archive.display())
            }
            PatchError::RepackFailed { archive, source } => {
                write!(f, "Failed to repack {}: {:#}", archive.display(), source)
            }
            PatchError::InvalidUrl { input, source } => {
                write!(f, "Invalid CSS base URL \"{}\": {}", input, source)
            }
            PatchError::Io { path, source } => {
                write!(f, "IO error on {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for PatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatchError::ExtractionFailed { source, .. }
            | PatchError::RepackFailed { source, .. } => Some(source.as_ref()),
            PatchError::InvalidUrl { source, .. } => Some(source),
            PatchError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl PatchError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        PatchError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;
