// This is a required file for rust libraries which declares what files are
// part of the library and what interfaces are public from the library.

// The archive codec is public so tools and tests can build or inspect
// archives directly; everything above it goes through the workflow API.
pub mod asar;

mod backup;
mod error;
mod logging;
mod patcher;
mod paths;
mod payload;
mod restyler;
mod version;

pub use self::backup::{ensure_backup, restore, restore_all, BackupState};
pub use self::error::{PatchError, Result};
pub use self::logging::init_logging;
pub use self::patcher::{header_hash, patch, TARGET_MEMBER};
pub use self::paths::{ArtifactPair, InstallPaths, EXECUTABLE_NAME, RESOURCE_ARCHIVE};
pub use self::payload::build_payload;
pub use self::restyler::{apply, recover, ApplyOutcome, PatchConfig, DEFAULT_CSS_BASE_URL};
pub use self::version::{resolve_install_dir, InstallVersion};

// Re-exported so CLI and tests can build configs without depending on the
// url crate themselves.
pub use url::Url;

#[cfg(test)]
extern crate tempdir;
