// Extract, append to one member, repack. The patcher never decides whether
// appending is safe; `ensure_backup` has already reset the archive to its
// pristine content before we get here.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::asar;
use crate::error::{PatchError, Result};

/// The member we append the payload to. Fixed by Slack's bundle layout; if
/// it moves, the archive is from a version we do not understand.
pub const TARGET_MEMBER: &str = "dist/preload.bundle.js";

/// Appends `payload` to the target member of `archive`, in place. On repack
/// failure the archive must be treated as corrupted and recovered from
/// backup; the scratch directory is left behind for postmortem inspection.
pub fn patch(archive: &Path, payload: &str) -> Result<()> {
    let scratch = scratch_dir(archive);
    // A crashed earlier run may have left a scratch tree; extracting on top
    // of it could mix two versions.
    if scratch.exists() {
        std::fs::remove_dir_all(&scratch).map_err(|e| PatchError::io(&scratch, e))?;
    }

    asar::extract(archive, &scratch).map_err(|source| PatchError::ExtractionFailed {
        archive: archive.to_path_buf(),
        source,
    })?;
    debug!("Resource is extracted to \"{}\".", scratch.display());

    let member_path = scratch.join(TARGET_MEMBER);
    if !member_path.is_file() {
        return Err(PatchError::MemberNotFound {
            archive: archive.to_path_buf(),
            member: TARGET_MEMBER.to_string(),
        });
    }

    let content =
        std::fs::read_to_string(&member_path).map_err(|e| PatchError::io(&member_path, e))?;
    let modified = format!("{content}\n{payload}\n");
    std::fs::write(&member_path, modified).map_err(|e| PatchError::io(&member_path, e))?;
    debug!("Injected script.");

    asar::create_package(&scratch, archive).map_err(|source| PatchError::RepackFailed {
        archive: archive.to_path_buf(),
        source,
    })?;
    debug!("Resource is re-packed.");

    // Best effort; a leftover scratch dir is harmless and cleaned up by the
    // next run.
    if let Err(e) = std::fs::remove_dir_all(&scratch) {
        warn!("Failed to remove scratch dir {}: {}", scratch.display(), e);
    }
    Ok(())
}

/// SHA-256 of the archive's raw header JSON, hex-encoded. This is the value
/// Electron's asar integrity check pins, surfaced purely as a diagnostic.
pub fn header_hash(archive: &Path) -> Result<String> {
    let header = asar::read_header(archive).map_err(|source| PatchError::ExtractionFailed {
        archive: archive.to_path_buf(),
        source,
    })?;
    let digest = Sha256::digest(header.json.as_bytes());
    Ok(hex::encode(digest))
}

fn scratch_dir(archive: &Path) -> PathBuf {
    let mut scratch = archive.to_path_buf().into_os_string();
    scratch.push(".tmp");
    PathBuf::from(scratch)
}
