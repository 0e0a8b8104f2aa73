// The backup/restore state machine. The one rule that keeps repeated runs
// safe: once a backup exists it is the pristine original and is never
// written to again. Re-running `apply` restores from it before patching, so
// we always patch a clean base and never double-inject.

use std::path::Path;

use log::{debug, error, info};

use crate::error::{PatchError, Result};
use crate::paths::ArtifactPair;

/// Outcome of `ensure_backup`. Both are success; `AlreadyPresent` means the
/// original was reset to its pristine content from an earlier run's backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupState {
    Created,
    AlreadyPresent,
}

/// Establishes the backup invariant for one pair:
/// - no backup yet: capture original -> backup (exactly once, ever);
/// - backup exists: restore backup -> original, discarding any prior patch.
pub fn ensure_backup(pair: &ArtifactPair) -> Result<BackupState> {
    if backup_exists(pair)? {
        debug!(
            "The {} backup already exists as \"{}\". Skipped.",
            pair.label,
            pair.backup.display()
        );
        // Clean the original to remove previous injections. Never the other
        // direction: that would overwrite the pristine backup with a
        // patched file.
        copy(&pair.backup, &pair.original)?;
        Ok(BackupState::AlreadyPresent)
    } else {
        copy(&pair.original, &pair.backup)?;
        info!(
            "Made a {} backup as \"{}\".",
            pair.label,
            pair.backup.display()
        );
        Ok(BackupState::Created)
    }
}

/// Restores the original from its backup. The backup is left in place so
/// further apply/recover cycles stay possible.
pub fn restore(pair: &ArtifactPair) -> Result<()> {
    if !backup_exists(pair)? {
        return Err(PatchError::BackupMissing(pair.original.clone()));
    }
    copy(&pair.backup, &pair.original)?;
    info!("Recovered from \"{}\".", pair.backup.display());
    Ok(())
}

/// Restores every pair, attempting all of them even when one fails, then
/// reports the first failure. A missing executable backup must not stop the
/// resource from being restored.
pub fn restore_all<'a>(pairs: impl IntoIterator<Item = &'a ArtifactPair>) -> Result<()> {
    let mut first_error = None;
    for pair in pairs {
        if let Err(e) = restore(pair) {
            error!("Failed to restore {}: {}", pair.label, e);
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

// Explicit existence check. Stat errors other than NotFound (permissions,
// for instance) are real failures, not "no backup".
fn backup_exists(pair: &ArtifactPair) -> Result<bool> {
    match std::fs::metadata(&pair.backup) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PatchError::io(&pair.backup, e)),
    }
}

// A failed copy is attributed to the destination (the usual culprit when an
// install is locked), with the source path kept in the message so the
// operator sees both ends.
fn copy(from: &Path, to: &Path) -> Result<()> {
    std::fs::copy(from, to).map(|_| ()).map_err(|e| {
        let source = std::io::Error::new(
            e.kind(),
            format!("copy from {}: {}", from.display(), e),
        );
        PatchError::io(to, source)
    })
}
