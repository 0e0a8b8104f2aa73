// Picks the newest installed Slack version. Slack on Windows keeps every
// installed version as a sibling directory named `app-<major>.<minor>` or
// `app-<major>.<minor>.<patch>` and we always patch the one the launcher
// would start.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{PatchError, Result};

/// A version parsed from an `app-X.Y[.Z]` directory name. A missing patch
/// component counts as 0, so `app-4.36` and `app-4.36.0` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstallVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl InstallVersion {
    /// Parses a directory name of the form `app-X.Y` or `app-X.Y.Z`.
    /// Returns None for anything else; the caller skips those entries.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let version = name.strip_prefix("app-")?;
        let mut parts = version.split('.');
        let major = parse_component(parts.next()?)?;
        let minor = parse_component(parts.next()?)?;
        let patch = match parts.next() {
            Some(part) => parse_component(part)?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Returns the path of the highest-versioned `app-*` subdirectory of
/// `slack_dir`. The returned path uses the directory name as it appears on
/// disk, not a re-serialized version string.
pub fn resolve_install_dir(slack_dir: &Path) -> Result<PathBuf> {
    if !slack_dir.is_dir() {
        return Err(PatchError::DirectoryNotFound(slack_dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(slack_dir).map_err(|e| PatchError::io(slack_dir, e))?;

    let mut candidates: Vec<(InstallVersion, String)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PatchError::io(slack_dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        match InstallVersion::from_dir_name(&name) {
            Some(version) => candidates.push((version, name)),
            None => debug!("Skipping non-version directory \"{}\"", name),
        }
    }

    // Tie-break equal versions on the literal name so the result does not
    // depend on readdir order.
    let (_, name) = candidates
        .into_iter()
        .max()
        .ok_or_else(|| PatchError::NoVersionFound(slack_dir.to_path_buf()))?;

    info!("Use \"{}\".", name);
    Ok(slack_dir.join(name))
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    fn version(major: u64, minor: u64, patch: u64) -> InstallVersion {
        InstallVersion {
            major,
            minor,
            patch,
        }
    }

    #[test]
    fn parses_two_and_three_component_names() {
        assert_eq!(
            InstallVersion::from_dir_name("app-4.36"),
            Some(version(4, 36, 0))
        );
        assert_eq!(
            InstallVersion::from_dir_name("app-4.36.140"),
            Some(version(4, 36, 140))
        );
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "app-latest",
            "app-4",
            "app-4.36.140.1",
            "app-4..1",
            "app-4.1x",
            "app-v4.1",
            "app-",
            "foo",
            "app-4.-1",
        ] {
            assert_eq!(InstallVersion::from_dir_name(name), None, "{}", name);
        }
    }

    #[test]
    fn missing_patch_compares_as_zero() {
        assert_eq!(
            InstallVersion::from_dir_name("app-4.36").unwrap(),
            InstallVersion::from_dir_name("app-4.36.0").unwrap()
        );
    }

    #[test]
    fn orders_numerically_not_lexicographically() {
        assert!(
            InstallVersion::from_dir_name("app-4.10.0").unwrap()
                > InstallVersion::from_dir_name("app-4.2.0").unwrap()
        );
    }

    fn dir_with(names: &[&str]) -> TempDir {
        let tmp_dir = TempDir::new("version_test").unwrap();
        for name in names {
            std::fs::create_dir(tmp_dir.path().join(name)).unwrap();
        }
        tmp_dir
    }

    #[test]
    fn resolves_highest_version() {
        let tmp_dir = dir_with(&["app-4.1.0", "app-4.2.0", "app-4.10.0"]);
        let resolved = resolve_install_dir(tmp_dir.path()).unwrap();
        assert_eq!(resolved, tmp_dir.path().join("app-4.10.0"));
    }

    #[test]
    fn ignores_files_and_non_version_directories() {
        let tmp_dir = dir_with(&["app-4.36.140", "app-latest", "packages"]);
        std::fs::write(tmp_dir.path().join("app-9.9.9"), b"not a dir").unwrap();
        let resolved = resolve_install_dir(tmp_dir.path()).unwrap();
        assert_eq!(resolved, tmp_dir.path().join("app-4.36.140"));
    }

    #[test]
    fn returns_literal_directory_name() {
        // `app-4.36` must come back as written, not as `app-4.36.0`.
        let tmp_dir = dir_with(&["app-4.36", "app-4.35.1"]);
        let resolved = resolve_install_dir(tmp_dir.path()).unwrap();
        assert_eq!(resolved, tmp_dir.path().join("app-4.36"));
    }

    #[test]
    fn tie_between_equal_versions_is_deterministic() {
        let tmp_dir = dir_with(&["app-4.36.0", "app-4.36"]);
        let resolved = resolve_install_dir(tmp_dir.path()).unwrap();
        assert_eq!(resolved, tmp_dir.path().join("app-4.36.0"));
    }

    #[test]
    fn errs_when_no_version_matches() {
        let tmp_dir = dir_with(&["foo", "app-latest"]);
        assert!(matches!(
            resolve_install_dir(tmp_dir.path()),
            Err(PatchError::NoVersionFound(_))
        ));
    }

    #[test]
    fn errs_when_root_is_missing() {
        let tmp_dir = TempDir::new("version_test").unwrap();
        let missing = tmp_dir.path().join("nope");
        assert!(matches!(
            resolve_install_dir(&missing),
            Err(PatchError::DirectoryNotFound(_))
        ));
    }
}
