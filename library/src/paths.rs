// Derives the on-disk locations of the artifacts we manage for a given
// Slack install. Only two files are ever touched: the packed resource
// archive and the executable, each with a `.backup` sibling.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::version::resolve_install_dir;

pub const RESOURCE_ARCHIVE: &str = "app.asar";
pub const EXECUTABLE_NAME: &str = "slack.exe";

const BACKUP_EXTENSION: &str = "backup";

/// One managed (original, backup) file pair. The backup always lives next
/// to the original as `<original>.backup`.
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    /// Short name used in log and error messages ("resource", "executable").
    pub label: &'static str,
    pub original: PathBuf,
    pub backup: PathBuf,
}

impl ArtifactPair {
    fn new(label: &'static str, original: PathBuf) -> Self {
        let mut backup = original.clone().into_os_string();
        backup.push(".");
        backup.push(BACKUP_EXTENSION);
        Self {
            label,
            original,
            backup: PathBuf::from(backup),
        }
    }
}

/// All paths for the active install: the versioned app directory, the
/// resource archive pair and the executable pair.
#[derive(Debug)]
pub struct InstallPaths {
    pub install_dir: PathBuf,
    pub resource: ArtifactPair,
    pub executable: ArtifactPair,
}

impl InstallPaths {
    /// Resolves the newest installed version under `slack_dir` and derives
    /// the artifact paths from it. Read-only.
    pub fn locate(slack_dir: &Path) -> Result<Self> {
        let install_dir = resolve_install_dir(slack_dir)?;
        Ok(Self::for_install_dir(install_dir))
    }

    fn for_install_dir(install_dir: PathBuf) -> Self {
        let resource = ArtifactPair::new(
            "resource",
            install_dir.join("resources").join(RESOURCE_ARCHIVE),
        );
        let executable = ArtifactPair::new("executable", install_dir.join(EXECUTABLE_NAME));
        Self {
            install_dir,
            resource,
            executable,
        }
    }

    /// Both managed pairs, resource first. Order matters only for log
    /// readability.
    pub fn pairs(&self) -> [&ArtifactPair; 2] {
        [&self.resource, &self.executable]
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn backup_is_sibling_with_backup_extension() {
        let pair = ArtifactPair::new("resource", PathBuf::from("/opt/slack/app.asar"));
        assert_eq!(pair.backup, PathBuf::from("/opt/slack/app.asar.backup"));
    }

    #[test]
    fn locates_artifacts_under_newest_install() {
        let tmp_dir = TempDir::new("paths_test").unwrap();
        std::fs::create_dir(tmp_dir.path().join("app-4.36.140")).unwrap();
        std::fs::create_dir(tmp_dir.path().join("app-4.35.0")).unwrap();

        let paths = InstallPaths::locate(tmp_dir.path()).unwrap();
        let install_dir = tmp_dir.path().join("app-4.36.140");
        assert_eq!(paths.install_dir, install_dir);
        assert_eq!(
            paths.resource.original,
            install_dir.join("resources").join("app.asar")
        );
        assert_eq!(paths.executable.original, install_dir.join("slack.exe"));
        assert_eq!(
            paths.executable.backup,
            install_dir.join("slack.exe.backup")
        );
    }
}
