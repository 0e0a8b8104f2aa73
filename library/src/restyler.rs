// This file's job is to be the Rust API for the restyler: validate the
// configuration once, then run the apply or recover workflow over the
// resolved install.

use std::path::{Path, PathBuf};

use log::info;
use url::Url;

use crate::backup::{ensure_backup, restore_all};
use crate::error::{PatchError, Result};
use crate::patcher::{header_hash, patch};
use crate::paths::InstallPaths;
use crate::payload::build_payload;

/// Where the stylesheets live when the user does not pass their own base
/// URL.
pub const DEFAULT_CSS_BASE_URL: &str =
    "https://raw.githubusercontent.com/slack-restyle/stylesheets/main";

/// Validated configuration for an `apply` run. Construct through `new` so
/// the URL is checked before any filesystem access happens.
#[derive(Debug, Clone)]
pub struct PatchConfig {
    pub slack_dir: PathBuf,
    pub css_base_url: Url,
}

impl PatchConfig {
    pub fn new(slack_dir: &Path, css_base_url: &str) -> Result<Self> {
        let css_base_url = Url::parse(css_base_url).map_err(|source| PatchError::InvalidUrl {
            input: css_base_url.to_string(),
            source,
        })?;
        Ok(Self {
            slack_dir: slack_dir.to_path_buf(),
            css_base_url,
        })
    }
}

/// Diagnostics from a successful `apply`. The header hashes are the values
/// Electron's asar integrity check would pin before and after the patch;
/// we only surface them, nothing validates against them.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub install_dir: PathBuf,
    pub header_hash_before: String,
    pub header_hash_after: String,
}

/// Backs up both managed artifacts, then injects the CSS-loader script into
/// the resource archive. Safe to re-run: every invocation starts from the
/// pristine backup, so the result is the same as a single run. There is no
/// rollback on failure; the backup taken here is the recovery path.
pub fn apply(config: &PatchConfig) -> Result<ApplyOutcome> {
    let paths = InstallPaths::locate(&config.slack_dir)?;

    for pair in paths.pairs() {
        ensure_backup(pair)?;
    }

    let resource = &paths.resource.original;
    let header_hash_before = header_hash(resource)?;
    patch(resource, &build_payload(&config.css_base_url))?;
    let header_hash_after = header_hash(resource)?;

    info!("Done.");
    Ok(ApplyOutcome {
        install_dir: paths.install_dir,
        header_hash_before,
        header_hash_after,
    })
}

/// Puts both managed artifacts back to their backed-up content. This is a
/// plain file copy, not an "undo" of the injection, so it works no matter
/// what state a failed apply left the archive in.
pub fn recover(slack_dir: &Path) -> Result<()> {
    let paths = InstallPaths::locate(slack_dir)?;
    restore_all(paths.pairs())
}
