//! Screenshot relocation into the bucket tree.
//!
//! Two strategies, one per report flavour:
//!
//! - [`OrganizeMode::Copy`]: captures already sit in
//!   `screenshots/<module>/<feature>/` and are copied into the bucket's own
//!   `screenshots/` folder. Sources are kept.
//! - [`OrganizeMode::Move`]: captures sit flat in `screenshots/`; files whose
//!   name mentions a word of the feature are renamed into
//!   `screenshots/<module>/<feature>/`.
//!
//! Neither mode overwrites a file already present at the destination, and a
//! missing source directory simply means there is nothing to do.

use crate::classify::Classification;
use crate::fsio;
use crate::model::StepStatus;
use crate::tree::ReportTree;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker in capture file names for failed scenarios
const FAILURE_MARKER: &str = "_failure_";

/// How screenshots reach the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizeMode {
    /// Copy from the hierarchical capture tree
    #[default]
    Copy,
    /// Move matching files out of the flat capture folder
    Move,
}

/// Outcome tag carried in capture file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureOutcome {
    Success,
    Failure,
}

impl CaptureOutcome {
    /// Anything but a passed scenario is a failure capture
    #[must_use]
    pub const fn from_status(status: StepStatus) -> Self {
        if status.is_passed() {
            Self::Success
        } else {
            Self::Failure
        }
    }

    /// Infer the tag from a capture file name
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        if name.to_lowercase().contains(FAILURE_MARKER) {
            Self::Failure
        } else {
            Self::Success
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// One capture file and where it ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotArtifact {
    pub source: PathBuf,
    pub target: PathBuf,
    pub captured_at: DateTime<Utc>,
    pub outcome: CaptureOutcome,
}

impl ScreenshotArtifact {
    fn from_source(source: &Path, target: PathBuf) -> Self {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let captured_at = fs::metadata(source)
            .and_then(|m| m.modified())
            .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
        Self {
            source: source.to_path_buf(),
            target,
            captured_at,
            outcome: CaptureOutcome::from_file_name(&name),
        }
    }
}

/// What an organize pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeSummary {
    /// Files copied or moved this pass
    pub relocated: Vec<ScreenshotArtifact>,
    /// Files left alone (already at destination, or failed to move)
    pub skipped: usize,
}

impl OrganizeSummary {
    /// Number of files relocated
    #[must_use]
    pub fn count(&self) -> usize {
        self.relocated.len()
    }
}

/// Relocates captures for one bucket at a time
#[derive(Debug, Clone)]
pub struct ScreenshotOrganizer {
    tree: ReportTree,
}

impl ScreenshotOrganizer {
    pub fn new(tree: ReportTree) -> Self {
        Self { tree }
    }

    /// Organize captures for `module`/`feature`
    pub fn organize(&self, module: &str, feature: &str, mode: OrganizeMode) -> OrganizeSummary {
        let bucket = Classification::new(module, feature);
        match mode {
            OrganizeMode::Copy => self.copy_bucket(&bucket),
            OrganizeMode::Move => self.move_flat(&bucket),
        }
    }

    /// `screenshots/<m>/<f>/*` -> `<m>/<f>/screenshots/`
    pub fn copy_bucket(&self, bucket: &Classification) -> OrganizeSummary {
        let source = self.tree.bucket_captures(bucket);
        let target = self.tree.bucket_screenshots(bucket);
        let mut summary = OrganizeSummary::default();

        if let Err(err) = fsio::ensure_dir(&target) {
            warn!(dir = %target.display(), error = %err, "cannot create screenshot folder");
            return summary;
        }
        let Some(files) = source_files(&source) else {
            return summary;
        };

        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            let dest = target.join(name);
            match fsio::copy_no_clobber(&file, &dest) {
                Ok(_) => summary
                    .relocated
                    .push(ScreenshotArtifact::from_source(&file, dest)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => summary.skipped += 1,
                Err(err) => {
                    warn!(file = %file.display(), error = %err, "screenshot copy failed");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            module = %bucket.module,
            feature = %bucket.feature,
            copied = summary.count(),
            skipped = summary.skipped,
            "screenshots copied"
        );
        summary
    }

    /// Flat `screenshots/*` whose names mention the feature -> `screenshots/<m>/<f>/`
    pub fn move_flat(&self, bucket: &Classification) -> OrganizeSummary {
        let source = self.tree.flat_captures();
        let target = self.tree.bucket_captures(bucket);
        let mut summary = OrganizeSummary::default();

        if let Err(err) = fsio::ensure_dir(&target) {
            warn!(dir = %target.display(), error = %err, "cannot create screenshot folder");
            return summary;
        }
        let Some(files) = source_files(&source) else {
            return summary;
        };

        let keywords = feature_keywords(&bucket.feature);
        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            if !mentions_any(&name.to_string_lossy(), &keywords) {
                continue;
            }
            let dest = target.join(name);
            let artifact = ScreenshotArtifact::from_source(&file, dest.clone());
            match fsio::move_no_clobber(&file, &dest) {
                Ok(()) => summary.relocated.push(artifact),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => summary.skipped += 1,
                Err(err) => {
                    warn!(file = %file.display(), error = %err, "screenshot move failed");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            module = %bucket.module,
            feature = %bucket.feature,
            moved = summary.count(),
            skipped = summary.skipped,
            "screenshots moved"
        );
        summary
    }
}

/// Regular files directly in `dir`, sorted; `None` when the dir is absent
fn source_files(dir: &Path) -> Option<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), error = %err, "no screenshots to organize");
            return None;
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Some(files)
}

/// Lower-case `-`-separated words of a feature name
fn feature_keywords(feature: &str) -> Vec<String> {
    feature
        .split('-')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn mentions_any(file_name: &str, keywords: &[String]) -> bool {
    let lower = file_name.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}
