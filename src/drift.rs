//! Drift detection between generated output and files on disk

use std::path::{Path, PathBuf};

use similar::{ChangeTag, TextDiff};

use crate::codegen::Proto3Output;
use crate::error::Result;

/// State of one generated file relative to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftStatus {
    Unchanged,
    /// Not present on disk
    Missing,
    /// Present with different content
    Changed { added: usize, removed: usize },
}

#[derive(Debug, Clone)]
pub struct FileDrift {
    pub path: PathBuf,
    pub status: DriftStatus,
    /// Unified diff from disk to generated content; empty when unchanged
    pub diff: String,
}

impl FileDrift {
    pub fn is_drifted(&self) -> bool {
        self.status != DriftStatus::Unchanged
    }
}

/// Compare every file of `output` with its counterpart below `dir`
pub fn detect_drift(output: &Proto3Output, dir: &Path) -> Result<Vec<FileDrift>> {
    let mut report = Vec::with_capacity(output.len());

    for file in output.iter() {
        let path = dir.join(&file.path);
        if !path.exists() {
            report.push(FileDrift {
                diff: unified_diff("/dev/null", &path, "", &file.content),
                path,
                status: DriftStatus::Missing,
            });
            continue;
        }

        let on_disk = std::fs::read_to_string(&path)?;
        if file.checksum().verify(&on_disk) {
            report.push(FileDrift {
                path,
                status: DriftStatus::Unchanged,
                diff: String::new(),
            });
            continue;
        }

        let (added, removed) = count_changes(&on_disk, &file.content);
        let label = path.display().to_string();
        report.push(FileDrift {
            diff: unified_diff(&label, &path, &on_disk, &file.content),
            path,
            status: DriftStatus::Changed { added, removed },
        });
    }

    Ok(report)
}

fn count_changes(old: &str, new: &str) -> (usize, usize) {
    let diff = TextDiff::from_lines(old, new);
    let mut added = 0;
    let mut removed = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, removed)
}

fn unified_diff(old_label: &str, new_path: &Path, old: &str, new: &str) -> String {
    let new_label = new_path.display().to_string();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(old_label, &new_label)
        .to_string()
}
