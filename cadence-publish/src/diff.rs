//! Dry-run unified diff support for `cadence diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use cadence_core::types::Repository;
use cadence_renderer::FileUpdates;

use crate::committer::{normalize_line_endings, resolve_in};
use crate::error::{io_err, PublishError};

/// A single file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Repository-relative path.
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Compare rendered files with the checkout. Unchanged files are omitted and
/// nothing is written.
pub fn preview(repository: &Repository, files: &FileUpdates) -> Result<Vec<FileDiff>, PublishError> {
    let mut diffs = Vec::new();

    for file in &files.create_or_update {
        let existing = read_existing_or_empty(repository, &file.path)?;
        let rendered = normalize_line_endings(&file.content);
        if existing == rendered {
            continue;
        }
        diffs.push(FileDiff {
            path: file.path.clone(),
            unified_diff: unified(&file.path, &existing, &rendered),
        });
    }

    for relative in &files.delete {
        let existing = read_existing_or_empty(repository, relative)?;
        if existing.is_empty() && !absolute(repository, relative)?.exists() {
            continue;
        }
        diffs.push(FileDiff {
            path: relative.clone(),
            unified_diff: unified(relative, &existing, ""),
        });
    }

    Ok(diffs)
}

fn unified(path: &Path, old: &str, new: &str) -> String {
    let old_header = format!("a/{}", path.display());
    let new_header = format!("b/{}", path.display());
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}

fn absolute(repository: &Repository, relative: &Path) -> Result<PathBuf, PublishError> {
    resolve_in(&repository.path, relative).map_err(|e| {
        io_err(relative, std::io::Error::new(ErrorKind::InvalidInput, e.to_string()))
    })
}

fn read_existing_or_empty(repository: &Repository, relative: &Path) -> Result<String, PublishError> {
    let path = absolute(repository, relative)?;
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(normalize_line_endings(&content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}
