//! Repository committers: apply rendered [`FileUpdates`] to a checkout.
//!
//! ## `atomic_write` protocol
//!
//! 1. Normalise line endings to LF.
//! 2. SHA-256 hash the normalised content.
//! 3. Hash what is on disk; skip if identical.
//! 4. Write to `<path>.cadence.tmp`.
//! 5. Rename to the final path (atomic on POSIX).
//!
//! [`DirectoryCommitter`] stops there; [`GitCommitter`] then stages and
//! commits the touched paths with the system `git`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};

use cadence_core::types::{CommitRef, Repository};
use cadence_renderer::FileUpdates;

use crate::error::CommitError;

/// Applies file mutations to a repository as one commit.
pub trait RepositoryCommitter: Send + Sync {
    /// Returns [`CommitError::NoChanges`] when the repository already holds
    /// exactly these files.
    fn commit(
        &self,
        repository: &Repository,
        files: &FileUpdates,
        message: &str,
    ) -> Result<CommitRef, CommitError>;
}

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual file mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Content changed or the file did not previously exist.
    Written { path: PathBuf, digest: String },
    /// On-disk content already matches.
    Unchanged { path: PathBuf },
    /// A file listed for deletion existed and was removed.
    Deleted { path: PathBuf },
}

impl WriteResult {
    pub fn is_change(&self) -> bool {
        !matches!(self, WriteResult::Unchanged { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path, .. }
            | WriteResult::Unchanged { path }
            | WriteResult::Deleted { path } => path,
        }
    }
}

fn failed(path: &Path, err: std::io::Error) -> CommitError {
    CommitError::Failed(format!("I/O error at {}: {err}", path.display()))
}

pub(crate) fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

fn digest_of(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

/// Resolve a repository-relative path inside `root`, refusing anything that
/// could escape it.
pub(crate) fn resolve_in(root: &Path, relative: &Path) -> Result<PathBuf, CommitError> {
    let escapes = relative.as_os_str().is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(CommitError::Failed(format!(
            "refusing to write outside the repository: {}",
            relative.display()
        )));
    }
    Ok(root.join(relative))
}

// ---------------------------------------------------------------------------
// atomic_write / remove_if_exists
// ---------------------------------------------------------------------------

/// Atomically write `content` to `path` unless the file already holds it.
pub(crate) fn atomic_write(path: &Path, content: &str) -> Result<WriteResult, CommitError> {
    let tmp = PathBuf::from(format!("{}.cadence.tmp", path.display()));
    atomic_write_with_tmp(path, content, &tmp)
}

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<WriteResult, CommitError> {
    let normalized = normalize_line_endings(content);
    let digest = digest_of(&normalized);

    match std::fs::read_to_string(path) {
        Ok(existing) if digest_of(&normalize_line_endings(&existing)) == digest => {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged { path: path.to_path_buf() });
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) if e.kind() == ErrorKind::InvalidData => {}
        Err(e) => return Err(failed(path, e)),
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| failed(parent, e))?;
    }
    std::fs::write(tmp, &normalized).map_err(|e| failed(tmp, e))?;
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(failed(path, e));
    }

    tracing::debug!("wrote: {}", path.display());
    Ok(WriteResult::Written { path: path.to_path_buf(), digest })
}

fn remove_if_exists(path: &Path) -> Result<WriteResult, CommitError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("deleted: {}", path.display());
            Ok(WriteResult::Deleted { path: path.to_path_buf() })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(WriteResult::Unchanged { path: path.to_path_buf() }),
        Err(e) => Err(failed(path, e)),
    }
}

// ---------------------------------------------------------------------------
// DirectoryCommitter
// ---------------------------------------------------------------------------

/// Writes rendered files straight into the repository checkout.
///
/// The returned sha is derived from the message and the changed paths, so it
/// identifies the change set without a VCS.
#[derive(Debug, Clone)]
pub struct DirectoryCommitter {
    author: String,
}

impl DirectoryCommitter {
    pub fn new(author: impl Into<String>) -> Self {
        Self { author: author.into() }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Apply every mutation and report what happened to each path.
    /// Results carry repository-relative paths.
    pub fn apply(&self, repository: &Repository, files: &FileUpdates) -> Result<Vec<WriteResult>, CommitError> {
        let root = &repository.path;
        if !root.is_dir() {
            return Err(CommitError::Failed(format!(
                "repository checkout not found: {}",
                root.display()
            )));
        }

        let mut results = Vec::new();
        for file in &files.create_or_update {
            let absolute = resolve_in(root, &file.path)?;
            results.push(match atomic_write(&absolute, &file.content)? {
                WriteResult::Written { digest, .. } => WriteResult::Written { path: file.path.clone(), digest },
                _ => WriteResult::Unchanged { path: file.path.clone() },
            });
        }
        for relative in &files.delete {
            let absolute = resolve_in(root, relative)?;
            results.push(match remove_if_exists(&absolute)? {
                WriteResult::Deleted { .. } => WriteResult::Deleted { path: relative.clone() },
                _ => WriteResult::Unchanged { path: relative.clone() },
            });
        }
        Ok(results)
    }
}

/// SHA-256 over the message and the sorted changed paths, first 40 hex chars.
pub fn change_set_sha(message: &str, results: &[WriteResult]) -> String {
    let mut entries: Vec<String> = results
        .iter()
        .filter_map(|r| match r {
            WriteResult::Written { path, digest } => Some(format!("{} {digest}", path.display())),
            WriteResult::Deleted { path } => Some(format!("{} deleted", path.display())),
            WriteResult::Unchanged { .. } => None,
        })
        .collect();
    entries.sort();

    let mut h = Sha256::new();
    h.update(message.as_bytes());
    for entry in entries {
        h.update(b"\n");
        h.update(entry.as_bytes());
    }
    let mut sha = hex::encode(h.finalize());
    sha.truncate(40);
    sha
}

fn commit_url(repository: &Repository, sha: &str) -> Option<String> {
    repository
        .url
        .as_ref()
        .map(|url| format!("{}/commit/{sha}", url.trim_end_matches('/')))
}

impl RepositoryCommitter for DirectoryCommitter {
    fn commit(
        &self,
        repository: &Repository,
        files: &FileUpdates,
        message: &str,
    ) -> Result<CommitRef, CommitError> {
        let results = self.apply(repository, files)?;
        if !results.iter().any(WriteResult::is_change) {
            return Err(CommitError::NoChanges);
        }
        let sha = change_set_sha(message, &results);
        tracing::info!(
            repository = %repository.id,
            changed = results.iter().filter(|r| r.is_change()).count(),
            "applied files"
        );
        Ok(CommitRef {
            url: commit_url(repository, &sha),
            sha,
            message: message.to_string(),
            author: self.author.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// GitCommitter
// ---------------------------------------------------------------------------

/// Writes files like [`DirectoryCommitter`], then records a real git commit
/// on whatever branch the checkout has checked out.
#[derive(Debug, Clone)]
pub struct GitCommitter {
    directory: DirectoryCommitter,
}

impl GitCommitter {
    pub fn new(author: impl Into<String>) -> Self {
        Self { directory: DirectoryCommitter::new(author) }
    }

    fn git(&self, repository: &Repository, args: &[&str]) -> Result<std::process::Output, CommitError> {
        let author = self.directory.author();
        Command::new("git")
            .arg("-C")
            .arg(&repository.path)
            .arg("-c")
            .arg(format!("user.name={author}"))
            .arg("-c")
            .arg(format!("user.email={author}@users.noreply.cadence"))
            .args(args)
            .output()
            .map_err(|e| CommitError::Failed(format!("failed to run git: {e}")))
    }

    fn git_ok(&self, repository: &Repository, args: &[&str]) -> Result<String, CommitError> {
        let output = self.git(repository, args)?;
        if !output.status.success() {
            return Err(CommitError::Failed(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// The subset of `paths` the checkout ignores. Tracked files are never
    /// reported.
    fn ignored_paths(&self, repository: &Repository, paths: &[String]) -> Result<Vec<String>, CommitError> {
        if paths.is_empty() {
            return Ok(vec![]);
        }
        let mut args = vec!["check-ignore", "-z", "--"];
        args.extend(paths.iter().map(String::as_str));
        let output = self.git(repository, &args)?;
        match output.status.code() {
            Some(0) => Ok(String::from_utf8_lossy(&output.stdout)
                .split('\0')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()),
            Some(1) => Ok(vec![]),
            _ => Err(CommitError::Failed(format!(
                "git check-ignore failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}

impl RepositoryCommitter for GitCommitter {
    /// Whether there is anything to commit is decided by the index against
    /// `HEAD`, not by what this call wrote: an earlier attempt whose commit
    /// failed may already have left the same files in the checkout.
    fn commit(
        &self,
        repository: &Repository,
        files: &FileUpdates,
        message: &str,
    ) -> Result<CommitRef, CommitError> {
        self.directory.apply(repository, files)?;

        let written: Vec<String> = files.create_or_update.iter().map(|f| git_path(&f.path)).collect();
        let deleted: Vec<String> = files.delete.iter().map(|p| git_path(p)).collect();

        let ignored = self.ignored_paths(repository, &written)?;
        if !ignored.is_empty() {
            tracing::debug!(repository = %repository.id, count = ignored.len(), "skipping ignored files");
        }
        let to_add: Vec<&str> = written
            .iter()
            .filter(|p| !ignored.contains(p))
            .map(String::as_str)
            .collect();
        if !to_add.is_empty() {
            let mut add = vec!["add", "-A", "--"];
            add.extend(to_add);
            self.git_ok(repository, &add)?;
        }
        if !deleted.is_empty() {
            let mut rm = vec!["rm", "--cached", "--quiet", "--ignore-unmatch", "--"];
            rm.extend(deleted.iter().map(String::as_str));
            self.git_ok(repository, &rm)?;
        }

        let mut diff = vec!["diff", "--cached", "--relative", "--name-only", "-z", "--"];
        diff.extend(written.iter().chain(&deleted).map(String::as_str));
        let staged_output = self.git_ok(repository, &diff)?;
        let staged: Vec<&str> = staged_output.split('\0').filter(|p| !p.is_empty()).collect();
        if staged.is_empty() {
            return Err(CommitError::NoChanges);
        }

        // Only the rendered paths; anything else the checkout has staged stays staged.
        let mut commit = vec!["commit", "--quiet", "-m", message, "--"];
        commit.extend(staged.iter().copied());
        self.git_ok(repository, &commit)?;
        let sha = self.git_ok(repository, &["rev-parse", "HEAD"])?;
        tracing::info!(repository = %repository.id, %sha, files = staged.len(), "committed");
        Ok(CommitRef {
            url: commit_url(repository, &sha),
            sha,
            message: message.to_string(),
            author: self.directory.author().to_string(),
        })
    }
}

fn git_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
