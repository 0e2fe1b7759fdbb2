//! Deterministic directory traversal.
//!
//! The tree is walked without following symlinks, excluded entries are pruned
//! (a matched directory is never descended), and the surviving events are
//! ordered by the bytes of their root-relative path so reports are identical
//! across platforms and filesystems. Unreadable entries are logged and
//! skipped; they never abort the batch.

use crate::error::Result;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// One traversal outcome, relative to the input root.
#[derive(Debug, Clone)]
pub enum WalkEvent {
    /// A regular file to sanitize.
    File { path: PathBuf, rel: PathBuf, size: u64 },
    /// A file or pruned directory matched by an exclude pattern.
    Excluded { path: PathBuf, rel: PathBuf, pattern: String, is_dir: bool },
    /// A symlink, skipped for safety.
    Symlink { path: PathBuf, rel: PathBuf },
}

impl WalkEvent {
    pub fn rel(&self) -> &Path {
        match self {
            WalkEvent::File { rel, .. }
            | WalkEvent::Excluded { rel, .. }
            | WalkEvent::Symlink { rel, .. } => rel,
        }
    }
}

/// Forward-slash rendering of a relative path, used for glob matching and
/// byte-wise ordering.
pub fn rel_posix(rel: &Path) -> String {
    let mut out = String::new();
    for component in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

/// Compiled exclude patterns, keeping the raw text for warning messages.
pub struct ExcludeSet {
    patterns: Vec<(String, Pattern)>,
}

impl ExcludeSet {
    pub fn compile(globs: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(globs.len());
        for raw in globs {
            let normalized = raw.replace('\\', "/");
            let pattern = Pattern::new(&normalized).map_err(|e| {
                crate::error::ScrubError::configuration(format!(
                    "invalid exclude pattern '{raw}': {e}"
                ))
            })?;
            patterns.push((raw.clone(), pattern));
        }
        Ok(Self { patterns })
    }

    /// First pattern matching a root-relative path, if any. Patterns with a
    /// separator (or a leading `**`) match the whole relative path; bare
    /// patterns match any single component, so `.git` or `*.tmp` behave the
    /// way ignore files condition people to expect.
    pub fn matched(&self, rel: &Path) -> Option<&str> {
        if self.patterns.is_empty() {
            return None;
        }
        let posix = rel_posix(rel);
        let components: Vec<&str> = posix.split('/').collect();
        for (raw, pattern) in &self.patterns {
            let whole_path = pattern.as_str().contains('/') || pattern.as_str().starts_with("**");
            let hit = if whole_path {
                pattern.matches(&posix)
            } else {
                components.iter().any(|part| pattern.matches(part))
            };
            if hit {
                return Some(raw);
            }
        }
        None
    }
}

/// Walk `root`, prune exclusions, and return events sorted by the bytes of
/// their relative path. File contents are not touched; the caller streams
/// them one at a time.
pub fn walk_tree(root: &Path, excludes: &ExcludeSet) -> Result<Vec<WalkEvent>> {
    let mut events = Vec::new();
    let mut it = WalkDir::new(root).follow_links(false).into_iter();

    loop {
        let entry = match it.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(e)) => {
                warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let path = entry.path().to_path_buf();
        let rel = match path.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };

        if let Some(pattern) = excludes.matched(&rel) {
            let is_dir = entry.file_type().is_dir();
            events.push(WalkEvent::Excluded {
                path,
                rel,
                pattern: pattern.to_string(),
                is_dir,
            });
            if is_dir {
                it.skip_current_dir();
            }
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            events.push(WalkEvent::Symlink { path, rel });
        } else if file_type.is_file() {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            events.push(WalkEvent::File { path, rel, size });
        }
    }

    events.sort_by(|a, b| rel_posix(a.rel()).into_bytes().cmp(&rel_posix(b.rel()).into_bytes()));
    Ok(events)
}
