use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::ai::schema::{FileEntry, TreeNode};

pub mod path_utils;

#[derive(Debug, Error)]
#[error("{action} {path:?}: {source}")]
pub struct FsError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FsError {
    fn new(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Creates `path` and any missing parents. Existing directories are fine.
pub async fn ensure_dir(path: &Path) -> Result<(), FsError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| FsError::new("create directory", path, e))
}

/// Creates an empty file at `path` unless one is already there. Never truncates.
pub async fn ensure_file(path: &Path) -> Result<(), FsError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .await
        .map(drop)
        .map_err(|e| FsError::new("create file", path, e))
}

/// Creates the directories and empty placeholder files `node` declares under `base`.
///
/// A directory always exists before its children are visited. Nodes with an
/// unknown or missing `type` are logged and skipped.
pub fn materialize<'a>(
    base: &'a Path,
    node: &'a TreeNode,
) -> Pin<Box<dyn Future<Output = Result<(), FsError>> + Send + 'a>> {
    Box::pin(async move {
        match node {
            TreeNode::Directory { name, children } => {
                let dir = base.join(name);
                ensure_dir(&dir).await?;
                debug!(path = ?dir, "directory ready");
                for child in children {
                    materialize(&dir, child).await?;
                }
            }
            TreeNode::File { name } => {
                let file = base.join(name);
                ensure_file(&file).await?;
                debug!(path = ?file, "placeholder ready");
            }
            TreeNode::Unknown { kind, name } => {
                warn!(?kind, ?name, base = ?base, "skipping file structure node with unrecognized type");
            }
        }
        Ok(())
    })
}

/// Writes every entry's full content under `root`, creating parents and
/// overwriting existing files. Stops at the first failure.
pub async fn write_all(root: &Path, entries: &[FileEntry]) -> Result<(), FsError> {
    for entry in entries {
        let path = root.join(&entry.path);
        if let Some(parent) = path.parent() {
            ensure_dir(parent).await?;
        }
        fs::write(&path, entry.content())
            .await
            .map_err(|e| FsError::new("write file", &path, e))?;
        debug!(path = ?path, bytes = entry.content().len(), "file written");
    }
    Ok(())
}
