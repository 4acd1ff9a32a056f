use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

pub const MANIFEST_FILE_NAME: &str = "package.json";
pub const DEPENDENCY_CACHE_DIR: &str = "node_modules";

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("search root {0} does not exist")]
    MissingRoot(PathBuf),
    #[error("search root {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot read search root {}", path.display())]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Every `package.json` under `root`, at any depth, sorted by path.
/// Symlinked files and directories are followed; `node_modules` subtrees are never entered.
/// Symlink loops are logged and skipped.
pub fn find_manifests(root: &Path) -> Result<Vec<PathBuf>, LocateError> {
    if !root.exists() {
        return Err(LocateError::MissingRoot(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(LocateError::NotADirectory(root.to_path_buf()));
    }

    tracing::debug!(
        root = %root.display(),
        pattern = %format!("{}/**/{MANIFEST_FILE_NAME}", root.display()),
        "searching for manifests"
    );

    let mut manifests = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !is_dependency_cache(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(LocateError::UnreadableRoot {
                    path: root.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE_NAME {
            tracing::debug!(path = %entry.path().display(), "found manifest");
            manifests.push(entry.into_path());
        }
    }

    manifests.sort();
    Ok(manifests)
}

fn is_dependency_cache(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == DEPENDENCY_CACHE_DIR
}
