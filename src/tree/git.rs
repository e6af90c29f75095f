use std::path::Path;
use std::time::{Duration, Instant};

use git2::build::RepoBuilder;
use git2::{FetchOptions, ObjectType, Oid, RemoteCallbacks, Repository, TreeWalkMode, TreeWalkResult};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{split_lines, EntryKind, FileHandle, Materializer, Tree};
use crate::error::{BoxError, ScanError, TimedOut};

const SYMLINK_MODE: i32 = 0o120000;

/// Clones each repository into a fresh temporary directory.
/// Nothing is shared between two materializations of the same url.
pub struct GitMaterializer {
    clone_timeout: Duration,
    cancel: CancellationToken,
}

impl GitMaterializer {
    /// A zero `clone_timeout` lets a clone run indefinitely.
    pub fn new(clone_timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            clone_timeout,
            cancel,
        }
    }
}

impl Materializer for GitMaterializer {
    type Tree = GitTree;

    fn materialize(&self, url: &str, revision: &str) -> Result<GitTree, ScanError> {
        let checkout_error = |source: BoxError| ScanError::Checkout {
            url: url.to_string(),
            source,
        };

        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let dir = tempfile::Builder::new()
            .prefix("fromscan-")
            .tempdir()
            .map_err(|e| checkout_error(e.into()))?;

        let started = Instant::now();
        let timeout = self.clone_timeout;
        let cancel = self.cancel.clone();
        let mut callbacks = RemoteCallbacks::new();
        // Returning false aborts the transfer.
        callbacks.transfer_progress(move |_| {
            !cancel.is_cancelled() && (timeout.is_zero() || started.elapsed() < timeout)
        });
        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(callbacks);

        info!(url, revision, "cloning repository");
        let repo = match RepoBuilder::new()
            .bare(true)
            .fetch_options(fetch)
            .clone(url, dir.path())
        {
            Ok(repo) => repo,
            Err(_) if self.cancel.is_cancelled() => return Err(ScanError::Cancelled),
            Err(_) if !timeout.is_zero() && started.elapsed() >= timeout => {
                return Err(checkout_error(TimedOut(timeout).into()));
            }
            Err(e) => return Err(checkout_error(e.into())),
        };
        debug!(url, elapsed_ms = started.elapsed().as_millis() as u64, "clone finished");

        let not_found = |source: BoxError| ScanError::RevisionNotFound {
            url: url.to_string(),
            revision: revision.to_string(),
            source,
        };
        if !is_hex_id(revision) {
            return Err(not_found("not a hex commit id".into()));
        }
        let tree_id = {
            let commit = repo
                .find_object_by_prefix(revision, None)
                .and_then(|object| object.peel_to_commit())
                .map_err(|e| not_found(e.into()))?;
            commit.tree_id()
        };

        Ok(GitTree {
            url: url.to_string(),
            repo,
            tree_id,
            _dir: dir,
        })
    }
}

/// Full or abbreviated commit id; branch names and rev-specs are rejected.
fn is_hex_id(revision: &str) -> bool {
    !revision.is_empty() && revision.len() <= 40 && revision.chars().all(|c| c.is_ascii_hexdigit())
}

/// The tree of one commit inside a temporary bare clone.
/// The clone is deleted when this is dropped.
pub struct GitTree {
    url: String,
    repo: Repository,
    tree_id: Oid,
    _dir: TempDir,
}

impl GitTree {
    fn read_error(&self, path: &str, e: git2::Error) -> ScanError {
        ScanError::FileRead {
            url: self.url.clone(),
            path: path.to_string(),
            source: e.into(),
        }
    }
}

impl Tree for GitTree {
    fn entries(&self) -> Result<Vec<FileHandle>, ScanError> {
        let tree = self
            .repo
            .find_tree(self.tree_id)
            .map_err(|e| self.read_error(".", e))?;

        let mut files = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            let kind = match entry.kind() {
                Some(ObjectType::Tree) => return TreeWalkResult::Ok,
                Some(ObjectType::Blob) if entry.filemode() == SYMLINK_MODE => EntryKind::Symlink,
                Some(ObjectType::Blob) => EntryKind::File,
                _ => EntryKind::Other,
            };
            let name = String::from_utf8_lossy(entry.name_bytes());
            files.push(FileHandle {
                path: format!("{root}{name}"),
                kind,
            });
            TreeWalkResult::Ok
        })
        .map_err(|e| self.read_error(".", e))?;

        Ok(files)
    }

    fn read_lines(&self, file: &FileHandle) -> Result<Vec<String>, ScanError> {
        let tree = self
            .repo
            .find_tree(self.tree_id)
            .map_err(|e| self.read_error(&file.path, e))?;
        let entry = tree
            .get_path(Path::new(&file.path))
            .map_err(|e| self.read_error(&file.path, e))?;
        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| self.read_error(&file.path, e))?;

        Ok(split_lines(blob.content()))
    }
}
