pub mod git;
pub mod memory;

use crate::error::ScanError;

/// Kind of a non-directory entry in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular or executable file.
    File,
    Symlink,
    /// Submodule link or anything else without readable content.
    Other,
}

/// A non-directory entry of a materialized tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Full path from the tree root, `/`-separated.
    pub path: String,
    pub kind: EntryKind,
}

impl FileHandle {
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// The file tree of one repository at one revision.
pub trait Tree {
    /// Every non-directory entry, depth-first in tree order.
    fn entries(&self) -> Result<Vec<FileHandle>, ScanError>;

    /// Text content of a file, one item per line, line endings stripped.
    fn read_lines(&self, file: &FileHandle) -> Result<Vec<String>, ScanError>;
}

/// Produces trees for (url, revision) pairs.
pub trait Materializer {
    type Tree: Tree;

    fn materialize(&self, url: &str, revision: &str) -> Result<Self::Tree, ScanError>;
}

pub(crate) fn split_lines(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .lines()
        .map(str::to_string)
        .collect()
}
