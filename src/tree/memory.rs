use std::collections::HashMap;

use super::{split_lines, EntryKind, FileHandle, Materializer, Tree};
use crate::error::ScanError;

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Unreadable,
    None,
}

/// A tree held entirely in memory, entries kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    url: String,
    entries: Vec<(FileHandle, Content)>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.push(path, EntryKind::File, Content::Text(content.to_string()));
        self
    }

    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        self.push(path, EntryKind::Symlink, Content::Text(target.to_string()));
        self
    }

    pub fn submodule(mut self, path: &str) -> Self {
        self.push(path, EntryKind::Other, Content::None);
        self
    }

    /// A regular file whose content fails to load.
    pub fn unreadable(mut self, path: &str) -> Self {
        self.push(path, EntryKind::File, Content::Unreadable);
        self
    }

    fn push(&mut self, path: &str, kind: EntryKind, content: Content) {
        let handle = FileHandle {
            path: path.to_string(),
            kind,
        };
        self.entries.push((handle, content));
    }
}

impl Tree for MemoryTree {
    fn entries(&self) -> Result<Vec<FileHandle>, ScanError> {
        Ok(self.entries.iter().map(|(h, _)| h.clone()).collect())
    }

    fn read_lines(&self, file: &FileHandle) -> Result<Vec<String>, ScanError> {
        let read_error = |msg: &str| ScanError::FileRead {
            url: self.url.clone(),
            path: file.path.clone(),
            source: msg.into(),
        };

        match self.entries.iter().find(|(h, _)| h.path == file.path) {
            Some((_, Content::Text(text))) => Ok(split_lines(text.as_bytes())),
            Some((_, Content::Unreadable)) => Err(read_error("content unavailable")),
            Some((_, Content::None)) => Err(read_error("entry has no content")),
            None => Err(read_error("no such entry")),
        }
    }
}

/// Serves [`MemoryTree`]s keyed by url and revision.
#[derive(Debug, Clone, Default)]
pub struct MemoryMaterializer {
    repos: HashMap<String, HashMap<String, MemoryTree>>,
}

impl MemoryMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree(mut self, url: &str, revision: &str, tree: MemoryTree) -> Self {
        self.repos
            .entry(url.to_string())
            .or_default()
            .insert(revision.to_string(), tree);
        self
    }
}

impl Materializer for MemoryMaterializer {
    type Tree = MemoryTree;

    fn materialize(&self, url: &str, revision: &str) -> Result<MemoryTree, ScanError> {
        let commits = self.repos.get(url).ok_or_else(|| ScanError::Checkout {
            url: url.to_string(),
            source: "repository not found".into(),
        })?;
        let tree = commits
            .get(revision)
            .ok_or_else(|| ScanError::RevisionNotFound {
                url: url.to_string(),
                revision: revision.to_string(),
                source: "object not found".into(),
            })?;

        Ok(MemoryTree {
            url: url.to_string(),
            entries: tree.entries.clone(),
        })
    }
}
