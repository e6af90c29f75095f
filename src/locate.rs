use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ScanError;
use crate::tree::{EntryKind, FileHandle, Tree};

static DOCKERFILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\W)Dockerfile$").expect("valid regex"));

/// `Dockerfile`, or a path ending in `Dockerfile` right after a non-word character.
pub fn is_dockerfile(path: &str) -> bool {
    DOCKERFILE_NAME.is_match(path)
}

/// Regular files of `tree` named like a Dockerfile, in tree order.
pub fn locate<T: Tree + ?Sized>(tree: &T) -> Result<Vec<FileHandle>, ScanError> {
    let found: Vec<FileHandle> = tree
        .entries()?
        .into_iter()
        .filter(|f| f.kind == EntryKind::File && is_dockerfile(f.name()))
        .collect();

    for f in &found {
        debug!(path = %f.path, name = f.name(), "located Dockerfile");
    }
    Ok(found)
}
