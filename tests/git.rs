use std::time::Duration;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;
use test_log::test;
use tokio_util::sync::CancellationToken;

use fromscan::extract::MatchMode;
use fromscan::tree::git::GitMaterializer;
use fromscan::tree::{EntryKind, Materializer, Tree};
use fromscan::{ScanError, ScanOptions, Scanner, extract, locate};

const FILE: i32 = 0o100644;
const SYMLINK: i32 = 0o120000;
const DIR: i32 = 0o040000;

/// A one-commit repository:
///
/// ```text
/// Dockerfile            FROM golang:1.21 AS build / FROM gcr.io/distroless/static
/// README.md
/// api.Dockerfile        FROM python:3.12
/// link.Dockerfile  ->   Dockerfile
/// svc/Dockerfile        FROM nginx
/// ```
fn fixture() -> (TempDir, Oid) {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    let blob = |content: &str| repo.blob(content.as_bytes()).unwrap();

    let mut svc = repo.treebuilder(None).unwrap();
    svc.insert("Dockerfile", blob("FROM nginx\n"), FILE).unwrap();
    let svc_id = svc.write().unwrap();

    let mut root = repo.treebuilder(None).unwrap();
    root.insert(
        "Dockerfile",
        blob("FROM golang:1.21 AS build\nRUN go build\nFROM gcr.io/distroless/static\n"),
        FILE,
    )
    .unwrap();
    root.insert("README.md", blob("FROM the top\n"), FILE).unwrap();
    root.insert("api.Dockerfile", blob("FROM python:3.12\n"), FILE).unwrap();
    root.insert("link.Dockerfile", blob("Dockerfile"), SYMLINK).unwrap();
    root.insert("svc", svc_id, DIR).unwrap();
    let tree_id = root.write().unwrap();

    let commit_id = {
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("fixture", "fixture@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[]).unwrap()
    };

    (dir, commit_id)
}

fn materializer() -> GitMaterializer {
    GitMaterializer::new(Duration::from_secs(60), CancellationToken::new())
}

fn url(dir: &TempDir) -> String {
    dir.path().to_string_lossy().to_string()
}

#[test]
fn lists_entries_in_tree_order() {
    let (dir, commit) = fixture();
    let tree = materializer().materialize(&url(&dir), &commit.to_string()).unwrap();

    let entries: Vec<(String, EntryKind)> = tree
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| (e.path, e.kind))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("Dockerfile".to_string(), EntryKind::File),
            ("README.md".to_string(), EntryKind::File),
            ("api.Dockerfile".to_string(), EntryKind::File),
            ("link.Dockerfile".to_string(), EntryKind::Symlink),
            ("svc/Dockerfile".to_string(), EntryKind::File),
        ]
    );
}

#[test]
fn locates_and_extracts_at_abbreviated_revision() {
    let (dir, commit) = fixture();
    let short = &commit.to_string()[..10];
    let tree = materializer().materialize(&url(&dir), short).unwrap();

    let files = locate::locate(&tree).unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["Dockerfile", "api.Dockerfile", "svc/Dockerfile"]);

    let images = extract::extract_file(&tree, &files[0], MatchMode::Strict).unwrap();
    assert_eq!(images, vec!["golang:1.21", "gcr.io/distroless/static"]);
}

#[test]
fn unknown_revision() {
    let (dir, _) = fixture();
    let err = materializer()
        .materialize(&url(&dir), "0123456789abcdef0123456789abcdef01234567")
        .err()
        .unwrap();
    assert!(matches!(err, ScanError::RevisionNotFound { .. }));
}

#[test]
fn unreachable_repository() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");
    let err = materializer()
        .materialize(&missing.to_string_lossy(), "abc123")
        .err()
        .unwrap();
    assert!(matches!(err, ScanError::Checkout { .. }));
}

#[test]
fn scanner_over_git() {
    let (dir, commit) = fixture();
    let entries = vec![Ok(fromscan::manifest::ManifestEntry {
        url: url(&dir),
        revision: commit.to_string(),
    })];

    let report = Scanner::new(materializer(), ScanOptions::default())
        .scan(entries)
        .unwrap();

    let images: Vec<Vec<String>> = report.repositories[0]
        .dockerfiles
        .iter()
        .map(|d| d.images.clone())
        .collect();
    assert_eq!(
        images,
        vec![
            vec!["golang:1.21".to_string(), "gcr.io/distroless/static".to_string()],
            vec!["python:3.12".to_string()],
            vec!["nginx".to_string()],
        ]
    );
}

#[test]
fn rejects_non_hex_revisions() {
    let (dir, _) = fixture();
    for rev in ["HEAD", "master", "HEAD~0"] {
        let err = materializer().materialize(&url(&dir), rev).err().unwrap();
        assert!(matches!(err, ScanError::RevisionNotFound { .. }), "{rev} resolved");
    }
}

#[test]
fn cancelled_token_stops_checkout() {
    let (dir, commit) = fixture();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = GitMaterializer::new(Duration::from_secs(60), cancel)
        .materialize(&url(&dir), &commit.to_string())
        .err()
        .unwrap();
    assert!(matches!(err, ScanError::Cancelled));
}
