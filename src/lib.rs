//! Scan git repositories at pinned revisions for the base images their
//! Dockerfiles build from.
//!
//! A manifest lists `<repository-url> <revision>` pairs. Each repository is
//! cloned at that revision, every `Dockerfile` (or `*.Dockerfile`,
//! `*-Dockerfile`) in the tree is read, and the images named by its `FROM`
//! lines are collected into a [`report::Report`] that can be rendered in the
//! legacy text layout or as a JSON document.

pub mod config;
pub mod error;
pub mod extract;
pub mod locate;
pub mod manifest;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod tree;

pub use error::ScanError;
pub use pipeline::{ScanOptions, Scanner};
