use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::tree::{FileHandle, Tree};

/// How `FROM` instructions are recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Line starts with `FROM`; the image is the second space-separated field.
    #[default]
    Strict,
    /// Any case, leading whitespace allowed, `--flag` options skipped.
    Lenient,
}

/// Image references of every `FROM` line, in file order.
pub fn extract<S: AsRef<str>>(lines: &[S], mode: MatchMode) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| match mode {
            MatchMode::Strict => strict_image(line.as_ref()),
            MatchMode::Lenient => lenient_image(line.as_ref()),
        })
        .map(str::to_string)
        .collect()
}

/// Read `file` from `tree` and extract its image references.
pub fn extract_file<T: Tree + ?Sized>(
    tree: &T,
    file: &FileHandle,
    mode: MatchMode,
) -> Result<Vec<String>, ScanError> {
    let lines = tree.read_lines(file)?;
    Ok(extract(&lines, mode))
}

fn strict_image(line: &str) -> Option<&str> {
    if !line.starts_with("FROM") {
        return None;
    }
    line.split(' ').nth(1).filter(|image| !image.is_empty())
}

fn lenient_image(line: &str) -> Option<&str> {
    let mut fields = line.split_whitespace();
    if !fields.next()?.eq_ignore_ascii_case("FROM") {
        return None;
    }
    fields.find(|f| !f.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_takes_token_after_from() {
        let lines = ["FROM alpine:3.18", "RUN x", "FROM scratch AS final"];
        assert_eq!(extract(&lines, MatchMode::Strict), vec!["alpine:3.18", "scratch"]);
    }

    #[test]
    fn strict_keeps_duplicates() {
        let lines = ["FROM node:20 AS build", "FROM node:20"];
        assert_eq!(extract(&lines, MatchMode::Strict), vec!["node:20", "node:20"]);
    }

    #[test]
    fn strict_ignores_unmatched_forms() {
        let lines = [
            "FROM",
            "FROM\talpine",
            "  FROM indented",
            "from lower",
            "# FROM comment",
            "FROM  double-space",
        ];
        assert!(extract(&lines, MatchMode::Strict).is_empty());
    }

    #[test]
    fn lenient_accepts_common_variants() {
        let lines = [
            "  FROM indented",
            "from lower",
            "FROM\ttabbed AS t",
            "FROM --platform=linux/amd64 golang:1.21 AS build",
            "FROM",
            "FROMAGE brie",
        ];
        assert_eq!(
            extract(&lines, MatchMode::Lenient),
            vec!["indented", "lower", "tabbed", "golang:1.21"]
        );
    }
}
