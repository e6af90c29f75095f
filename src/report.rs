use serde::Serialize;

use crate::error::ScanError;
use crate::manifest::ManifestEntry;

/// Base images referenced by one Dockerfile, in `FROM` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerfileRecord {
    pub path: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub url: String,
    pub revision: String,
    pub dockerfiles: Vec<DockerfileRecord>,
}

/// A failure skipped under the `keep-going` policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub stage: String,
    pub subject: String,
    pub message: String,
}

impl From<&ScanError> for Failure {
    fn from(err: &ScanError) -> Self {
        Self {
            stage: err.stage().to_string(),
            subject: err.subject(),
            message: err.chain_message(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub repositories: Vec<RepositoryRecord>,
    pub failures: Vec<Failure>,
}

impl Report {
    pub fn dockerfile_count(&self) -> usize {
        self.repositories.iter().map(|r| r.dockerfiles.len()).sum()
    }
}

/// Accumulates records in arrival order. A repository is only committed to
/// the report once the next one begins or the builder is finished.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    report: Report,
    current: Option<RepositoryRecord>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_repository(&mut self, entry: &ManifestEntry) {
        self.commit();
        self.current = Some(RepositoryRecord {
            url: entry.url.clone(),
            revision: entry.revision.clone(),
            dockerfiles: Vec::new(),
        });
    }

    /// Drop the repository in progress, e.g. after its checkout failed.
    pub fn abandon_repository(&mut self) {
        self.current = None;
    }

    pub fn push_dockerfile(&mut self, record: DockerfileRecord) {
        let Some(repo) = self.current.as_mut() else {
            return;
        };
        debug_assert!(
            repo.dockerfiles.iter().all(|d| d.path != record.path),
            "{} located twice",
            record.path
        );
        repo.dockerfiles.push(record);
    }

    pub fn record_failure(&mut self, failure: Failure) {
        self.report.failures.push(failure);
    }

    pub fn finish(mut self) -> Report {
        self.commit();
        self.report
    }

    fn commit(&mut self) {
        if let Some(repo) = self.current.take() {
            self.report.repositories.push(repo);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, revision: &str) -> ManifestEntry {
        ManifestEntry {
            url: url.into(),
            revision: revision.into(),
        }
    }

    fn dockerfile(path: &str, images: &[&str]) -> DockerfileRecord {
        DockerfileRecord {
            path: path.into(),
            images: images.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn preserves_arrival_order() {
        let mut builder = ReportBuilder::new();
        builder.begin_repository(&entry("b", "2"));
        builder.push_dockerfile(dockerfile("z/Dockerfile", &["z"]));
        builder.push_dockerfile(dockerfile("a/Dockerfile", &["a", "a"]));
        builder.begin_repository(&entry("a", "1"));
        let report = builder.finish();

        let urls: Vec<&str> = report.repositories.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "a"]);
        assert_eq!(report.repositories[0].dockerfiles[0].path, "z/Dockerfile");
        assert_eq!(report.repositories[0].dockerfiles[1].images, vec!["a", "a"]);
        assert!(report.repositories[1].dockerfiles.is_empty());
        assert_eq!(report.dockerfile_count(), 2);
    }

    #[test]
    fn abandoned_repository_is_not_reported() {
        let mut builder = ReportBuilder::new();
        builder.begin_repository(&entry("gone", "1"));
        builder.abandon_repository();
        builder.record_failure(Failure::from(&ScanError::Cancelled));
        let report = builder.finish();

        assert!(report.repositories.is_empty());
        assert_eq!(report.failures[0].stage, "cancelled");
    }
}
