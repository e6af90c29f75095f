use std::time::Duration;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to fetch manifest {url}")]
    ManifestFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed manifest line {line_number}: {line:?}")]
    MalformedManifestLine { line_number: usize, line: String },

    #[error("failed to clone {url}")]
    Checkout {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("revision {revision} not found in {url}")]
    RevisionNotFound {
        url: String,
        revision: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to read {path} in {url}")]
    FileRead {
        url: String,
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to render report")]
    Serialization(#[source] BoxError),

    #[error("scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// Pipeline stage the error was raised in, used for diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ManifestFetch { .. } => "manifest-fetch",
            Self::MalformedManifestLine { .. } => "manifest-parse",
            Self::Checkout { .. } => "checkout",
            Self::RevisionNotFound { .. } => "revision",
            Self::FileRead { .. } => "file-read",
            Self::Serialization(_) => "render",
            Self::Cancelled => "cancelled",
        }
    }

    /// The input the error is about: a URL, a revision, a path or a manifest line.
    pub fn subject(&self) -> String {
        match self {
            Self::ManifestFetch { url, .. } | Self::Checkout { url, .. } => url.clone(),
            Self::MalformedManifestLine { line, .. } => line.clone(),
            Self::RevisionNotFound { url, revision, .. } => format!("{url}:{revision}"),
            Self::FileRead { url, path, .. } => format!("{url}:{path}"),
            Self::Serialization(_) | Self::Cancelled => String::new(),
        }
    }

    /// Only per-entry and per-file failures may be skipped under `keep-going`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedManifestLine { .. }
                | Self::Checkout { .. }
                | Self::RevisionNotFound { .. }
                | Self::FileRead { .. }
        )
    }

    /// Error message with its whole source chain, on one line.
    pub fn chain_message(&self) -> String {
        let mut s = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            s.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        s
    }
}

#[derive(Debug, Error)]
#[error("timed out after {}s", .0.as_secs())]
pub struct TimedOut(pub Duration);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_message_includes_sources() {
        let err = ScanError::Checkout {
            url: "https://example.com/a.git".into(),
            source: Box::new(TimedOut(Duration::from_secs(5))),
        };
        assert_eq!(err.stage(), "checkout");
        assert_eq!(
            err.chain_message(),
            "failed to clone https://example.com/a.git: timed out after 5s"
        );
    }

    #[test]
    fn fatal_errors_are_not_recoverable() {
        assert!(!ScanError::Cancelled.is_recoverable());
        assert!(!ScanError::Serialization("boom".into()).is_recoverable());
        assert!(
            ScanError::MalformedManifestLine {
                line_number: 1,
                line: "x".into()
            }
            .is_recoverable()
        );
    }
}
