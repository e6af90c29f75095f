use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{FailurePolicy, ScanConfig};
use crate::error::ScanError;
use crate::extract::{self, MatchMode};
use crate::locate;
use crate::manifest::{self, ManifestEntry};
use crate::report::{DockerfileRecord, Failure, Report, ReportBuilder};
use crate::tree::Materializer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub policy: FailurePolicy,
    pub match_mode: MatchMode,
}

impl From<&ScanConfig> for ScanOptions {
    fn from(cfg: &ScanConfig) -> Self {
        Self {
            policy: cfg.on_error,
            match_mode: cfg.match_mode,
        }
    }
}

/// Optional callback invoked before each repository is materialized.
pub type OnRepository = Box<dyn FnMut(usize, &ManifestEntry) + Send>;

/// Runs manifest entries through materialize → locate → extract, one at a time.
pub struct Scanner<M> {
    materializer: M,
    options: ScanOptions,
    cancel: CancellationToken,
    on_repository: Option<OnRepository>,
}

impl<M: Materializer> Scanner<M> {
    pub fn new(materializer: M, options: ScanOptions) -> Self {
        Self {
            materializer,
            options,
            cancel: CancellationToken::new(),
            on_repository: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn on_repository(mut self, callback: OnRepository) -> Self {
        self.on_repository = Some(callback);
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Scan `entries` in order. Under [`FailurePolicy::Abort`] the first error is
    /// returned and no report is produced.
    pub fn scan<I>(&mut self, entries: I) -> Result<Report, ScanError>
    where
        I: IntoIterator<Item = Result<ManifestEntry, ScanError>>,
    {
        let mut builder = ReportBuilder::new();

        for (index, entry) in entries.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.skip_or_abort(&mut builder, err)?;
                    continue;
                }
            };

            if let Some(cb) = self.on_repository.as_mut() {
                cb(index, &entry);
            }

            builder.begin_repository(&entry);
            if let Err(err) = self.scan_repository(&entry, &mut builder) {
                builder.abandon_repository();
                self.skip_or_abort(&mut builder, err)?;
            }
        }

        Ok(builder.finish())
    }

    fn scan_repository(&self, entry: &ManifestEntry, builder: &mut ReportBuilder) -> Result<(), ScanError> {
        let tree = self.materializer.materialize(&entry.url, &entry.revision)?;
        let files = locate::locate(&tree)?;
        info!(url = %entry.url, revision = %entry.revision, dockerfiles = files.len(), "scanning repository");

        for file in files {
            if self.cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }

            match extract::extract_file(&tree, &file, self.options.match_mode) {
                Ok(images) => {
                    debug!(path = %file.path, ?images, "extracted base images");
                    builder.push_dockerfile(DockerfileRecord {
                        path: file.path,
                        images,
                    });
                }
                Err(err) => self.skip_or_abort(builder, err)?,
            }
        }

        Ok(())
    }

    fn skip_or_abort(&self, builder: &mut ReportBuilder, err: ScanError) -> Result<(), ScanError> {
        if self.options.policy == FailurePolicy::KeepGoing && err.is_recoverable() {
            warn!(stage = err.stage(), "{}", err.chain_message());
            builder.record_failure(Failure::from(&err));
            Ok(())
        } else {
            Err(err)
        }
    }
}

/// Fetch the manifest at `manifest_url` and scan it on a blocking thread.
pub async fn run<M>(manifest_url: &str, config: &ScanConfig, mut scanner: Scanner<M>) -> Result<Report, ScanError>
where
    M: Materializer + Send + 'static,
{
    let cancel = scanner.cancel_token().clone();
    let data = tokio::select! {
        data = manifest::fetch(manifest_url, config.fetch_timeout()) => data?,
        _ = cancel.cancelled() => return Err(ScanError::Cancelled),
    };

    // Aborting validates every line before the first clone.
    let entries: Vec<Result<ManifestEntry, ScanError>> = match config.on_error {
        FailurePolicy::Abort => manifest::parse(&data)?.into_iter().map(Ok).collect(),
        FailurePolicy::KeepGoing => manifest::entries(&data).collect(),
    };
    info!(entries = entries.len(), "manifest parsed");

    match tokio::task::spawn_blocking(move || scanner.scan(entries)).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(ScanError::Cancelled),
    }
}
