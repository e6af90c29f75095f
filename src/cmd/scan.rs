use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::style::{self, Stylize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use fromscan::config::{self, Overrides, ScanConfig};
use fromscan::pipeline;
use fromscan::render::OutputMode;
use fromscan::report::Report;
use fromscan::tree::git::GitMaterializer;
use fromscan::{ScanOptions, Scanner};

use crate::progress::Spinner;

pub struct ScanArgs {
    pub manifest_url: String,
    pub config: Option<PathBuf>,
    pub overrides: Overrides,
    pub output: Option<PathBuf>,
}

pub async fn run(args: ScanArgs) -> Result<()> {
    let cfg = config::load(args.config.as_deref(), &args.overrides)?;
    debug!(?cfg, "configuration loaded");

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let spinner = Spinner::new(format!("Fetching manifest {}", args.manifest_url));
    let bar = spinner.clone_bar();
    let scanner = Scanner::new(
        GitMaterializer::new(cfg.clone_timeout(), cancel.clone()),
        ScanOptions::from(&cfg),
    )
    .with_cancel(cancel)
    .on_repository(Box::new(move |i, entry| {
        bar.set_message(format!("[{}] Cloning {} at {}", i + 1, entry.url, short_rev(&entry.revision)));
    }));

    let report = match pipeline::run(&args.manifest_url, &cfg, scanner).await {
        Ok(report) => report,
        Err(err) => {
            spinner.clear();
            return Err(err.into());
        }
    };
    spinner.finish(format!(
        "Scanned {} repositories, {} Dockerfiles",
        report.repositories.len(),
        report.dockerfile_count()
    ));
    print_failure_summary(&report);

    let rendered = cfg.output.renderer(cfg.pretty).render(&report)?;
    write_output(&cfg, &rendered, args.output)
}

fn write_output(cfg: &ScanConfig, rendered: &str, dest: Option<PathBuf>) -> Result<()> {
    if let Some(path) = dest {
        fs::write(&path, rendered)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        eprintln!("{} Wrote {}", "✔".green(), style::style(path.display()).cyan());
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    match cfg.output {
        // The legacy layout has no trailing newline.
        OutputMode::Legacy => write!(stdout, "{rendered}")?,
        OutputMode::Json => writeln!(stdout, "{rendered}")?,
    }
    stdout.flush()?;
    Ok(())
}

fn print_failure_summary(report: &Report) {
    if report.failures.is_empty() {
        return;
    }
    warn!(failures = report.failures.len(), "scan finished with skipped entries");

    let mut stderr = io::stderr();
    let _ = writeln!(
        stderr,
        "{} {} entries skipped",
        "!".yellow().bold(),
        report.failures.len()
    );
    for failure in &report.failures {
        let _ = writeln!(stderr, "  {} {}", style::style(&failure.stage).dim(), failure.message);
    }
}

fn short_rev(revision: &str) -> &str {
    revision.get(..12).unwrap_or(revision)
}
