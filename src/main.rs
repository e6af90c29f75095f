mod cmd;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use fromscan::ScanError;
use fromscan::config::{FailurePolicy, Overrides};
use fromscan::extract::MatchMode;
use fromscan::render::OutputMode;

use cmd::scan::ScanArgs;

#[derive(Parser)]
#[command(name = "fromscan")]
#[command(about = "Report the base images of every Dockerfile in a list of pinned repositories")]
#[command(version)]
struct Cli {
    /// URL of a manifest with one `<repository-url> <commit>` pair per line
    #[arg(conflicts_with = "url")]
    manifest: Option<String>,

    /// Manifest URL (same as the positional argument)
    #[arg(long)]
    url: Option<String>,

    /// Output the structured JSON document instead of the legacy layout
    #[arg(long, visible_alias = "fix")]
    json: bool,

    /// Pretty-print the JSON document
    #[arg(long)]
    pretty: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Record failing entries in the report and keep scanning
    #[arg(long)]
    keep_going: bool,

    /// Also match indented, lower-case and `--platform` FROM lines
    #[arg(long)]
    lenient: bool,

    /// Manifest download timeout in seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    fetch_timeout: Option<u64>,

    /// Per-repository clone timeout in seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    clone_timeout: Option<u64>,

    /// YAML configuration file (defaults to ./fromscan.yaml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            output: self.json.then_some(OutputMode::Json),
            pretty: self.pretty.then_some(true),
            on_error: self.keep_going.then_some(FailurePolicy::KeepGoing),
            match_mode: self.lenient.then_some(MatchMode::Lenient),
            fetch_timeout_secs: self.fetch_timeout,
            clone_timeout_secs: self.clone_timeout,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let Some(manifest_url) = cli.manifest.clone().or_else(|| cli.url.clone()) else {
        Cli::parse_from(["fromscan", "--help"]);
        return ExitCode::SUCCESS;
    };

    let args = ScanArgs {
        manifest_url,
        config: cli.config.clone(),
        overrides: cli.overrides(),
        output: cli.output.clone(),
    };

    match cmd::scan::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = match err.downcast_ref::<ScanError>() {
                Some(scan) => format!("[{}] {}", scan.stage(), scan.chain_message()),
                None => format!("{err:#}"),
            };
            eprintln!("{} {message}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
