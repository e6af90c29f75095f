use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::extract::MatchMode;
use crate::render::OutputMode;

pub const DEFAULT_CONFIG_FILE: &str = "fromscan.yaml";
pub const ENV_PREFIX: &str = "FROMSCAN_";

/// What to do when a manifest line, a repository or a file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failure; nothing is rendered.
    #[default]
    Abort,
    /// Record the failure in the report and carry on.
    KeepGoing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub output: OutputMode,
    pub pretty: bool,
    pub on_error: FailurePolicy,
    pub match_mode: MatchMode,
    /// Seconds; 0 disables the limit.
    pub fetch_timeout_secs: u64,
    /// Seconds; 0 disables the limit.
    pub clone_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            output: OutputMode::Legacy,
            pretty: false,
            on_error: FailurePolicy::Abort,
            match_mode: MatchMode::Strict,
            fetch_timeout_secs: 60,
            clone_timeout_secs: 600,
        }
    }
}

impl ScanConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }
}

/// Command-line values; unset fields leave lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_error: Option<FailurePolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_timeout_secs: Option<u64>,
}

/// Defaults, then the YAML file, then `FROMSCAN_*` variables, then `overrides`.
///
/// An explicit `path` must exist; the default `fromscan.yaml` is optional.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<ScanConfig> {
    let file = match path {
        Some(p) => {
            if !p.is_file() {
                anyhow::bail!("Config file {} not found", p.display());
            }
            p
        }
        None => Path::new(DEFAULT_CONFIG_FILE),
    };

    Figment::from(Serialized::defaults(ScanConfig::default()))
        .merge(Yaml::file(file))
        .merge(Env::prefixed(ENV_PREFIX))
        .merge(Serialized::defaults(overrides))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", file.display()))
}
