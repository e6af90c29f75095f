mod legacy;
mod structured;

pub use legacy::Legacy;
pub use structured::Structured;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::report::Report;

/// Turns a finished report into output text.
pub trait Render {
    fn render(&self, report: &Report) -> Result<String, ScanError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Hand-indented text keyed by `url:revision`.
    #[default]
    Legacy,
    /// `{"data":{"repos":[...]}}` document.
    Json,
}

impl OutputMode {
    pub fn renderer(self, pretty: bool) -> Box<dyn Render> {
        match self {
            Self::Legacy => Box::new(Legacy),
            Self::Json => Box::new(Structured { pretty }),
        }
    }
}
