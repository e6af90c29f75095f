use std::fmt::{self, Write};

use super::Render;
use crate::error::ScanError;
use crate::report::Report;

/// Fixed text layout: two-space indent steps, commas between
/// siblings only, no trailing newline. Consumers compare it byte for byte.
pub struct Legacy;

impl Render for Legacy {
    fn render(&self, report: &Report) -> Result<String, ScanError> {
        let mut out = String::new();
        write_report(&mut out, report).map_err(|e| ScanError::Serialization(e.into()))?;
        Ok(out)
    }
}

fn write_report(out: &mut String, report: &Report) -> fmt::Result {
    writeln!(out, "{{")?;
    writeln!(out, "  \"data\": {{")?;

    let repos = &report.repositories;
    for (i, repo) in repos.iter().enumerate() {
        let key = format!("{}:{}", repo.url, repo.revision);
        writeln!(out, "    {}: {{", quote(&key))?;

        let files = &repo.dockerfiles;
        for (j, file) in files.iter().enumerate() {
            writeln!(out, "      {}: [", quote(&file.path))?;
            for (k, image) in file.images.iter().enumerate() {
                writeln!(out, "        {}{}", quote(image), separator(k, file.images.len()))?;
            }
            writeln!(out, "      ]{}", separator(j, files.len()))?;
        }

        writeln!(out, "    }}{}", separator(i, repos.len()))?;
    }

    writeln!(out, "  }}")?;
    write!(out, "}}")
}

fn separator(index: usize, len: usize) -> &'static str {
    if index + 1 < len { "," } else { "" }
}

fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}
