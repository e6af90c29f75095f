use serde::Serialize;

use super::Render;
use crate::error::ScanError;
use crate::report::{Failure, Report};

/// `data.repos[].{url,hash,dockerfile[].{path,from[]}}`, via serde.
pub struct Structured {
    pub pretty: bool,
}

#[derive(Serialize)]
struct Document<'a> {
    data: Data<'a>,
}

#[derive(Serialize)]
struct Data<'a> {
    repos: Vec<Repo<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<&'a Failure>,
}

#[derive(Serialize)]
struct Repo<'a> {
    url: &'a str,
    hash: &'a str,
    dockerfile: Vec<Dockerfile<'a>>,
}

#[derive(Serialize)]
struct Dockerfile<'a> {
    path: &'a str,
    from: &'a [String],
}

impl<'a> From<&'a Report> for Document<'a> {
    fn from(report: &'a Report) -> Self {
        let repos = report
            .repositories
            .iter()
            .map(|repo| Repo {
                url: &repo.url,
                hash: &repo.revision,
                dockerfile: repo
                    .dockerfiles
                    .iter()
                    .map(|d| Dockerfile {
                        path: &d.path,
                        from: &d.images,
                    })
                    .collect(),
            })
            .collect();

        Document {
            data: Data {
                repos,
                failures: report.failures.iter().collect(),
            },
        }
    }
}

impl Render for Structured {
    fn render(&self, report: &Report) -> Result<String, ScanError> {
        let doc = Document::from(report);
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&doc)
        } else {
            serde_json::to_string(&doc)
        };
        rendered.map_err(|e| ScanError::Serialization(e.into()))
    }
}
