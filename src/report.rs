//! Serialize a finished test into a run summary.
use crate::{atomic::AtomicTest, errors::AtomicError};
use std::{fs, path::Path, str::FromStr};

/// Output format of the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsFormat {
    Json,
    Yaml,
}

impl ResultsFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ResultsFormat::Json => "json",
            ResultsFormat::Yaml => "yaml",
        }
    }

    pub fn render(&self, test: &AtomicTest) -> Result<String, AtomicError> {
        let rendered = match self {
            ResultsFormat::Json => serde_json::to_string_pretty(test).map_err(|err| {
                AtomicError::RunnerFailure(format!("failed to marshal report: {}", err))
            })?,
            ResultsFormat::Yaml => serde_yaml::to_string(test).map_err(|err| {
                AtomicError::RunnerFailure(format!("failed to marshal report: {}", err))
            })?,
        };
        Ok(rendered)
    }
}

impl FromStr for ResultsFormat {
    type Err = AtomicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ResultsFormat::Json),
            "yaml" => Ok(ResultsFormat::Yaml),
            other => Err(AtomicError::InvalidArguments(format!(
                "unknown results format provided: {}",
                other
            ))),
        }
    }
}

/// Write `run_summary.<ext>` into `results_dir`, or print to stdout when no
/// directory was requested.
pub fn write(
    test: &AtomicTest,
    format: ResultsFormat,
    results_dir: Option<&Path>,
) -> Result<(), AtomicError> {
    let summary = format.render(test)?;
    match results_dir {
        None => println!("{}", summary),
        Some(dir) => {
            let path = dir.join(format!("run_summary.{}", format.extension()));
            fs::write(&path, summary).map_err(|err| {
                AtomicError::RunnerFailure(format!(
                    "unable to write results file {}: {}",
                    path.display(),
                    err
                ))
            })?;
        }
    }
    Ok(())
}
