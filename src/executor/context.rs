use super::{platform::Platform, Stage};
use crate::{config::RunSpec, printer::Printer};
use std::{path::Path, time::Duration};

/// How long each stage's scripts may run before being killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub test: Duration,
    /// Dependency checks, remediation, and cleanup.
    pub other: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            test: Duration::from_secs(30),
            other: Duration::from_secs(15),
        }
    }
}

impl Deadlines {
    pub fn for_stage(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Test => self.test,
            Stage::Prereq | Stage::Cleanup => self.other,
        }
    }
}

/// Everything a run needs besides the test itself.
pub struct Context<'a> {
    pub spec: &'a RunSpec,
    /// Script files are written here.
    pub scratch_dir: &'a Path,
    pub printer: Printer,
    pub deadlines: Deadlines,
    /// Platform bucket the test must support.
    pub host: Option<Platform>,
}

impl<'a> Context<'a> {
    pub fn new(spec: &'a RunSpec, scratch_dir: &'a Path, printer: Printer) -> Self {
        Self {
            spec,
            scratch_dir,
            printer,
            deadlines: Deadlines::default(),
            host: Platform::host(),
        }
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    pub fn with_host(mut self, host: Option<Platform>) -> Self {
        self.host = host;
        self
    }
}
