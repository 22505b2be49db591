//! Terminal reporting for a run.
//!
//! A [Printer] is a small value handed to each step that reports progress.
//! Quiet mode is part of the value, so a step that wants less output takes a
//! quieter copy instead of flipping shared state.
use crate::{atomic::AtomicTest, config::RunSpec};
use colored::*;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    quiet: bool,
}

impl Printer {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// A copy of this printer with quiet mode switched on when `quiet` is set.
    /// A quiet printer never becomes loud again.
    pub fn with_quiet(self, quiet: bool) -> Self {
        Self {
            quiet: self.quiet || quiet,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn line<D: Display>(&self, msg: D) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    pub fn ok<D: Display>(&self, msg: D) {
        self.line(format!("   {} {}", "✓".green(), msg));
    }

    pub fn fail<D: Display>(&self, msg: D) {
        self.line(format!("   {} {}", "✗".red(), msg.to_string().red()));
    }

    pub fn banner(&self, title: &str) {
        self.line(format!("****** {} ******", title).bold());
    }

    /// Print the execution plan for a run.
    pub fn plan(&self, spec: &RunSpec, test: &AtomicTest) {
        self.line("");
        self.banner("EXECUTION PLAN");
        self.line(format!(" Technique: {}", spec.technique));
        self.line(format!(" Test:      {}", test.name));
        if let Some(stage) = spec.stage {
            self.line(format!(" Stage:     {}", stage));
        }
        if spec.inputs.is_empty() {
            self.line(" Inputs:    <none>");
        } else {
            let inputs = spec
                .inputs
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            self.line(format!(" Inputs:    {}", inputs));
        }
        self.line(" * Use at your own risk :) *".yellow());
        self.line("****************************");
    }
}
