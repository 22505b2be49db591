//! Run atomic adversary-emulation tests and capture the evidence.
//!
//! An atomic test is a small, self-contained procedure that exercises one
//! attack technique. Tests are defined in YAML files under an atomics folder,
//! one file per technique:
//! ```text
//! atomics/
//!   T1070.004/
//!     T1070.004.yaml
//! ```
//!
//! ## Test Model
//! Each test declares the platforms it supports, typed input arguments with
//! defaults, an ordered list of dependencies, and an executor holding the
//! command to run and an optional cleanup command:
//! ```yaml
//! - name: Delete a single file
//!   supported_platforms: [linux, macos]
//!   input_arguments:
//!     file_to_delete:
//!       description: Path of file to delete
//!       type: path
//!       default: /tmp/victim-files/a
//!   dependencies:
//!   - description: victim file must exist
//!     prereq_command: test -f #{file_to_delete}
//!     get_prereq_command: touch #{file_to_delete}
//!   executor:
//!     name: sh
//!     command: rm -f #{file_to_delete}
//! ```
//! `#{name}` is replaced with the argument's value and `PathToAtomicsFolder`
//! with the atomics folder.
//!
//! ## Running a Test
//! ```bash
//! atomic-runner -t T1070.004 -n "Delete a single file" --atomicsdir ./atomics
//! ```
//! A run goes through three stages in order:
//!   - prereq: each dependency check runs; a failing check runs its
//!     remediation, and a failing remediation aborts the run.
//!   - test: the test command runs, bounded by a 30 second deadline.
//!   - cleanup: the cleanup command runs. Failures are only reported.
//!
//! `--stage` restricts a run to one of them. Each script is written into a
//! scratch directory that is removed when the run ends.
//!
//! ## Results
//! The test, with the arguments used, the literal command, its combined output
//! and the status, is written as `run_summary.json` (or `.yaml`) into
//! `--resultsdir`. The status is also the exit code:
//! ```text
//! 5  invalid arguments (platform mismatch, unsupported executor, ...)
//! 7  a dependency could not be satisfied
//! 8  the test command failed or timed out
//! 9  the test command succeeded
//! ```
pub mod atomic;
pub mod cli;
pub mod config;
pub mod errors;
pub mod executor;
pub mod logging;
pub mod picker;
pub mod printer;
pub mod privilege;
pub mod report;
pub mod status;
