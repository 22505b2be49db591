use crate::status::Status;
use std::{error, fmt, io, time::Duration};

/// An error from the atomic runner.
pub enum AtomicError {
    /// A declared input argument has neither a supplied value nor a default.
    MissingArgument(String),
    /// The request can't be satisfied on this host or with this definition.
    InvalidArguments(String),
    /// The named executor has no shell implementation.
    UnsupportedExecutor(String),
    /// A dependency check and its remediation both failed.
    PreReqCheckFailed(String),
    /// The script ran past its stage deadline and was killed. Carries the
    /// output captured before termination.
    ProcessTimedOut { deadline: Duration, output: String },
    /// The script exited unsuccessfully.
    ProcessExecFailed {
        shell: String,
        code: Option<i32>,
        output: String,
    },
    /// Environment-level failure such as an unwritable scratch directory.
    RunnerFailure(String),
    /// The technique file or the requested test doesn't exist.
    AtomicNotFound(String),
    /// More than one test carries the requested name.
    AmbiguousTest(String),
    /// A run spec or test definition couldn't be parsed.
    Config(String),
}

impl AtomicError {
    /// Status code reported to the caller when a run ends with this error.
    pub fn status(&self) -> Status {
        match self {
            AtomicError::MissingArgument(_)
            | AtomicError::InvalidArguments(_)
            | AtomicError::UnsupportedExecutor(_)
            | AtomicError::AmbiguousTest(_)
            | AtomicError::Config(_) => Status::InvalidArguments,
            AtomicError::PreReqCheckFailed(_) => Status::PreReqFail,
            AtomicError::ProcessTimedOut { .. }
            | AtomicError::ProcessExecFailed { .. } => Status::TestFail,
            AtomicError::RunnerFailure(_) => Status::RunnerFailure,
            AtomicError::AtomicNotFound(_) => Status::AtomicNotFound,
        }
    }

    /// Output captured from a process before it failed, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            AtomicError::ProcessTimedOut { output, .. }
            | AtomicError::ProcessExecFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl fmt::Display for AtomicError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AtomicError::MissingArgument(name) => write!(
                f,
                "argument [{}] is required but not set and has no default",
                name
            ),
            AtomicError::InvalidArguments(msg) => write!(f, "{}", msg),
            AtomicError::UnsupportedExecutor(name) => {
                write!(f, "executor {} is not supported", name)
            }
            AtomicError::PreReqCheckFailed(msg) => {
                write!(f, "not all dependency checks passed: {}", msg)
            }
            AtomicError::ProcessTimedOut { deadline, .. } => write!(
                f,
                "TIMED OUT: script killed after {}s",
                deadline.as_secs_f32()
            ),
            AtomicError::ProcessExecFailed { shell, code, .. } => match code {
                Some(code) => {
                    write!(f, "executing {} script: exit status {}", shell, code)
                }
                None => write!(
                    f,
                    "executing {} script: terminated by signal",
                    shell
                ),
            },
            AtomicError::RunnerFailure(msg) => write!(f, "{}", msg),
            AtomicError::AtomicNotFound(msg) => write!(f, "{}", msg),
            AtomicError::AmbiguousTest(name) => {
                write!(f, "more than one test is named {}", name)
            }
            AtomicError::Config(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Debug for AtomicError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl error::Error for AtomicError {}

impl From<io::Error> for AtomicError {
    fn from(err: io::Error) -> Self {
        AtomicError::RunnerFailure(err.to_string())
    }
}

impl From<serde_json::Error> for AtomicError {
    fn from(err: serde_json::Error) -> Self {
        AtomicError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for AtomicError {
    fn from(err: serde_yaml::Error) -> Self {
        AtomicError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for AtomicError {
    fn from(err: toml::de::Error) -> Self {
        AtomicError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_spawn_errors_map_to_invalid_arguments() {
        assert_eq!(
            AtomicError::MissingArgument("file".into()).status(),
            Status::InvalidArguments
        );
        assert_eq!(
            AtomicError::UnsupportedExecutor("powershell".into()).status(),
            Status::InvalidArguments
        );
    }

    #[test]
    fn process_errors_carry_output() {
        let err = AtomicError::ProcessTimedOut {
            deadline: Duration::from_secs(1),
            output: "partial".into(),
        };
        assert_eq!(err.status(), Status::TestFail);
        assert_eq!(err.output(), Some("partial"));
        assert!(err.to_string().starts_with("TIMED OUT"));
        assert_eq!(AtomicError::RunnerFailure("x".into()).output(), None);
    }

    #[test]
    fn missing_argument_names_the_key() {
        let err = AtomicError::MissingArgument("output_file".into());
        assert!(err.to_string().contains("[output_file]"));
    }
}
