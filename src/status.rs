//! Outcome classification shared with the harness. The numeric value doubles
//! as the process exit code.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Status {
    #[default]
    Unknown,
    MiscError,
    AtomicNotFound,
    CriteriaNotFound,
    Skipped,
    InvalidArguments,
    RunnerFailure,
    PreReqFail,
    TestFail,
    TestSuccess,
    TelemetryToolFailure,
    ValidateFail,
    ValidatePartial,
    ValidateSuccess,
}

const ALL: [Status; 14] = [
    Status::Unknown,
    Status::MiscError,
    Status::AtomicNotFound,
    Status::CriteriaNotFound,
    Status::Skipped,
    Status::InvalidArguments,
    Status::RunnerFailure,
    Status::PreReqFail,
    Status::TestFail,
    Status::TestSuccess,
    Status::TelemetryToolFailure,
    Status::ValidateFail,
    Status::ValidatePartial,
    Status::ValidateSuccess,
];

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for Status {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| ALL.get(idx).copied())
            .ok_or_else(|| format!("unknown test status {}", code))
    }
}
