//! The atomic test definition model, as read from a technique's YAML file,
//! plus the run state filled in while a test executes.
use crate::status::Status;
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

/// Executor names the definition schema accepts. Only `bash` and `sh` have a
/// shell implementation; see [crate::executor::Shell].
pub const SUPPORTED_EXECUTORS: &[&str] =
    &["bash", "sh", "command_prompt", "powershell"];

pub fn is_supported_executor(name: &str) -> bool {
    SUPPORTED_EXECUTORS.contains(&name)
}

/// A technique file: one attack behavior and the tests implementing it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Technique {
    #[serde(rename = "attack_technique")]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub atomic_tests: Vec<AtomicTest>,
    /// Root of the atomics folder this technique was loaded from.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// One runnable test case.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AtomicTest {
    pub name: String,
    #[serde(
        rename = "auto_generated_guid",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub guid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub supported_platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub input_arguments: BTreeMap<String, InputArgument>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dependency_executor_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    pub executor: Option<ExecutorSpec>,

    // Run state, filled in by the engine.
    #[serde(skip_deserializing)]
    pub base_dir: PathBuf,
    #[serde(rename = "tempdir", skip_deserializing)]
    pub temp_dir: PathBuf,
    #[serde(rename = "test_status", skip_deserializing)]
    pub status: Status,
    #[serde(skip_deserializing)]
    pub is_cleaned_up: bool,
    #[serde(skip_deserializing, skip_serializing_if = "BTreeMap::is_empty")]
    pub args_used: BTreeMap<String, String>,
    /// Unix time in nanoseconds when the test stage started.
    #[serde(skip_deserializing)]
    pub start_time: i64,
    #[serde(skip_deserializing)]
    pub end_time: i64,
}

impl AtomicTest {
    pub fn requires_elevation(&self) -> bool {
        self.executor
            .as_ref()
            .map(|e| e.elevation_required)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputArgument {
    #[serde(default)]
    pub description: String,
    /// Declared type. Advisory only.
    #[serde(rename = "type", default)]
    pub arg_type: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub default: String,
    /// The value the test stage actually ran with.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expected_value: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Dependency {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prereq_command: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub get_prereq_command: String,
}

/// The command surface for a test.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExecutorSpec {
    pub name: String,
    #[serde(default)]
    pub elevation_required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    /// Manual steps. Never executed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub steps: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cleanup_command: String,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub executed_command: Option<ExecutedCommand>,
}

/// Record of what the test stage ran and what came back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutedCommand {
    pub command: String,
    pub output: String,
    pub error: String,
}

/// Accept any YAML scalar where a string is expected. Argument defaults are
/// frequently written as bare numbers or booleans.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Str(s)) => s,
        Some(Scalar::Int(i)) => i.to_string(),
        Some(Scalar::Float(f)) => f.to_string(),
        Some(Scalar::Bool(b)) => b.to_string(),
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TECHNIQUE: &str = r#"
attack_technique: T1070.004
display_name: "Indicator Removal: File Deletion"
atomic_tests:
- name: Delete a single file
  auto_generated_guid: 562d737f-2fc6-4b09-8c2a-7f8ff0828480
  description: Delete a single file from the temporary directory
  supported_platforms:
  - linux
  - macos
  input_arguments:
    file_to_delete:
      description: Path of file to delete
      type: path
      default: /tmp/victim-files/a
    count:
      description: How many
      type: integer
      default: 3
  dependencies:
  - description: victim file must exist
    prereq_command: test -f #{file_to_delete}
    get_prereq_command: touch #{file_to_delete}
  executor:
    name: sh
    elevation_required: false
    command: rm -f #{file_to_delete}
"#;

    #[test]
    fn parses_technique_definition() {
        let technique: Technique = serde_yaml::from_str(TECHNIQUE).unwrap();
        assert_eq!(technique.id, "T1070.004");
        let test = &technique.atomic_tests[0];
        assert_eq!(test.supported_platforms, vec!["linux", "macos"]);
        assert_eq!(test.dependencies.len(), 1);
        assert_eq!(
            test.input_arguments["file_to_delete"].default,
            "/tmp/victim-files/a"
        );
        assert_eq!(test.input_arguments["count"].default, "3");
        assert_eq!(test.input_arguments["count"].arg_type, "integer");
        let executor = test.executor.as_ref().unwrap();
        assert_eq!(executor.name, "sh");
        assert!(executor.cleanup_command.is_empty());
        assert_eq!(test.status, Status::Unknown);
        assert!(!test.requires_elevation());
    }

    #[test]
    fn executor_name_schema() {
        assert!(is_supported_executor("bash"));
        assert!(is_supported_executor("powershell"));
        assert!(!is_supported_executor("zsh"));
        assert!(!is_supported_executor(""));
    }
}
