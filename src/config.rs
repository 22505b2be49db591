//! The run spec: which test to run, where its files live, and what inputs to
//! give it. Read from a harness config file or filled in from CLI flags.
use crate::{cli::Opts, errors::AtomicError, executor::Stage};
use serde::{Deserialize, Deserializer};
use std::{
    collections::BTreeMap,
    io::Read,
    path::{Path, PathBuf},
};

/// One execution request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunSpec {
    #[serde(alias = "Technique")]
    pub technique: String,
    #[serde(alias = "TestName")]
    pub test_name: String,
    /// 0-based test index. Takes precedence over the name when in range.
    #[serde(alias = "TestIndex", deserialize_with = "index_or_none")]
    pub test_index: Option<usize>,
    #[serde(alias = "AtomicsDir")]
    pub atomics_dir: PathBuf,
    #[serde(alias = "TempDir", deserialize_with = "path_or_none")]
    pub temp_dir: Option<PathBuf>,
    #[serde(alias = "ResultsDir", deserialize_with = "path_or_none")]
    pub results_dir: Option<PathBuf>,
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Inputs")]
    pub inputs: BTreeMap<String, String>,
    /// Extra environment variables for every spawned script.
    #[serde(alias = "Env")]
    pub env: BTreeMap<String, String>,
    /// Restrict the run to a single stage.
    #[serde(alias = "Stage", deserialize_with = "stage_or_none")]
    pub stage: Option<Stage>,
}

impl RunSpec {
    /// Read a run spec from `path`. `-` reads JSON from stdin; files ending
    /// in `.toml` are parsed as TOML, anything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self, AtomicError> {
        if path == Path::new("-") {
            let mut contents = String::new();
            std::io::stdin().read_to_string(&mut contents)?;
            return Ok(serde_json::from_str(&contents)?);
        }

        let contents = std::fs::read_to_string(path).map_err(|err| {
            AtomicError::Config(format!(
                "Failed to read run spec {}: {}",
                path.display(),
                err
            ))
        })?;

        let spec = if path.extension().map_or(false, |ext| ext == "toml") {
            toml::from_str(&contents).map_err(|err| {
                AtomicError::Config(format!(
                    "Failed to parse {}: {}",
                    path.display(),
                    err
                ))
            })?
        } else {
            serde_json::from_str(&contents).map_err(|err| {
                AtomicError::Config(format!(
                    "Failed to parse {}: {}",
                    path.display(),
                    err
                ))
            })?
        };
        Ok(spec)
    }

    /// Build the run spec for this invocation: the `--config` file when
    /// given, otherwise the individual flags.
    pub fn from_opts(opts: &Opts) -> Result<Self, AtomicError> {
        if let Some(path) = &opts.config {
            return Self::from_path(path);
        }

        let stage = match opts.stage.as_deref() {
            None | Some("") => None,
            Some(name) => Some(name.parse()?),
        };

        Ok(RunSpec {
            technique: opts.technique.clone().unwrap_or_default(),
            test_name: opts.name.clone().unwrap_or_default(),
            test_index: opts.index,
            atomics_dir: opts.atomics_dir.clone().unwrap_or_default(),
            temp_dir: opts.temp_dir.clone(),
            results_dir: opts.results_dir.clone(),
            username: opts.username.clone().unwrap_or_default(),
            inputs: pairs(&opts.inputs)?,
            env: pairs(&opts.env)?,
            stage,
        })
    }
}

/// Split `key=value` flags into a map.
fn pairs(raw: &[String]) -> Result<BTreeMap<String, String>, AtomicError> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                Ok((key.to_string(), value.to_string()))
            }
            _ => Err(AtomicError::InvalidArguments(format!(
                "expected key=value, got `{}`",
                pair
            ))),
        })
        .collect()
}

/// The harness sends `-1` for "no index".
fn index_or_none<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let idx = Option::<i64>::deserialize(deserializer)?;
    Ok(idx.and_then(|i| usize::try_from(i).ok()))
}

fn path_or_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let path = Option::<String>::deserialize(deserializer)?;
    Ok(path.filter(|p| !p.is_empty()).map(PathBuf::from))
}

fn stage_or_none<'de, D>(deserializer: D) -> Result<Option<Stage>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(name) if name.is_empty() => Ok(None),
        Some(name) => name.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_harness_json() {
        let spec: RunSpec = serde_json::from_str(
            r#"{
                "Technique": "T1070.004",
                "TestName": "Delete a single file",
                "TestIndex": -1,
                "AtomicsDir": "/opt/atomics",
                "TempDir": "",
                "ResultsDir": "/tmp/results",
                "Username": "analyst",
                "Inputs": {"file_to_delete": "/tmp/x"},
                "Stage": ""
            }"#,
        )
        .unwrap();
        assert_eq!(spec.technique, "T1070.004");
        assert_eq!(spec.test_index, None);
        assert_eq!(spec.temp_dir, None);
        assert_eq!(spec.results_dir, Some(PathBuf::from("/tmp/results")));
        assert_eq!(spec.inputs["file_to_delete"], "/tmp/x");
        assert_eq!(spec.stage, None);
    }

    #[test]
    fn index_and_stage_are_parsed() {
        let spec: RunSpec =
            serde_json::from_str(r#"{"test_index": 2, "stage": "cleanup"}"#)
                .unwrap();
        assert_eq!(spec.test_index, Some(2));
        assert_eq!(spec.stage, Some(Stage::Cleanup));
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let res = serde_json::from_str::<RunSpec>(r#"{"Stage": "deploy"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn reads_toml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "technique = \"T1018\"\ntest_index = 0\natomics_dir = \"/opt/atomics\"\n\n[inputs]\nhost = \"10.0.0.1\""
        )
        .unwrap();
        let spec = RunSpec::from_path(file.path()).unwrap();
        assert_eq!(spec.technique, "T1018");
        assert_eq!(spec.test_index, Some(0));
        assert_eq!(spec.inputs["host"], "10.0.0.1");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = RunSpec::from_path(Path::new("/nonexistent/spec.json"))
            .unwrap_err();
        assert!(matches!(err, AtomicError::Config(_)));
    }

    #[test]
    fn key_value_pairs() {
        let map = pairs(&["a=1".to_string(), "b=x=y".to_string()]).unwrap();
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "x=y");
        assert!(pairs(&["novalue".to_string()]).is_err());
        assert!(pairs(&["=v".to_string()]).is_err());
    }
}
