//! The default picker: reads a technique's YAML definition from an atomics
//! folder and picks out the requested test.
use crate::{
    atomic::{AtomicTest, Technique},
    errors::AtomicError,
    printer::Printer,
};
use std::path::{Path, PathBuf};

/// Technique ids are filed under their `T`-prefixed form.
fn normalize(id: &str) -> String {
    if id.starts_with('T') {
        id.to_string()
    } else {
        format!("T{}", id)
    }
}

/// Read `<atomics_dir>/<Tid>/<Tid>.yaml`, falling back to `.yml`.
pub fn load_technique(atomics_dir: &Path, id: &str) -> Result<Technique, AtomicError> {
    if atomics_dir.as_os_str().is_empty() {
        return Err(AtomicError::InvalidArguments("missing atomic dir".to_string()));
    }

    let tid = normalize(id);
    let dir = atomics_dir.join(&tid);
    let candidates: Vec<PathBuf> = ["yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", tid, ext)))
        .collect();

    let (path, contents) = candidates
        .iter()
        .find_map(|path| {
            std::fs::read_to_string(path)
                .ok()
                .filter(|contents| !contents.is_empty())
                .map(|contents| (path, contents))
        })
        .ok_or_else(|| {
            AtomicError::AtomicNotFound(format!(
                "missing atomic {}: no {}.yaml in {}",
                tid,
                tid,
                dir.display()
            ))
        })?;

    let mut technique: Technique = serde_yaml::from_str(&contents).map_err(|err| {
        AtomicError::Config(format!(
            "Failed to parse {}: {}",
            path.display(),
            err
        ))
    })?;
    technique.base_dir = atomics_dir.to_path_buf();
    Ok(technique)
}

/// Pick one test: by `index` when it is in range, otherwise by exact `name`.
/// The chosen test is stamped with the technique's base dir.
pub fn select_test(
    technique: Technique,
    name: &str,
    index: Option<usize>,
    printer: &Printer,
) -> Result<AtomicTest, AtomicError> {
    printer.line(format!(
        "  - technique {} has {} tests",
        technique.id,
        technique.atomic_tests.len()
    ));

    let Technique {
        id,
        atomic_tests,
        base_dir,
        ..
    } = technique;

    let mut test = match index.filter(|idx| *idx < atomic_tests.len()) {
        Some(idx) => atomic_tests.into_iter().nth(idx),
        None => {
            let mut matches = atomic_tests.into_iter().filter(|t| t.name == name);
            let first = matches.next();
            if first.is_some() && matches.next().is_some() {
                return Err(AtomicError::AmbiguousTest(name.to_string()));
            }
            first
        }
    }
    .ok_or_else(|| AtomicError::AtomicNotFound(format!("could not find test {}/{}", id, name)))?;

    test.base_dir = base_dir;
    printer.line(format!("  - found test named {}", test.name));
    Ok(test)
}
