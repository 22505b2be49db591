use crate::printer::Printer;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

const ATOMICS_FOLDER: &str = "PathToAtomicsFolder";

/// The atomics folder token at the start of a supplied path, with an optional
/// leading `$` and the separator that follows it.
static ATOMICS_FOLDER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?PathToAtomicsFolder[\\/]?").unwrap());

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\{([^{}]+)\}").unwrap());

/// Turn a command template into the literal command text to run.
///
/// The atomics folder token is replaced with `base` verbatim. Each `#{name}`
/// placeholder with a resolved value is replaced in a single pass; values are
/// never re-expanded, and placeholders without a value are left as written.
pub fn interpolate(
    template: &str,
    base: &str,
    args: &BTreeMap<String, String>,
    printer: &Printer,
) -> String {
    let interpolated = template
        .trim()
        .replace(&format!("${}", ATOMICS_FOLDER), base)
        .replace(ATOMICS_FOLDER, base);

    if args.is_empty() {
        return interpolated;
    }

    printer.line("\nInterpolating command with input arguments...");
    let values = args
        .iter()
        .map(|(name, value)| {
            printer.line(format!("  - interpolating [#{{{}}}] => [{}]", name, value));
            (name.as_str(), rebase(value, base))
        })
        .collect::<BTreeMap<_, _>>();

    PLACEHOLDER
        .replace_all(&interpolated, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// A value pointing inside the atomics folder becomes `base/<rest>`, with
/// backslashes turned into forward slashes.
fn rebase(value: &str, base: &str) -> String {
    if !value.contains(ATOMICS_FOLDER) {
        return value.to_string();
    }
    let rest = ATOMICS_FOLDER_PREFIX.replace_all(value, "").replace('\\', "/");
    format!("{}/{}", base.trim_end_matches('/'), rest)
}
