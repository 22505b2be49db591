use crate::{atomic::InputArgument, errors::AtomicError, printer::Printer};
use std::collections::BTreeMap;

/// Resolve a concrete value for every declared input argument: the supplied
/// value when one is given, else the declared default.
///
/// Supplied values for names the test doesn't declare are ignored.
pub fn resolve(
    declared: &BTreeMap<String, InputArgument>,
    supplied: &BTreeMap<String, String>,
    printer: &Printer,
) -> Result<BTreeMap<String, String>, AtomicError> {
    let mut resolved = BTreeMap::new();
    if declared.is_empty() {
        return Ok(resolved);
    }

    printer.line("\nChecking arguments...");
    if !supplied.is_empty() {
        let keys = supplied.keys().cloned().collect::<Vec<_>>().join(", ");
        printer.line(format!("  - supplied in config/flags: {}", keys));
    }

    for (name, arg) in declared {
        printer.line(format!("  - checking for argument {}", name));
        let value = match supplied.get(name).filter(|v| !v.is_empty()) {
            Some(value) => {
                printer.ok("found argument in supplied args");
                value.clone()
            }
            None if !arg.default.is_empty() => {
                printer.ok("found argument in defaults");
                arg.default.clone()
            }
            None => return Err(AtomicError::MissingArgument(name.clone())),
        };
        resolved.insert(name.clone(), value);
    }

    Ok(resolved)
}
