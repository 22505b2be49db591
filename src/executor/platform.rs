use crate::{atomic::AtomicTest, errors::AtomicError, printer::Printer};
use std::fmt;

/// Platform buckets used by test definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Macos,
    Windows,
}

impl Platform {
    /// Bucket for an OS name as reported by `std::env::consts::OS`. BSDs and
    /// Solaris count as linux.
    pub fn from_os(os: &str) -> Option<Self> {
        match os {
            "linux" | "freebsd" | "netbsd" | "openbsd" | "dragonfly" | "solaris"
            | "illumos" => Some(Platform::Linux),
            "macos" => Some(Platform::Macos),
            "windows" => Some(Platform::Windows),
            _ => None,
        }
    }

    pub fn host() -> Option<Self> {
        Self::from_os(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fail unless `test` declares support for the `host` platform.
pub fn check(
    test: &AtomicTest,
    host: Option<Platform>,
    printer: &Printer,
) -> Result<(), AtomicError> {
    let host = host.ok_or_else(|| {
        AtomicError::InvalidArguments("unable to detect our platform".to_string())
    })?;

    printer.line(format!("\nChecking platform vs our platform ({})...", host));
    if test.supported_platforms.iter().any(|p| p == host.as_str()) {
        printer.ok("our platform is supported!");
        Ok(())
    } else {
        Err(AtomicError::InvalidArguments(format!(
            "unable to run test that supports platforms {:?} because we are on {}",
            test.supported_platforms, host
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_for(platforms: &[&str]) -> AtomicTest {
        AtomicTest {
            supported_platforms: platforms.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn bsds_collapse_into_linux() {
        assert_eq!(Platform::from_os("freebsd"), Some(Platform::Linux));
        assert_eq!(Platform::from_os("openbsd"), Some(Platform::Linux));
        assert_eq!(Platform::from_os("macos"), Some(Platform::Macos));
        assert_eq!(Platform::from_os("windows"), Some(Platform::Windows));
        assert_eq!(Platform::from_os("haiku"), None);
    }

    #[test]
    fn mismatch_is_invalid_arguments() {
        let printer = Printer::new(true);
        let err = check(&test_for(&["windows"]), Some(Platform::Linux), &printer)
            .unwrap_err();
        assert!(matches!(err, AtomicError::InvalidArguments(_)));
        assert!(check(&test_for(&["linux", "macos"]), Some(Platform::Macos), &printer).is_ok());
        assert!(check(&test_for(&[]), Some(Platform::Linux), &printer).is_err());
    }

    #[test]
    fn unknown_host_is_rejected() {
        assert!(check(&test_for(&["linux"]), None, &Printer::new(true)).is_err());
    }
}
