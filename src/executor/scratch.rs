use crate::errors::AtomicError;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Working directory for script files. Removed when dropped, whether the
/// directory was created here or supplied by the caller.
pub struct ScratchDir {
    dir: Dir,
}

enum Dir {
    Fresh(TempDir),
    Supplied(PathBuf),
}

impl ScratchDir {
    /// Create a fresh scratch directory, or create (if needed) and adopt the
    /// caller-supplied `path`.
    pub fn create(path: Option<&Path>) -> Result<Self, AtomicError> {
        let dir = match path {
            None => {
                let tmp = tempfile::Builder::new()
                    .prefix("atomic-")
                    .tempdir()
                    .map_err(|err| {
                        AtomicError::RunnerFailure(format!("Error making temp dir: {}", err))
                    })?;
                Dir::Fresh(tmp)
            }
            Some(path) => {
                fs::create_dir_all(path).map_err(|err| {
                    AtomicError::RunnerFailure(format!(
                        "Error making temp dir {}: {}",
                        path.display(),
                        err
                    ))
                })?;
                if !path.is_dir() {
                    return Err(AtomicError::RunnerFailure(format!(
                        "{} is not a directory",
                        path.display()
                    )));
                }
                Dir::Supplied(path.to_path_buf())
            }
        };

        let scratch = ScratchDir { dir };
        scratch.open_up()?;
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Dir::Fresh(tmp) => tmp.path(),
            Dir::Supplied(path) => path.as_path(),
        }
    }

    /// Scripts may run as a de-privileged user, who still needs to write here.
    #[cfg(unix)]
    fn open_up(&self) -> Result<(), AtomicError> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(self.path(), fs::Permissions::from_mode(0o777))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn open_up(&self) -> Result<(), AtomicError> {
        Ok(())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Dir::Supplied(path) = &self.dir {
            if let Err(err) = fs::remove_dir_all(path) {
                tracing::warn!(path = %path.display(), %err, "failed to remove scratch dir");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_dir_is_removed_on_drop() {
        let scratch = ScratchDir::create(None).unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.is_dir());
        fs::write(path.join("atomic-T1-test.sh"), "true").unwrap();
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn supplied_dir_is_created_and_removed() {
        let parent = tempfile::tempdir().unwrap();
        let wanted = parent.path().join("nested").join("scratch");
        let scratch = ScratchDir::create(Some(&wanted)).unwrap();
        assert_eq!(scratch.path(), wanted.as_path());
        assert!(wanted.is_dir());
        drop(scratch);
        assert!(!wanted.exists());
    }

    #[test]
    fn file_in_the_way_is_a_runner_failure() {
        let parent = tempfile::tempdir().unwrap();
        let file = parent.path().join("taken");
        fs::write(&file, "x").unwrap();
        let err = ScratchDir::create(Some(&file)).err().unwrap();
        assert!(matches!(err, AtomicError::RunnerFailure(_)));
    }
}
