//! Run tests with the least privilege they need.
//!
//! When started as root for a test that doesn't require elevation, the
//! process drops to an unprivileged user and moves to that user's home.
//! Nothing here ever escalates; an unprivileged run of a test that wants
//! elevation only gets a warning.
use crate::atomic::AtomicTest;

/// Fallback identity when no usable user is configured.
pub const NOBODY: &str = "nobody";

/// Pick the identity to drop to: the configured user, else the invoking sudo
/// user, else `nobody`. Root is never a valid target.
pub fn target_user(configured: &str, sudo_user: Option<&str>) -> String {
    let user = if !configured.is_empty() {
        configured
    } else {
        sudo_user.filter(|u| !u.is_empty()).unwrap_or(NOBODY)
    };
    if user == "root" {
        NOBODY.to_string()
    } else {
        user.to_string()
    }
}

#[cfg(unix)]
pub fn manage(test: &AtomicTest, username: &str) {
    // SAFETY: geteuid has no preconditions.
    let euid = unsafe { libc::geteuid() };
    let elevated = test.requires_elevation();

    if euid != 0 {
        if elevated {
            tracing::warn!(uid = euid, "test requires elevated privilege, but running as user");
        }
        return;
    }
    if elevated {
        tracing::info!("test requires elevated privilege, remaining as root");
        return;
    }

    let sudo_user = std::env::var("SUDO_USER").ok();
    let user = target_user(username, sudo_user.as_deref());
    match unix::drop_to(&user) {
        Ok(home) => {
            std::env::set_var("HOME", &home);
            if let Err(err) = std::env::set_current_dir(&home) {
                tracing::warn!(home = %home.display(), %err, "unable to move to home");
            }
            tracing::info!(user = %user, "dropped privilege");
        }
        Err(err) => tracing::error!(user = %user, %err, "unable to drop privilege"),
    }
}

#[cfg(not(unix))]
pub fn manage(test: &AtomicTest, _username: &str) {
    if test.requires_elevation() {
        tracing::warn!("test requires elevated privilege; privilege is not checked on this platform");
    }
}

#[cfg(unix)]
mod unix {
    use super::NOBODY;
    use std::{ffi::CString, io, path::PathBuf};

    /// Switch the process to `user` and return the directory to work from.
    pub fn drop_to(user: &str) -> io::Result<PathBuf> {
        let name = CString::new(user)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "bad user name"))?;

        // SAFETY: name is a valid C string; the returned record is read
        // before any other passwd call can overwrite it.
        let (uid, gid, home) = unsafe {
            let pw = libc::getpwnam(name.as_ptr());
            if pw.is_null() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("unable to get uid for user {}", user),
                ));
            }
            let home = std::ffi::CStr::from_ptr((*pw).pw_dir)
                .to_string_lossy()
                .into_owned();
            ((*pw).pw_uid, (*pw).pw_gid, home)
        };

        // Groups first; once the uid is gone we can't change them.
        // SAFETY: plain syscalls on integer ids; an empty group list needs no
        // buffer.
        if unsafe { libc::setgroups(0, std::ptr::null()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { libc::setgid(gid) } != 0 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { libc::setuid(uid) } != 0 {
            return Err(io::Error::last_os_error());
        }

        if user == NOBODY || home.is_empty() {
            Ok(PathBuf::from("/tmp/"))
        } else {
            Ok(PathBuf::from(home))
        }
    }
}
