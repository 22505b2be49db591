use crate::errors::AtomicError;
use std::{
    collections::BTreeMap,
    fmt, io,
    path::PathBuf,
    process::Stdio,
    time::Duration,
};
use tokio::{
    fs,
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
    time,
};

/// Shells that scripts can run through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Sh,
}

impl Shell {
    /// Look up the shell for an executor name. `command_prompt` and
    /// `powershell` are valid in definitions but have no implementation here.
    pub fn from_name(name: &str) -> Result<Self, AtomicError> {
        match name {
            "bash" => Ok(Shell::Bash),
            "sh" => Ok(Shell::Sh),
            other => Err(AtomicError::UnsupportedExecutor(other.to_string())),
        }
    }

    /// Program to invoke. Also used as the script file extension.
    pub fn program(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Sh => "sh",
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program())
    }
}

/// A script to run through a shell.
pub struct Script<'a> {
    pub shell: Shell,
    pub command: &'a str,
    /// File the command text is written to before running.
    pub path: PathBuf,
    pub deadline: Duration,
    /// Added on top of the inherited environment.
    pub env: &'a BTreeMap<String, String>,
}

impl Script<'_> {
    fn construct_command(&self) -> Command {
        let mut cmd = Command::new(self.shell.program());
        cmd.arg(&self.path)
            .envs(self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group so a timeout takes down anything the script
        // started as well.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }

    /// Write the command to its script file and run it, returning stdout and
    /// stderr combined in arrival order.
    ///
    /// When the deadline passes the process group is killed and the output
    /// captured so far comes back inside [AtomicError::ProcessTimedOut].
    pub async fn run(&self) -> Result<String, AtomicError> {
        fs::write(&self.path, self.command).await.map_err(|err| {
            AtomicError::RunnerFailure(format!(
                "writing command to {}: {}",
                self.path.display(),
                err
            ))
        })?;

        tracing::debug!(shell = %self.shell, script = %self.path.display(), "spawning script");
        let mut child = self.construct_command().spawn().map_err(|err| {
            AtomicError::RunnerFailure(format!("spawning {}: {}", self.shell, err))
        })?;

        let mut output = Vec::new();
        let finished =
            time::timeout(self.deadline, collect(&mut child, &mut output)).await;
        let output = String::from_utf8_lossy(&output).into_owned();

        match finished {
            Err(_) => {
                kill(&mut child).await;
                tracing::debug!(script = %self.path.display(), "script timed out");
                Err(AtomicError::ProcessTimedOut {
                    deadline: self.deadline,
                    output,
                })
            }
            Ok(Err(err)) => Err(AtomicError::RunnerFailure(format!(
                "running {} script: {}",
                self.shell, err
            ))),
            Ok(Ok(status)) if status.success() => Ok(output),
            Ok(Ok(status)) => Err(AtomicError::ProcessExecFailed {
                shell: self.shell.to_string(),
                code: status.code(),
                output,
            }),
        }
    }
}

/// Drain both pipes into `buf` until they close, then wait for exit.
async fn collect(
    child: &mut Child,
    buf: &mut Vec<u8>,
) -> io::Result<std::process::ExitStatus> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let (mut out_chunk, mut err_chunk) = ([0u8; 4096], [0u8; 4096]);

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            n = read_some(&mut stdout, &mut out_chunk), if stdout.is_some() => {
                match n? {
                    0 => stdout = None,
                    n => buf.extend_from_slice(&out_chunk[..n]),
                }
            }
            n = read_some(&mut stderr, &mut err_chunk), if stderr.is_some() => {
                match n? {
                    0 => stderr = None,
                    n => buf.extend_from_slice(&err_chunk[..n]),
                }
            }
        }
    }

    child.wait().await
}

async fn read_some<R: AsyncRead + Unpin>(
    pipe: &mut Option<R>,
    chunk: &mut [u8],
) -> io::Result<usize> {
    match pipe {
        Some(pipe) => pipe.read(chunk).await,
        None => Ok(0),
    }
}

async fn kill(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: signalling a process group we created; no memory is shared.
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
        }
    }
    if let Err(err) = child.kill().await {
        tracing::debug!(%err, "child already gone");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{path::Path, time::Instant};

    fn sh_script<'a>(
        dir: &Path,
        command: &'a str,
        deadline: Duration,
        env: &'a BTreeMap<String, String>,
    ) -> Script<'a> {
        Script {
            shell: Shell::Sh,
            command,
            path: dir.join("atomic-T0000-test.sh"),
            deadline,
            env,
        }
    }

    #[test]
    fn only_bourne_shells_are_implemented() {
        assert_eq!(Shell::from_name("bash").unwrap(), Shell::Bash);
        assert_eq!(Shell::from_name("sh").unwrap(), Shell::Sh);
        for name in &["powershell", "command_prompt", "zsh", ""] {
            assert!(matches!(
                Shell::from_name(name),
                Err(AtomicError::UnsupportedExecutor(_))
            ));
        }
    }

    #[tokio::test]
    async fn captures_combined_output() {
        let dir = tempfile::tempdir().unwrap();
        let env = BTreeMap::new();
        let script =
            sh_script(dir.path(), "echo out\necho err 1>&2", Duration::from_secs(10), &env);
        let output = script.run().await.unwrap();
        assert!(output.contains("out"));
        assert!(output.contains("err"));
        assert_eq!(
            std::fs::read_to_string(&script.path).unwrap(),
            "echo out\necho err 1>&2"
        );
    }

    #[tokio::test]
    async fn nonzero_exit_carries_output() {
        let dir = tempfile::tempdir().unwrap();
        let env = BTreeMap::new();
        let script = sh_script(dir.path(), "echo boom; exit 3", Duration::from_secs(10), &env);
        match script.run().await.unwrap_err() {
            AtomicError::ProcessExecFailed { code, output, .. } => {
                assert_eq!(code, Some(3));
                assert!(output.contains("boom"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn extra_env_is_visible() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = BTreeMap::new();
        env.insert("ATOMIC_MARKER".to_string(), "present".to_string());
        let script = sh_script(dir.path(), "echo $ATOMIC_MARKER", Duration::from_secs(10), &env);
        assert_eq!(script.run().await.unwrap().trim(), "present");
    }

    #[tokio::test]
    async fn deadline_kills_and_keeps_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let env = BTreeMap::new();
        let script =
            sh_script(dir.path(), "echo started\nsleep 30\necho never", Duration::from_secs(1), &env);
        let start = Instant::now();
        let err = script.run().await.unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(5));
        match err {
            AtomicError::ProcessTimedOut { output, deadline } => {
                assert_eq!(deadline, Duration::from_secs(1));
                assert!(output.contains("started"));
                assert!(!output.contains("never"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
