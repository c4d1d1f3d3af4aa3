use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::Result;

/// What a finished process left behind. Suppressed streams are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    /// `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs shell command strings. The controller only talks to the outside world through this
/// trait, so alternative runners can stand in for a real raxmlHPC installation.
pub trait CommandRunner {
    /// Runs the command to completion, blocking the caller.
    fn run(&self, command: &str, suppress_stdout: bool, suppress_stderr: bool)
        -> Result<RunOutput>;

    /// Whether the binary can be executed, either as a path or through `PATH`.
    fn application_exists(&self, binary: &str) -> bool {
        find_executable(binary).is_some()
    }
}

/// Runs commands through `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(
        &self,
        command: &str,
        suppress_stdout: bool,
        suppress_stderr: bool,
    ) -> Result<RunOutput> {
        debug!("Spawning: sh -c {command}");
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(if suppress_stdout {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .stderr(if suppress_stderr {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .output()?;
        let run_output = RunOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("Process exited with {:?}", run_output.exit_code);
        Ok(run_output)
    }
}

/// Resolves a binary name the way the shell would: names containing a path separator are
/// taken as paths, anything else is looked up in `PATH`.
pub fn find_executable(binary: &str) -> Option<PathBuf> {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(binary);
        return is_executable(&path).then_some(path);
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
