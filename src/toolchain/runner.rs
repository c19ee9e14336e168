//! Process boundary for invoking resolved tools.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::InstallError;

/// A single invocation of an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub envs: Vec<(String, OsString)>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Human-readable form used in log lines and errors: `uv python find 3.12`.
    pub fn display(&self) -> String {
        let program = self
            .program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string());
        if self.args.is_empty() {
            program
        } else {
            format!("{} {}", program, self.args.join(" "))
        }
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// First non-empty line of stdout, falling back to stderr.
    pub fn first_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
    }
}

/// Runs tools and captures their output. Substituted with fakes in tests.
pub trait CommandRunner {
    /// Fails only when the process cannot be spawned; a non-zero exit is a
    /// normal `CommandOutput`.
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput, InstallError>;
}

/// Spawns real processes.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput, InstallError> {
        debug!(command = %command.display(), "running");
        let output = Command::new(&command.program)
            .args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| InstallError::io(format!("failed to run {}", command.display()), e))?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %command.display(), exit_code = ?result.exit_code, "finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_file_name() {
        let cmd = ToolCommand::new("/opt/agent/bin/uv").args(["python", "find", "3.12"]);
        assert_eq!(cmd.display(), "uv python find 3.12");
        assert_eq!(ToolCommand::new("/usr/bin/fnm").display(), "fnm");
    }

    #[test]
    fn first_line_skips_blank_lines() {
        let out = CommandOutput {
            exit_code: Some(0),
            stdout: "\n  \nuv 0.7.1\nmore".into(),
            stderr: String::new(),
        };
        assert_eq!(out.first_line(), Some("uv 0.7.1"));
    }

    #[test]
    fn first_line_falls_back_to_stderr() {
        let out = CommandOutput {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: "fnm 1.38.1\n".into(),
        };
        assert_eq!(out.first_line(), Some("fnm 1.38.1"));
    }

    #[test]
    fn signal_exit_is_not_success() {
        let out = CommandOutput {
            exit_code: None,
            ..CommandOutput::default()
        };
        assert!(!out.success());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_output() {
        let cmd = ToolCommand::new("sh")
            .args(["-c", "echo \"$GREETING\"; echo oops >&2; exit 3"])
            .env("GREETING", "hello");
        let out = SystemRunner.run(&cmd).unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn system_runner_reports_spawn_failure() {
        let cmd = ToolCommand::new("/nonexistent/agent-env-test-binary");
        assert!(matches!(
            SystemRunner.run(&cmd),
            Err(InstallError::Io { .. })
        ));
    }
}
