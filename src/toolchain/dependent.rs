//! Runtimes installed through a resolved tool.
//!
//! Every operation queries first and installs only when the query comes
//! back empty, so a re-run does no work.

use tracing::debug;

use crate::config::InstallRoot;
use crate::error::InstallError;
use crate::platform::PlatformId;
use crate::version::SemVer;

use super::{CommandOutput, CommandRunner, ResolvedTool, ToolCommand};

/// What happened to a runtime during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionAction {
    /// Already present; nothing was run.
    AlreadyCorrect,
    /// Newly installed.
    Installed,
}

/// Run a delegated command and turn a non-zero exit into a fatal error.
fn run_checked(
    runner: &dyn CommandRunner,
    command: &ToolCommand,
) -> Result<CommandOutput, InstallError> {
    let output = runner.run(command)?;
    if output.success() {
        Ok(output)
    } else {
        Err(dependent_failure(command, &output))
    }
}

fn dependent_failure(command: &ToolCommand, output: &CommandOutput) -> InstallError {
    let detail = output
        .stderr
        .lines()
        .chain(output.stdout.lines())
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match output.exit_code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by a signal".to_string(),
        });
    InstallError::DependentInstall {
        command: command.display(),
        detail,
    }
}

// -------------------------------------------------------------------
// uv: Python interpreter and the isolated environment
// -------------------------------------------------------------------

/// Installs Python and the venv through a resolved `uv`.
pub struct UvManager<'a> {
    uv: &'a ResolvedTool,
    root: &'a InstallRoot,
    platform: PlatformId,
    runner: &'a dyn CommandRunner,
}

impl<'a> UvManager<'a> {
    pub fn new(
        uv: &'a ResolvedTool,
        root: &'a InstallRoot,
        platform: PlatformId,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            uv,
            root,
            platform,
            runner,
        }
    }

    /// `uv <args>` with interpreters kept under the install root.
    fn command<'s>(&self, args: impl IntoIterator<Item = &'s str>) -> ToolCommand {
        ToolCommand::new(&self.uv.path)
            .args(args)
            .env("UV_PYTHON_INSTALL_DIR", self.root.python_dir())
    }

    /// Path of an interpreter matching `version`, if uv can find one.
    pub fn find_python(&self, version: &str) -> Result<Option<String>, InstallError> {
        let found = self.runner.run(&self.command(["python", "find", version]))?;
        if !found.success() {
            return Ok(None);
        }
        Ok(Some(found.first_line().unwrap_or_default().to_string()))
    }

    /// Make sure `version` is available to uv, installing it if needed.
    pub fn ensure_python(&self, version: &str) -> Result<ProvisionAction, InstallError> {
        if let Some(path) = self.find_python(version)? {
            debug!(version, %path, "python already available");
            return Ok(ProvisionAction::AlreadyCorrect);
        }

        self.root.ensure_dir(&self.root.python_dir())?;
        let install = self.command(["python", "install", version]);
        let output = self.runner.run(&install)?;
        if output.success() {
            return Ok(ProvisionAction::Installed);
        }
        if reports_already_installed(&output) {
            return Ok(ProvisionAction::AlreadyCorrect);
        }
        Err(dependent_failure(&install, &output))
    }

    /// Create the isolated environment unless its interpreter already exists.
    ///
    /// An existing environment is never inspected further.
    pub fn ensure_venv(&self, python_version: &str) -> Result<ProvisionAction, InstallError> {
        if self.root.venv_python(self.platform).exists() {
            return Ok(ProvisionAction::AlreadyCorrect);
        }

        let venv_dir = self.root.venv_dir();
        let venv_arg = venv_dir.to_string_lossy();
        let create = self.command([
            "venv",
            "--seed",
            "--python",
            python_version,
            venv_arg.as_ref(),
        ]);
        run_checked(self.runner, &create)?;
        Ok(ProvisionAction::Installed)
    }
}

fn reports_already_installed(output: &CommandOutput) -> bool {
    let text = format!("{}\n{}", output.stdout, output.stderr).to_lowercase();
    text.contains("already installed")
}

// -------------------------------------------------------------------
// fnm: Node.js
// -------------------------------------------------------------------

/// Outcome of provisioning Node through fnm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeProvision {
    pub action: ProvisionAction,
    /// Set when the post-install check could not confirm the runtime.
    pub verification_warning: Option<String>,
}

/// Installs a Node major version through a resolved `fnm`.
pub struct FnmManager<'a> {
    fnm: &'a ResolvedTool,
    root: &'a InstallRoot,
    runner: &'a dyn CommandRunner,
}

impl<'a> FnmManager<'a> {
    pub fn new(
        fnm: &'a ResolvedTool,
        root: &'a InstallRoot,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self { fnm, root, runner }
    }

    /// `fnm <args>` with state kept under the install root.
    fn command<'s>(&self, args: impl IntoIterator<Item = &'s str>) -> ToolCommand {
        ToolCommand::new(&self.fnm.path)
            .args(args)
            .env("FNM_DIR", self.root.fnm_dir())
    }

    /// Whether fnm already has a release of `major` installed.
    pub fn has_major(&self, major: u64) -> Result<bool, InstallError> {
        let output = run_checked(self.runner, &self.command(["list"]))?;
        Ok(output
            .stdout
            .lines()
            .filter_map(SemVer::parse)
            .any(|v| v.major == major))
    }

    /// Install `major`, pin it as the default, then confirm `node` runs.
    ///
    /// The default is pinned even when `major` is already installed, so a
    /// run interrupted between install and pin is repaired on the next one.
    pub fn ensure_node(&self, major: u64) -> Result<NodeProvision, InstallError> {
        self.root.ensure_dir(&self.root.fnm_dir())?;
        let major_arg = major.to_string();
        let pin_default = self.command(["default", major_arg.as_str()]);

        if self.has_major(major)? {
            run_checked(self.runner, &pin_default)?;
            return Ok(NodeProvision {
                action: ProvisionAction::AlreadyCorrect,
                verification_warning: None,
            });
        }

        run_checked(self.runner, &self.command(["install", major_arg.as_str()]))?;
        run_checked(self.runner, &pin_default)?;

        Ok(NodeProvision {
            action: ProvisionAction::Installed,
            verification_warning: self.verify(major).err(),
        })
    }

    /// Run `node --version` inside fnm's environment for `major`.
    fn verify(&self, major: u64) -> Result<SemVer, String> {
        let using = format!("--using={major}");
        let command = self.command(["exec", using.as_str(), "node", "--version"]);
        let output = self
            .runner
            .run(&command)
            .map_err(|e| format!("could not run `{}`: {e}", command.display()))?;
        if !output.success() {
            return Err(format!("`{}` exited unsuccessfully", command.display()));
        }
        match output.first_line().and_then(SemVer::parse) {
            Some(v) if v.major == major => Ok(v),
            Some(v) => Err(format!("node reports {v}, expected {major}.x")),
            None => Err(format!(
                "unrecognized output from `{}`",
                command.display()
            )),
        }
    }
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------
