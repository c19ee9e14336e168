//! Hook that sources the activation script from the user's shell profile.
//!
//! The hook is exactly two lines: [`MARKER`] and the line that sources the
//! script. Adding is skipped when the marker is already present anywhere in
//! the file; removing deletes the marker line and the single line after it
//! and leaves every other byte untouched.

use std::path::{Path, PathBuf};

use crate::config::InstallRoot;
use crate::error::InstallError;
use crate::platform::{Os, PlatformId};

use super::env_file;

pub const MARKER: &str = "# >>> agent-env >>>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFamily {
    Posix,
    PowerShell,
}

/// Result of editing one profile file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEdit {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
}

/// The user-level inputs that decide which profile file to edit.
#[derive(Debug, Clone)]
pub struct ProfileContext {
    pub home: PathBuf,
    pub documents: Option<PathBuf>,
    /// Value of `$SHELL`, if set.
    pub shell: Option<String>,
}

impl ProfileContext {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            home: dirs::home_dir()?,
            documents: dirs::document_dir(),
            shell: std::env::var("SHELL").ok(),
        })
    }

    fn powershell_profile(&self) -> PathBuf {
        self.documents
            .clone()
            .unwrap_or_else(|| self.home.join("Documents"))
            .join("PowerShell")
            .join("Microsoft.PowerShell_profile.ps1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellProfile {
    pub path: PathBuf,
    pub family: ShellFamily,
}

impl ShellProfile {
    fn posix(path: PathBuf) -> Self {
        Self {
            path,
            family: ShellFamily::Posix,
        }
    }

    /// The one profile file the hook is added to.
    pub fn detect(ctx: &ProfileContext, platform: PlatformId) -> Self {
        if platform.os == Os::Windows {
            return Self {
                path: ctx.powershell_profile(),
                family: ShellFamily::PowerShell,
            };
        }

        let shell_name = ctx
            .shell
            .as_deref()
            .and_then(|s| Path::new(s).file_name())
            .and_then(|n| n.to_str());

        match shell_name {
            Some("zsh") => Self::posix(ctx.home.join(".zshrc")),
            // Terminal.app opens login shells, which read .bash_profile
            Some("bash") if platform.os == Os::MacOs => Self::posix(ctx.home.join(".bash_profile")),
            Some("bash") => Self::posix(ctx.home.join(".bashrc")),
            _ => Self::posix(ctx.home.join(".profile")),
        }
    }

    /// Every profile file a previous install might have edited.
    pub fn candidates(ctx: &ProfileContext, platform: PlatformId) -> Vec<Self> {
        if platform.os == Os::Windows {
            return vec![Self::detect(ctx, platform)];
        }
        [".zshrc", ".bashrc", ".bash_profile", ".profile"]
            .iter()
            .map(|name| Self::posix(ctx.home.join(name)))
            .collect()
    }

    pub fn activation_line(&self, root: &InstallRoot) -> String {
        match self.family {
            ShellFamily::Posix => format!(
                ". \"{}\"",
                env_file::posix_quote(&root.env_file())
            ),
            ShellFamily::PowerShell => format!(
                ". '{}'",
                env_file::powershell_quote(&root.env_ps1_file())
            ),
        }
    }

    /// Append the hook unless the marker is already present.
    pub fn install(&self, root: &InstallRoot) -> Result<ProfileEdit, InstallError> {
        let contents = read_or_empty(&self.path)?;
        let Some(updated) = add_block(&contents, &self.activation_line(root)) else {
            return Ok(ProfileEdit::AlreadyPresent);
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                InstallError::io(format!("failed to create {}", parent.display()), e)
            })?;
        }
        std::fs::write(&self.path, updated)
            .map_err(|e| InstallError::io(format!("failed to update {}", self.path.display()), e))?;
        Ok(ProfileEdit::Added)
    }

    pub fn is_hooked(&self) -> bool {
        std::fs::read_to_string(&self.path)
            .map(|contents| contents.contains(MARKER))
            .unwrap_or(false)
    }

    /// Remove the hook. A missing file or missing marker is a no-op.
    pub fn remove(&self) -> Result<ProfileEdit, InstallError> {
        if !self.path.is_file() {
            return Ok(ProfileEdit::NotPresent);
        }
        let contents = read_or_empty(&self.path)?;
        let Some(updated) = remove_block(&contents) else {
            return Ok(ProfileEdit::NotPresent);
        };
        std::fs::write(&self.path, updated)
            .map_err(|e| InstallError::io(format!("failed to update {}", self.path.display()), e))?;
        Ok(ProfileEdit::Removed)
    }
}

fn read_or_empty(path: &Path) -> Result<String, InstallError> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(InstallError::io(format!("failed to read {}", path.display()), e)),
    }
}

/// Contents with the hook appended, or `None` if the marker is present.
pub fn add_block(contents: &str, activation_line: &str) -> Option<String> {
    if contents.contains(MARKER) {
        return None;
    }
    let mut updated = contents.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(MARKER);
    updated.push('\n');
    updated.push_str(activation_line);
    updated.push('\n');
    Some(updated)
}

/// Contents with each marker line and the line after it removed, or `None`
/// if there is no marker.
pub fn remove_block(contents: &str) -> Option<String> {
    if !contents.contains(MARKER) {
        return None;
    }
    let mut updated = String::with_capacity(contents.len());
    let mut lines = contents.split_inclusive('\n');
    while let Some(line) = lines.next() {
        if line.contains(MARKER) {
            lines.next();
            continue;
        }
        updated.push_str(line);
    }
    Some(updated)
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------
