//! Layout of the install root.
//!
//! ```text
//! <root>/
//!   bin/        downloaded uv, uvx and fnm binaries
//!   python/     interpreters installed by uv
//!   venv/       isolated environment seeded by uv
//!   fnm/        fnm state (Node installs, aliases)
//!   env         POSIX activation script
//!   env.ps1     PowerShell activation script
//!   .agent-env-root  ownership marker; uninstall touches nothing without it
//! ```

use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::platform::PlatformId;

/// Top-level entries the installer creates and is allowed to remove.
pub const MANAGED_ENTRIES: &[&str] = &[
    OWNER_MARKER,
    "bin",
    "python",
    "venv",
    "fnm",
    "env",
    "env.ps1",
];

/// File written into a root that agent-env created or already owns.
pub const OWNER_MARKER: &str = ".agent-env-root";

/// Prefix of the scratch directories used while downloading.
pub const SCRATCH_PREFIX: &str = ".download-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoot {
    path: PathBuf,
}

impl InstallRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path.join("bin")
    }

    pub fn python_dir(&self) -> PathBuf {
        self.path.join("python")
    }

    pub fn venv_dir(&self) -> PathBuf {
        self.path.join("venv")
    }

    pub fn fnm_dir(&self) -> PathBuf {
        self.path.join("fnm")
    }

    pub fn env_file(&self) -> PathBuf {
        self.path.join("env")
    }

    pub fn env_ps1_file(&self) -> PathBuf {
        self.path.join("env.ps1")
    }

    /// `<root>/bin/<binary>` with the platform's executable suffix.
    pub fn local_binary(&self, binary: &str, platform: PlatformId) -> PathBuf {
        self.bin_dir().join(platform.exe_name(binary))
    }

    /// Directory holding the venv's executables.
    pub fn venv_bin_dir(&self, platform: PlatformId) -> PathBuf {
        if platform.is_windows() {
            self.venv_dir().join("Scripts")
        } else {
            self.venv_dir().join("bin")
        }
    }

    /// The interpreter entry point whose presence marks the venv as created.
    pub fn venv_python(&self, platform: PlatformId) -> PathBuf {
        self.venv_bin_dir(platform).join(platform.exe_name("python"))
    }

    pub fn owner_marker(&self) -> PathBuf {
        self.path.join(OWNER_MARKER)
    }

    /// Whether the root carries the ownership marker.
    pub fn is_owned(&self) -> bool {
        self.owner_marker().is_file()
    }

    /// Take ownership of the root before anything is written into it.
    ///
    /// A missing or empty directory is created and marked. An existing
    /// directory with other contents and no marker is refused, so a later
    /// uninstall can never delete files agent-env did not create.
    pub fn claim(&self) -> Result<(), InstallError> {
        if self.is_owned() {
            return Ok(());
        }
        let occupied = match std::fs::read_dir(&self.path) {
            Ok(mut entries) => entries.next().is_some(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(InstallError::io(
                    format!("failed to read {}", self.path.display()),
                    e,
                ))
            }
        };
        if occupied {
            return Err(InstallError::Config(format!(
                "install root {} already has files in it and was not created by agent-env; \
                 choose an empty or new directory",
                self.path.display()
            )));
        }
        self.ensure_dir(&self.path)?;
        let marker = self.owner_marker();
        std::fs::write(&marker, "This directory is managed by agent-env.\n")
            .map_err(|e| InstallError::io(format!("failed to write {}", marker.display()), e))
    }

    /// Create `dir` (and the root) right before it is first needed.
    pub fn ensure_dir(&self, dir: &Path) -> Result<(), InstallError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| InstallError::io(format!("failed to create {}", dir.display()), e))
    }
}
