pub mod root;
pub mod schema;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use root::InstallRoot;
pub use schema::{FileConfig, Overrides, VersionRequest};

use crate::error::InstallError;

pub const DEFAULT_PYTHON_VERSION: &str = "3.12";
pub const DEFAULT_NODE_MAJOR: u64 = 22;

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: InstallRoot,
    pub uv_version: VersionRequest,
    pub python_version: String,
    pub fnm_version: VersionRequest,
    pub node_major: u64,
}

impl Settings {
    /// Merge overrides over the config file over built-in defaults.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let file = match &overrides.config {
            Some(path) => load(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => load(&path)?,
                _ => FileConfig::default(),
            },
        };
        let cwd = std::env::current_dir().context("failed to read the current directory")?;
        Ok(Self::merge(overrides, file, default_root, &cwd)?)
    }

    /// The home-based default root is looked up only when neither the
    /// overrides nor the file name a root. Relative roots are anchored at
    /// `cwd` so the activation scripts work from any directory.
    fn merge(
        overrides: Overrides,
        file: FileConfig,
        default_root: impl FnOnce() -> Option<PathBuf>,
        cwd: &Path,
    ) -> Result<Self, InstallError> {
        let root = match overrides.root.or(file.root) {
            Some(root) => root,
            None => default_root().ok_or_else(|| {
                InstallError::Config(
                    "could not determine the home directory; set $HOME or pass --root".into(),
                )
            })?,
        };
        if root.as_os_str().is_empty() {
            return Err(InstallError::Config("install root must not be empty".into()));
        }
        let root = if root.is_absolute() {
            root
        } else {
            cwd.join(root)
        };

        let uv_version = version_request(
            "uv version",
            overrides.uv_version.or(file.uv_version),
        )?;
        let fnm_version = version_request(
            "fnm version",
            overrides.fnm_version.or(file.fnm_version),
        )?;

        let python_version = overrides
            .python_version
            .or(file.python_version)
            .unwrap_or_else(|| DEFAULT_PYTHON_VERSION.to_string());
        let python_version = python_version.trim().to_string();
        if python_version.is_empty() {
            return Err(InstallError::Config("python version must not be empty".into()));
        }

        let node_major = overrides
            .node_version
            .or(file.node_version)
            .unwrap_or(DEFAULT_NODE_MAJOR);

        Ok(Self {
            root: InstallRoot::new(root),
            uv_version,
            python_version,
            fnm_version,
            node_major,
        })
    }
}

fn version_request(what: &str, raw: Option<String>) -> Result<VersionRequest, InstallError> {
    match raw {
        None => Ok(VersionRequest::Latest),
        Some(raw) => VersionRequest::parse(&raw)
            .ok_or_else(|| InstallError::Config(format!("{what} must not be empty"))),
    }
}

/// Load and parse a config file.
pub fn load(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// `~/.config/agent-env/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("agent-env").join("config.toml"))
}

/// `~/.agent-env`.
pub fn default_root() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".agent-env"))
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------
