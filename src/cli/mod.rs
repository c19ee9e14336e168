pub mod install;
pub mod output;
pub mod status;
pub mod uninstall;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::config::Overrides;

/// Bootstrap an isolated agent toolchain (uv, Python, fnm, Node)
#[derive(Parser)]
#[command(name = "agent-env", version, about, long_about = None)]
pub struct Cli {
    /// Logging verbosity for diagnostics on stderr: off, error, warn, info, debug.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install uv, Python, a virtual environment, fnm and Node into the root
    Install(install::Args),

    /// Show what is installed without changing anything
    Status(status::Args),

    /// Remove everything agent-env installed
    Uninstall(uninstall::Args),
}

/// Where the install root lives and which config file to read.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RootArgs {
    /// Config file to read (must exist when given)
    #[arg(long, env = "AGENT_ENV_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Install root [default: ~/.agent-env]
    #[arg(long, env = "AGENT_ENV_HOME", value_name = "DIR")]
    pub root: Option<PathBuf>,
}

/// Versions to install.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct VersionArgs {
    /// uv release to download when none is usable ("latest" or e.g. 0.6.3)
    #[arg(long, env = "AGENT_ENV_UV_VERSION")]
    pub uv_version: Option<String>,

    /// Python version to install through uv [default: 3.12]
    #[arg(long, env = "AGENT_ENV_PYTHON_VERSION")]
    pub python_version: Option<String>,

    /// fnm release to download when none is usable ("latest" or e.g. 1.38.1)
    #[arg(long, env = "AGENT_ENV_FNM_VERSION")]
    pub fnm_version: Option<String>,

    /// Node major version to install through fnm [default: 22]
    #[arg(long, env = "AGENT_ENV_NODE_VERSION")]
    pub node_version: Option<u64>,
}

impl RootArgs {
    pub fn overrides(&self, versions: Option<&VersionArgs>) -> Overrides {
        let versions = versions.cloned().unwrap_or_default();
        Overrides {
            config: self.config.clone(),
            root: self.root.clone(),
            uv_version: versions.uv_version,
            python_version: versions.python_version,
            fnm_version: versions.fnm_version,
            node_version: versions.node_version,
        }
    }
}

/// Map a `--log-level` value to a tracing filter, falling back to `warn`.
pub fn log_filter(level: &str) -> &'static str {
    match level {
        "off" => "off",
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        other => {
            eprintln!("warning: unknown log level '{other}', defaulting to 'warn'");
            "warn"
        }
    }
}
