use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Contents of the optional `config.toml`. Every key may be omitted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub root: Option<PathBuf>,
    pub uv_version: Option<String>,
    pub python_version: Option<String>,
    pub fnm_version: Option<String>,
    pub node_version: Option<u64>,
}

/// Values supplied on the command line or through `AGENT_ENV_*` variables.
///
/// These win over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub uv_version: Option<String>,
    pub python_version: Option<String>,
    pub fnm_version: Option<String>,
    pub node_version: Option<u64>,
}

/// Requested release of a downloadable tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequest {
    Latest,
    Exact(String),
}

impl VersionRequest {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else if raw.eq_ignore_ascii_case("latest") {
            Some(Self::Latest)
        } else {
            Some(Self::Exact(raw.to_string()))
        }
    }
}

impl std::fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Exact(v) => write!(f, "{v}"),
        }
    }
}
