use std::path::PathBuf;

use thiserror::Error;

use crate::platform::PlatformId;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("platform not supported: {os} on {arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("no {tool} release is published for {platform}")]
    UnsupportedPlatformForTool {
        tool: &'static str,
        platform: PlatformId,
    },

    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("could not extract {}: {reason}", archive.display())]
    ArchiveExtraction { archive: PathBuf, reason: String },

    #[error("`{binary}` was not found anywhere inside the {tool} archive")]
    BinaryNotFoundInArchive { tool: &'static str, binary: String },

    #[error("`{command}` failed: {detail}")]
    DependentInstall { command: String, detail: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
