//! Acquisition of the managed tools.
//!
//! `resolver` decides where each tool comes from; `slots` describes the
//! tools; `fetch`, `archive` and `runner` are the capabilities the resolver
//! and the dependent installers drive.

pub mod archive;
pub mod dependent;
pub mod fetch;
pub mod resolver;
pub mod runner;
pub mod slots;

use std::path::PathBuf;

use serde::Serialize;

use crate::config::VersionRequest;
use crate::platform::PlatformId;
use crate::version::SemVer;

pub use archive::{ArchiveUnpacker, Unpack};
pub use dependent::{FnmManager, NodeProvision, ProvisionAction, UvManager};
pub use fetch::{Fetch, HttpFetcher};
pub use resolver::Resolver;
pub use runner::{CommandOutput, CommandRunner, SystemRunner, ToolCommand};

/// Archive container a release is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }
}

/// A release asset for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub format: ArchiveFormat,
}

/// Static description of a tool the resolver can acquire.
#[derive(Debug, Clone, Copy)]
pub struct ToolSlot {
    pub name: &'static str,
    /// Executable name without the platform suffix.
    pub binary: &'static str,
    /// Extra executables shipped in the same archive, copied when present.
    pub companions: &'static [&'static str],
    pub minimum_version: Option<SemVer>,
    pub version_args: &'static [&'static str],
    pub parse_version: fn(&str) -> Option<SemVer>,
    /// `None` when no release exists for the platform.
    pub artifact: fn(PlatformId) -> Option<Artifact>,
    pub release_url: fn(&VersionRequest, &Artifact) -> String,
}

/// Where a resolved tool came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    System,
    Local,
    Downloaded,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::System => write!(f, "system"),
            Origin::Local => write!(f, "local"),
            Origin::Downloaded => write!(f, "downloaded"),
        }
    }
}

/// The binary chosen for a slot in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTool {
    pub name: &'static str,
    pub path: PathBuf,
    pub origin: Origin,
}
