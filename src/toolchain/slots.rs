//! Descriptors for the two downloadable tools.
//!
//! The platform tables are exhaustive `match`es, so a new OS or
//! architecture fails to compile here instead of guessing an asset name.

use crate::config::VersionRequest;
use crate::platform::{Arch, Os, PlatformId};
use crate::version::SemVer;

use super::{ArchiveFormat, Artifact, ToolSlot};

/// Oldest uv whose `python` and `venv --seed` subcommands we rely on.
pub const UV_MINIMUM: SemVer = SemVer::new(0, 6, 0);

pub const UV: ToolSlot = ToolSlot {
    name: "uv",
    binary: "uv",
    companions: &["uvx"],
    minimum_version: Some(UV_MINIMUM),
    version_args: &["--version"],
    parse_version: SemVer::parse,
    artifact: uv_artifact,
    release_url: uv_release_url,
};

pub const FNM: ToolSlot = ToolSlot {
    name: "fnm",
    binary: "fnm",
    companions: &[],
    minimum_version: None,
    version_args: &["--version"],
    parse_version: SemVer::parse,
    artifact: fnm_artifact,
    release_url: fnm_release_url,
};

// -------------------------------------------------------------------
// uv
// -------------------------------------------------------------------

/// Rust target triple uv publishes for a platform.
pub fn uv_target_triple(platform: PlatformId) -> &'static str {
    match (platform.os, platform.arch) {
        (Os::Linux, Arch::X86_64) => "x86_64-unknown-linux-gnu",
        (Os::Linux, Arch::Aarch64) => "aarch64-unknown-linux-gnu",
        (Os::MacOs, Arch::X86_64) => "x86_64-apple-darwin",
        (Os::MacOs, Arch::Aarch64) => "aarch64-apple-darwin",
        (Os::Windows, Arch::X86_64) => "x86_64-pc-windows-msvc",
        (Os::Windows, Arch::Aarch64) => "aarch64-pc-windows-msvc",
    }
}

fn uv_artifact(platform: PlatformId) -> Option<Artifact> {
    let format = if platform.is_windows() {
        ArchiveFormat::Zip
    } else {
        ArchiveFormat::TarGz
    };
    Some(Artifact {
        file_name: format!(
            "uv-{}.{}",
            uv_target_triple(platform),
            format.extension()
        ),
        format,
    })
}

/// uv tags releases without a `v` prefix.
fn uv_release_url(version: &VersionRequest, artifact: &Artifact) -> String {
    match version {
        VersionRequest::Latest => format!(
            "https://github.com/astral-sh/uv/releases/latest/download/{}",
            artifact.file_name
        ),
        VersionRequest::Exact(v) => format!(
            "https://github.com/astral-sh/uv/releases/download/{}/{}",
            v.trim_start_matches('v'),
            artifact.file_name
        ),
    }
}

// -------------------------------------------------------------------
// fnm
// -------------------------------------------------------------------

fn fnm_asset(platform: PlatformId) -> Option<&'static str> {
    match (platform.os, platform.arch) {
        (Os::Linux, Arch::X86_64) => Some("fnm-linux.zip"),
        (Os::Linux, Arch::Aarch64) => Some("fnm-arm64.zip"),
        // The macOS build is universal.
        (Os::MacOs, Arch::X86_64) | (Os::MacOs, Arch::Aarch64) => Some("fnm-macos.zip"),
        (Os::Windows, Arch::X86_64) => Some("fnm-windows.zip"),
        (Os::Windows, Arch::Aarch64) => None,
    }
}

fn fnm_artifact(platform: PlatformId) -> Option<Artifact> {
    fnm_asset(platform).map(|name| Artifact {
        file_name: name.to_string(),
        format: ArchiveFormat::Zip,
    })
}

/// fnm tags releases as `v1.38.1`.
fn fnm_release_url(version: &VersionRequest, artifact: &Artifact) -> String {
    match version {
        VersionRequest::Latest => format!(
            "https://github.com/Schniz/fnm/releases/latest/download/{}",
            artifact.file_name
        ),
        VersionRequest::Exact(v) => format!(
            "https://github.com/Schniz/fnm/releases/download/v{}/{}",
            v.trim_start_matches('v'),
            artifact.file_name
        ),
    }
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(os: &str, arch: &str) -> PlatformId {
        PlatformId::from_parts(os, arch).unwrap()
    }

    #[test]
    fn uv_unix_uses_tarball() {
        let artifact = (UV.artifact)(platform("linux", "aarch64")).unwrap();
        assert_eq!(artifact.file_name, "uv-aarch64-unknown-linux-gnu.tar.gz");
        assert_eq!(artifact.format, ArchiveFormat::TarGz);
    }

    #[test]
    fn uv_windows_uses_zip() {
        let artifact = (UV.artifact)(platform("windows", "x86_64")).unwrap();
        assert_eq!(artifact.file_name, "uv-x86_64-pc-windows-msvc.zip");
        assert_eq!(artifact.format, ArchiveFormat::Zip);
    }

    #[test]
    fn uv_latest_url() {
        let artifact = (UV.artifact)(platform("macos", "aarch64")).unwrap();
        assert_eq!(
            (UV.release_url)(&VersionRequest::Latest, &artifact),
            "https://github.com/astral-sh/uv/releases/latest/download/uv-aarch64-apple-darwin.tar.gz"
        );
    }

    #[test]
    fn uv_pinned_url_strips_v() {
        let artifact = (UV.artifact)(platform("linux", "x86_64")).unwrap();
        assert_eq!(
            (UV.release_url)(&VersionRequest::Exact("v0.7.1".into()), &artifact),
            "https://github.com/astral-sh/uv/releases/download/0.7.1/uv-x86_64-unknown-linux-gnu.tar.gz"
        );
    }

    #[test]
    fn fnm_assets() {
        let name = |os, arch| (FNM.artifact)(platform(os, arch)).map(|a| a.file_name);
        assert_eq!(name("linux", "x86_64").as_deref(), Some("fnm-linux.zip"));
        assert_eq!(name("linux", "aarch64").as_deref(), Some("fnm-arm64.zip"));
        assert_eq!(name("macos", "x86_64").as_deref(), Some("fnm-macos.zip"));
        assert_eq!(name("macos", "aarch64").as_deref(), Some("fnm-macos.zip"));
        assert_eq!(name("windows", "x86_64").as_deref(), Some("fnm-windows.zip"));
    }

    #[test]
    fn fnm_windows_arm_is_unmapped() {
        assert!((FNM.artifact)(platform("windows", "aarch64")).is_none());
    }

    #[test]
    fn fnm_pinned_url_adds_v() {
        let artifact = (FNM.artifact)(platform("linux", "x86_64")).unwrap();
        assert_eq!(
            (FNM.release_url)(&VersionRequest::Exact("1.38.1".into()), &artifact),
            "https://github.com/Schniz/fnm/releases/download/v1.38.1/fnm-linux.zip"
        );
        assert_eq!(
            (FNM.release_url)(&VersionRequest::Exact("v1.38.1".into()), &artifact),
            "https://github.com/Schniz/fnm/releases/download/v1.38.1/fnm-linux.zip"
        );
    }

    #[test]
    fn only_uv_has_a_floor() {
        assert_eq!(UV.minimum_version, Some(SemVer::new(0, 6, 0)));
        assert!(FNM.minimum_version.is_none());
    }
}
