use serde::Serialize;

use crate::error::InstallError;

/// Operating system family a release artifact is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

/// CPU architecture a release artifact is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86_64,
    Aarch64,
}

/// Normalized platform identifier used to pick download artifacts.
///
/// Computed once at startup and passed by value afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PlatformId {
    pub os: Os,
    pub arch: Arch,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl PlatformId {
    /// Detect the platform this binary is running on.
    pub fn detect() -> Result<Self, InstallError> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map raw OS and architecture names onto a supported platform.
    pub fn from_parts(os: &str, arch: &str) -> Result<Self, InstallError> {
        let unsupported = || InstallError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        let os_family = match os {
            "linux" => Os::Linux,
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            _ => return Err(unsupported()),
        };

        let arch_family = match arch {
            "x86_64" => Arch::X86_64,
            "aarch64" | "arm64" => Arch::Aarch64,
            _ => return Err(unsupported()),
        };

        Ok(Self {
            os: os_family,
            arch: arch_family,
        })
    }

    pub fn is_windows(self) -> bool {
        self.os == Os::Windows
    }

    /// File name of an executable on this platform (`uv` or `uv.exe`).
    pub fn exe_name(self, name: &str) -> String {
        if self.is_windows() {
            format!("{name}.exe")
        } else {
            name.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_current_host() {
        // CI runs on one of the supported hosts
        let platform = PlatformId::detect().expect("supported host");
        assert_eq!(platform, PlatformId::detect().unwrap());
    }

    #[test]
    fn from_parts_recognizes_all_families() {
        let cases = [
            ("linux", "x86_64", Os::Linux, Arch::X86_64),
            ("linux", "aarch64", Os::Linux, Arch::Aarch64),
            ("macos", "x86_64", Os::MacOs, Arch::X86_64),
            ("macos", "aarch64", Os::MacOs, Arch::Aarch64),
            ("windows", "x86_64", Os::Windows, Arch::X86_64),
            ("windows", "aarch64", Os::Windows, Arch::Aarch64),
        ];
        for (os, arch, want_os, want_arch) in cases {
            let p = PlatformId::from_parts(os, arch).unwrap();
            assert_eq!(p.os, want_os);
            assert_eq!(p.arch, want_arch);
        }
    }

    #[test]
    fn arm64_alias() {
        let p = PlatformId::from_parts("macos", "arm64").unwrap();
        assert_eq!(p.arch, Arch::Aarch64);
    }

    #[test]
    fn unsupported_os_is_rejected() {
        let err = PlatformId::from_parts("freebsd", "x86_64").unwrap_err();
        assert!(matches!(err, InstallError::UnsupportedPlatform { ref os, .. } if os == "freebsd"));
    }

    #[test]
    fn unsupported_arch_is_rejected() {
        let err = PlatformId::from_parts("linux", "riscv64").unwrap_err();
        assert!(matches!(err, InstallError::UnsupportedPlatform { ref arch, .. } if arch == "riscv64"));
    }

    #[test]
    fn exe_name_suffix() {
        let win = PlatformId::from_parts("windows", "x86_64").unwrap();
        let linux = PlatformId::from_parts("linux", "x86_64").unwrap();
        assert_eq!(win.exe_name("uv"), "uv.exe");
        assert_eq!(linux.exe_name("uv"), "uv");
    }

    #[test]
    fn display_format() {
        let p = PlatformId::from_parts("macos", "aarch64").unwrap();
        assert_eq!(p.to_string(), "macos-aarch64");
    }

    #[test]
    fn serializes_lowercase() {
        let p = PlatformId::from_parts("macos", "x86_64").unwrap();
        let json = serde_json::to_string(&p).expect("serialize");
        assert_eq!(json, r#"{"os":"macos","arch":"x86_64"}"#);
    }
}
