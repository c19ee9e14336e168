//! The system → local → download resolution chain.
//!
//! Each stage short-circuits on the first acceptable candidate. A candidate
//! for a slot with a version floor is accepted only if `<binary> --version`
//! runs, exits zero, and parses to a version at or above the floor; any
//! other outcome rejects it and resolution moves on. Slots without a floor
//! accept any candidate that exists.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cli::output;
use crate::config::root::SCRATCH_PREFIX;
use crate::config::{InstallRoot, VersionRequest};
use crate::error::InstallError;
use crate::platform::PlatformId;

use super::archive::{find_binary, make_executable};
use super::{CommandRunner, Fetch, Origin, ResolvedTool, ToolCommand, ToolSlot, Unpack};

pub struct Resolver<'a> {
    platform: PlatformId,
    root: &'a InstallRoot,
    search_path: Option<OsString>,
    runner: &'a dyn CommandRunner,
    fetcher: &'a dyn Fetch,
    unpacker: &'a dyn Unpack,
}

impl<'a> Resolver<'a> {
    /// A resolver that searches the process `PATH` for system tools.
    pub fn new(
        platform: PlatformId,
        root: &'a InstallRoot,
        runner: &'a dyn CommandRunner,
        fetcher: &'a dyn Fetch,
        unpacker: &'a dyn Unpack,
    ) -> Self {
        Self {
            platform,
            root,
            search_path: std::env::var_os("PATH"),
            runner,
            fetcher,
            unpacker,
        }
    }

    /// Replace the executable search path. `None` disables the system stage.
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    /// Resolve a slot, downloading it when no acceptable binary exists.
    pub fn resolve(
        &self,
        slot: &ToolSlot,
        requested: &VersionRequest,
    ) -> Result<ResolvedTool, InstallError> {
        if let Some(found) = self.probe(slot) {
            return Ok(found);
        }

        info!(tool = slot.name, %requested, "no usable installation, downloading");
        let path = self.download(slot, requested)?;
        Ok(ResolvedTool {
            name: slot.name,
            path,
            origin: Origin::Downloaded,
        })
    }

    /// Run only the system and local stages. Never touches the network.
    pub fn probe(&self, slot: &ToolSlot) -> Option<ResolvedTool> {
        if let Some(path) = self.system_candidate(slot) {
            if self.satisfies_floor(slot, &path) {
                debug!(tool = slot.name, path = %path.display(), "using system binary");
                return Some(ResolvedTool {
                    name: slot.name,
                    path,
                    origin: Origin::System,
                });
            }
        }

        let local = self.root.local_binary(slot.binary, self.platform);
        if local.is_file() && self.satisfies_floor(slot, &local) {
            debug!(tool = slot.name, path = %local.display(), "using local binary");
            return Some(ResolvedTool {
                name: slot.name,
                path: local,
                origin: Origin::Local,
            });
        }

        None
    }

    /// Look the binary up on the search path, skipping our own `bin` so an
    /// activated shell does not report a local install as a system one.
    fn system_candidate(&self, slot: &ToolSlot) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        let own_bin = self.root.bin_dir();
        let dirs: Vec<PathBuf> = std::env::split_paths(search_path)
            .filter(|dir| !dir.as_os_str().is_empty() && *dir != own_bin)
            .collect();
        if dirs.is_empty() {
            return None;
        }

        let joined = std::env::join_paths(dirs).ok()?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| self.root.path().to_path_buf());
        which::which_in(slot.binary, Some(joined), cwd).ok()
    }

    fn satisfies_floor(&self, slot: &ToolSlot, path: &Path) -> bool {
        let Some(floor) = slot.minimum_version else {
            return true;
        };

        let command = ToolCommand::new(path).args(slot.version_args.iter().copied());
        let output = match self.runner.run(&command) {
            Ok(output) if output.success() => output,
            Ok(output) => {
                debug!(tool = slot.name, path = %path.display(), exit_code = ?output.exit_code,
                    "version query failed, rejecting candidate");
                return false;
            }
            Err(e) => {
                debug!(tool = slot.name, path = %path.display(), error = %e,
                    "version query could not run, rejecting candidate");
                return false;
            }
        };

        match output.first_line().and_then(slot.parse_version) {
            Some(version) if version.at_least(&floor) => true,
            Some(version) => {
                output::warning(&format!(
                    "{} {} at {} is older than {}, ignoring it",
                    slot.name,
                    version,
                    path.display(),
                    floor
                ));
                false
            }
            None => {
                debug!(tool = slot.name, path = %path.display(), "unrecognized version output, rejecting candidate");
                false
            }
        }
    }

    /// Fetch, unpack and install a release into `<root>/bin`.
    ///
    /// All intermediate files live in a scratch directory under the root
    /// that is removed when this function returns, on success or failure.
    fn download(
        &self,
        slot: &ToolSlot,
        requested: &VersionRequest,
    ) -> Result<PathBuf, InstallError> {
        let artifact =
            (slot.artifact)(self.platform).ok_or(InstallError::UnsupportedPlatformForTool {
                tool: slot.name,
                platform: self.platform,
            })?;
        let url = (slot.release_url)(requested, &artifact);

        self.root.ensure_dir(self.root.path())?;
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(self.root.path())
            .map_err(|e| InstallError::io("failed to create download directory", e))?;

        let archive_path = scratch.path().join(&artifact.file_name);
        self.fetcher.fetch(&url, &archive_path)?;

        let unpacked = scratch.path().join("unpacked");
        self.unpacker
            .unpack(&archive_path, artifact.format, &unpacked)?;

        let exe = self.platform.exe_name(slot.binary);
        let found = find_binary(&unpacked, &exe).ok_or_else(|| {
            InstallError::BinaryNotFoundInArchive {
                tool: slot.name,
                binary: exe.clone(),
            }
        })?;

        let bin_dir = self.root.bin_dir();
        self.root.ensure_dir(&bin_dir)?;
        let dest = bin_dir.join(&exe);
        install_binary(&found, &dest)?;

        for companion in slot.companions {
            let name = self.platform.exe_name(companion);
            if let Some(path) = find_binary(&unpacked, &name) {
                install_binary(&path, &bin_dir.join(&name))?;
            }
        }

        debug!(tool = slot.name, path = %dest.display(), "installed");
        Ok(dest)
    }
}

/// Move an extracted binary into place. The scratch directory lives under
/// the install root, so this is a same-filesystem rename.
fn install_binary(src: &Path, dest: &Path) -> Result<(), InstallError> {
    make_executable(src)?;
    std::fs::rename(src, dest).map_err(|e| {
        InstallError::io(format!("failed to install {}", dest.display()), e)
    })
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------
