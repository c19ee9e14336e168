use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args as ClapArgs;

use crate::activation::{ProfileContext, ProfileEdit, ShellProfile};
use crate::cli::output;
use crate::config::root::{MANAGED_ENTRIES, OWNER_MARKER, SCRATCH_PREFIX};
use crate::config::{InstallRoot, Settings};
use crate::error::InstallError;
use crate::platform::PlatformId;

use super::RootArgs;

#[derive(ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub root: RootArgs,

    /// Leave the activation hook in shell profiles
    #[arg(long)]
    pub keep_profile: bool,
}

/// What happened under the install root.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Removal {
    pub removed: Vec<PathBuf>,
    /// Entries agent-env does not manage; never touched.
    pub kept: Vec<PathBuf>,
    pub root_removed: bool,
    /// The root has no ownership marker, so nothing was removed.
    pub unowned: bool,
}

pub fn run(args: Args) -> Result<()> {
    let settings = Settings::resolve(args.root.overrides(None))?;
    let platform = PlatformId::detect()?;
    let root = &settings.root;

    output::header("agent-env uninstall");
    output::info(&format!("Root: {}", root.path().display()));

    if root.path().parent().is_none() {
        bail!("refusing to uninstall from {}", root.path().display());
    }

    let removal = remove_managed(root).context("failed to remove installed files")?;
    if removal.removed.is_empty() && !root.path().exists() {
        output::info("Nothing installed");
    }
    if removal.unowned {
        output::warning(&format!(
            "{} was not created by agent-env ({} is missing); leaving it untouched",
            root.path().display(),
            OWNER_MARKER
        ));
    }
    for path in &removal.removed {
        output::success(&format!("Removed {}", path.display()));
    }
    for path in removal.kept.iter().filter(|_| !removal.unowned) {
        output::warning(&format!(
            "Left {} in place (not created by agent-env)",
            path.display()
        ));
    }
    if removal.root_removed {
        output::success(&format!("Removed {}", root.path().display()));
    }

    if args.keep_profile {
        output::info("Leaving shell profiles untouched (--keep-profile)");
        return Ok(());
    }
    let Some(ctx) = ProfileContext::from_env() else {
        output::warning("Could not determine the home directory; shell profiles not checked");
        return Ok(());
    };
    for profile in ShellProfile::candidates(&ctx, platform) {
        let edit = profile
            .remove()
            .with_context(|| format!("failed to clean {}", profile.path.display()))?;
        if edit == ProfileEdit::Removed {
            output::success(&format!("Removed activation from {}", profile.path.display()));
        }
    }
    Ok(())
}

fn is_managed(name: &str) -> bool {
    MANAGED_ENTRIES.contains(&name) || name.starts_with(SCRATCH_PREFIX)
}

/// Delete the managed entries of `root`, then `root` itself if nothing else
/// is left in it. A missing root is a no-op. A root without the ownership
/// marker is left completely untouched.
pub fn remove_managed(root: &InstallRoot) -> Result<Removal, InstallError> {
    let mut removal = Removal::default();
    let dir = root.path();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(removal),
        Err(e) => return Err(InstallError::io(format!("failed to read {}", dir.display()), e)),
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| InstallError::io(format!("failed to read {}", dir.display()), e))?;
        paths.push(entry.path());
    }
    paths.sort();

    let marker = root.owner_marker();
    if !root.is_owned() {
        removal.unowned = true;
        removal.kept = paths;
        return Ok(removal);
    }

    for path in paths {
        if path == marker {
            continue;
        }
        let managed = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_managed);
        if managed {
            remove_entry(&path)?;
            removal.removed.push(path);
        } else {
            removal.kept.push(path);
        }
    }

    // The marker goes last so an interrupted run can be resumed, and stays
    // while foreign files remain so the root can be installed into again.
    if removal.kept.is_empty() {
        remove_entry(&marker)?;
        std::fs::remove_dir(dir)
            .map_err(|e| InstallError::io(format!("failed to remove {}", dir.display()), e))?;
        removal.root_removed = true;
    }
    Ok(removal)
}

/// Remove a file, symlink, or directory tree. Symlinks are never followed.
fn remove_entry(path: &Path) -> Result<(), InstallError> {
    let meta = std::fs::symlink_metadata(path)
        .map_err(|e| InstallError::io(format!("failed to inspect {}", path.display()), e))?;
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| InstallError::io(format!("failed to remove {}", path.display()), e))
}
