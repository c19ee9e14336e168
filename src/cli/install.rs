use anyhow::{Context, Result};
use clap::Args as ClapArgs;

use crate::activation::{self, ProfileContext, ProfileEdit, ShellProfile};
use crate::cli::output;
use crate::config::Settings;
use crate::platform::PlatformId;
use crate::toolchain::{
    slots, ArchiveUnpacker, FnmManager, HttpFetcher, Origin, ProvisionAction, ResolvedTool,
    Resolver, SystemRunner, UvManager,
};

use super::{RootArgs, VersionArgs};

#[derive(ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub root: RootArgs,

    #[command(flatten)]
    pub versions: VersionArgs,

    /// Do not add the activation hook to the shell profile
    #[arg(long)]
    pub no_modify_profile: bool,
}

pub fn run(args: Args) -> Result<()> {
    let settings = Settings::resolve(args.root.overrides(Some(&args.versions)))?;
    let platform = PlatformId::detect()?;
    let root = &settings.root;

    output::header("agent-env install");
    output::info(&format!("Platform: {platform}"));
    output::info(&format!("Root: {}", root.path().display()));
    root.claim()?;

    let runner = SystemRunner;
    let fetcher = HttpFetcher::new()?;
    let unpacker = ArchiveUnpacker;
    let resolver = Resolver::new(platform, root, &runner, &fetcher, &unpacker);

    // Python side: uv, then the interpreter and the venv through it.
    output::header("Python");
    let uv = resolver
        .resolve(&slots::UV, &settings.uv_version)
        .context("failed to provision uv")?;
    report_tool(&uv);

    let uv_manager = UvManager::new(&uv, root, platform, &runner);
    let python = uv_manager
        .ensure_python(&settings.python_version)
        .with_context(|| format!("failed to install Python {}", settings.python_version))?;
    report_action(&format!("Python {}", settings.python_version), &python);

    let venv = uv_manager
        .ensure_venv(&settings.python_version)
        .context("failed to create the virtual environment")?;
    report_action(
        &format!("virtual environment at {}", root.venv_dir().display()),
        &venv,
    );

    // Node side: fnm, then the requested major through it.
    output::header("Node.js");
    let fnm = resolver
        .resolve(&slots::FNM, &settings.fnm_version)
        .context("failed to provision fnm")?;
    report_tool(&fnm);

    let node = FnmManager::new(&fnm, root, &runner)
        .ensure_node(settings.node_major)
        .with_context(|| format!("failed to install Node {}", settings.node_major))?;
    report_action(&format!("Node {}", settings.node_major), &node.action);
    if let Some(warning) = &node.verification_warning {
        output::warning(&format!("could not verify Node {}: {warning}", settings.node_major));
    }

    output::header("Shell");
    for path in activation::materialize(root).context("failed to write activation scripts")? {
        output::success(&format!("Wrote {}", path.display()));
    }

    let hooked = if args.no_modify_profile {
        output::info("Skipping shell profile (--no-modify-profile)");
        None
    } else {
        match ProfileContext::from_env() {
            Some(ctx) => {
                let profile = ShellProfile::detect(&ctx, platform);
                match profile.install(root).context("failed to update the shell profile")? {
                    ProfileEdit::Added => {
                        output::success(&format!("Added activation to {}", profile.path.display()))
                    }
                    _ => output::info(&format!(
                        "Activation already present in {}",
                        profile.path.display()
                    )),
                }
                Some(profile)
            }
            None => {
                output::warning("Could not determine the home directory; shell profile not modified");
                None
            }
        }
    };

    output::header("Done");
    output::success("agent-env is ready");
    let activate = match &hooked {
        Some(profile) => profile.activation_line(root),
        None if platform.is_windows() => format!(". '{}'", root.env_ps1_file().display()),
        None => format!(". \"{}\"", root.env_file().display()),
    };
    output::info(&format!("Activate it in this shell with: {activate}"));
    if hooked.is_some() {
        output::info("New shells pick it up automatically.");
    }
    Ok(())
}

fn report_tool(tool: &ResolvedTool) {
    let msg = match tool.origin {
        Origin::System => format!("Using system {} at {}", tool.name, tool.path.display()),
        Origin::Local => format!("Using {} at {}", tool.name, tool.path.display()),
        Origin::Downloaded => format!("Downloaded {} to {}", tool.name, tool.path.display()),
    };
    output::success(&msg);
}

fn report_action(what: &str, action: &ProvisionAction) {
    match action {
        ProvisionAction::AlreadyCorrect => output::success(&format!("{what} already installed")),
        ProvisionAction::Installed => output::success(&format!("Installed {what}")),
    }
}
