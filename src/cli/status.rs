use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;

use crate::activation::{ProfileContext, ShellProfile};
use crate::cli::output;
use crate::config::Settings;
use crate::error::InstallError;
use crate::platform::PlatformId;
use crate::toolchain::{
    slots, ArchiveFormat, CommandRunner, Fetch, FnmManager, ResolvedTool, Resolver, SystemRunner,
    Unpack, UvManager,
};

use super::{RootArgs, VersionArgs};

#[derive(ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub root: RootArgs,

    #[command(flatten)]
    pub versions: VersionArgs,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Snapshot of the install root. Nothing here is ever installed.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub platform: PlatformId,
    pub root: PathBuf,
    pub uv: Option<ResolvedTool>,
    pub python: RuntimeStatus,
    pub venv: Option<PathBuf>,
    pub fnm: Option<ResolvedTool>,
    pub node: RuntimeStatus,
    pub activation_script: Option<PathBuf>,
    pub profile: Option<ProfileStatus>,
}

#[derive(Debug, Serialize)]
pub struct RuntimeStatus {
    pub requested: String,
    pub installed: bool,
    /// Interpreter path, when the managing tool reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileStatus {
    pub path: PathBuf,
    pub hooked: bool,
}

pub fn run(args: Args) -> Result<()> {
    let settings = Settings::resolve(args.root.overrides(Some(&args.versions)))?;
    let platform = PlatformId::detect()?;

    let runner = SystemRunner;
    let resolver = Resolver::new(platform, &settings.root, &runner, &Offline, &Offline);

    let report = collect(&settings, platform, &resolver, &runner, ProfileContext::from_env());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Network and archive stand-in for read-only runs. `Resolver::probe`
/// never reaches it; any call is an error rather than a download.
pub struct Offline;

impl Fetch for Offline {
    fn fetch(&self, url: &str, _dest: &Path) -> Result<(), InstallError> {
        Err(InstallError::Download {
            url: url.to_string(),
            reason: "status never downloads".into(),
        })
    }
}

impl Unpack for Offline {
    fn unpack(&self, archive: &Path, _: ArchiveFormat, _: &Path) -> Result<(), InstallError> {
        Err(InstallError::ArchiveExtraction {
            archive: archive.to_path_buf(),
            reason: "status never unpacks".into(),
        })
    }
}

/// Probe every slot and runtime. Query failures count as "not installed".
pub fn collect(
    settings: &Settings,
    platform: PlatformId,
    resolver: &Resolver<'_>,
    runner: &dyn CommandRunner,
    profile_ctx: Option<ProfileContext>,
) -> StatusReport {
    let root = &settings.root;

    let uv = resolver.probe(&slots::UV);
    let python_path = uv.as_ref().and_then(|uv| {
        UvManager::new(uv, root, platform, runner)
            .find_python(&settings.python_version)
            .ok()
            .flatten()
    });
    let python = RuntimeStatus {
        requested: settings.python_version.clone(),
        installed: python_path.is_some(),
        path: python_path.filter(|p| !p.is_empty()),
    };

    let fnm = resolver.probe(&slots::FNM);
    let node_installed = fnm.as_ref().is_some_and(|fnm| {
        root.fnm_dir().is_dir()
            && FnmManager::new(fnm, root, runner)
                .has_major(settings.node_major)
                .unwrap_or(false)
    });
    let node = RuntimeStatus {
        requested: settings.node_major.to_string(),
        installed: node_installed,
        path: None,
    };

    let venv_python = root.venv_python(platform);
    let activation = if platform.is_windows() {
        root.env_ps1_file()
    } else {
        root.env_file()
    };

    StatusReport {
        platform,
        root: root.path().to_path_buf(),
        uv,
        python,
        venv: venv_python.exists().then(|| root.venv_dir()),
        fnm,
        node,
        activation_script: activation.is_file().then_some(activation),
        profile: profile_ctx.map(|ctx| {
            let profile = ShellProfile::detect(&ctx, platform);
            ProfileStatus {
                hooked: profile.is_hooked(),
                path: profile.path,
            }
        }),
    }
}

fn print_report(report: &StatusReport) {
    output::header("agent-env status");
    output::info(&format!("Platform: {}", report.platform));
    output::info(&format!("Root: {}", report.root.display()));

    output::header("Tools");
    print_tool("uv", report.uv.as_ref());
    print_tool("fnm", report.fnm.as_ref());

    output::header("Runtimes");
    print_runtime("Python", &report.python);
    match &report.venv {
        Some(path) => output::success(&format!("virtual environment at {}", path.display())),
        None => output::warning("virtual environment: not created"),
    }
    print_runtime("Node", &report.node);

    output::header("Shell");
    match &report.activation_script {
        Some(path) => output::success(&format!("activation script at {}", path.display())),
        None => output::warning("activation script: not written"),
    }
    match &report.profile {
        Some(p) if p.hooked => output::success(&format!("hooked into {}", p.path.display())),
        Some(p) => output::info(&format!("not hooked into {}", p.path.display())),
        None => output::warning("could not determine the shell profile"),
    }
}

fn print_tool(name: &str, tool: Option<&ResolvedTool>) {
    match tool {
        Some(t) => output::success(&format!("{name} ({}) at {}", t.origin, t.path.display())),
        None => output::warning(&format!("{name}: not installed")),
    }
}

fn print_runtime(name: &str, runtime: &RuntimeStatus) {
    if runtime.installed {
        match &runtime.path {
            Some(path) => output::success(&format!("{name} {} at {path}", runtime.requested)),
            None => output::success(&format!("{name} {}", runtime.requested)),
        }
    } else {
        output::warning(&format!("{name} {}: not installed", runtime.requested));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InstallRoot, VersionRequest};
    use crate::toolchain::{CommandOutput, ToolCommand};
    use std::cell::RefCell;

    /// Every command fails; records what was attempted.
    struct NothingWorks(RefCell<Vec<String>>);

    impl CommandRunner for NothingWorks {
        fn run(&self, command: &ToolCommand) -> Result<CommandOutput, InstallError> {
            self.0.borrow_mut().push(command.display());
            Ok(CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    struct NoNetwork;

    impl Fetch for NoNetwork {
        fn fetch(&self, url: &str, _dest: &Path) -> Result<(), InstallError> {
            panic!("status must not download {url}");
        }
    }

    impl Unpack for NoNetwork {
        fn unpack(&self, _: &Path, _: ArchiveFormat, _: &Path) -> Result<(), InstallError> {
            panic!("status must not unpack");
        }
    }

    fn settings(root: &Path) -> Settings {
        Settings {
            root: InstallRoot::new(root),
            uv_version: VersionRequest::Latest,
            python_version: "3.12".into(),
            fnm_version: VersionRequest::Latest,
            node_major: 22,
        }
    }

    #[test]
    fn empty_root_reports_nothing_installed() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir.path().join("root"));
        let platform = PlatformId::detect().unwrap();
        let runner = NothingWorks(RefCell::new(Vec::new()));
        let resolver = Resolver::new(platform, &settings.root, &runner, &NoNetwork, &NoNetwork)
            .with_search_path(None);

        let ctx = ProfileContext {
            home: dir.path().to_path_buf(),
            documents: None,
            shell: Some("/bin/zsh".into()),
        };
        let report = collect(&settings, platform, &resolver, &runner, Some(ctx));

        assert!(report.uv.is_none());
        assert!(report.fnm.is_none());
        assert!(!report.python.installed);
        assert!(!report.node.installed);
        assert!(report.venv.is_none());
        assert!(report.activation_script.is_none());
        assert!(!report.profile.unwrap().hooked);
        assert!(runner.0.borrow().is_empty(), "no tool should have run");
        assert!(!settings.root.path().exists(), "status must not create the root");
    }

    #[test]
    fn report_serializes_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let platform = PlatformId::detect().unwrap();
        let runner = NothingWorks(RefCell::new(Vec::new()));
        let resolver = Resolver::new(platform, &settings.root, &runner, &NoNetwork, &NoNetwork)
            .with_search_path(None);

        let report = collect(&settings, platform, &resolver, &runner, None);
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["python"]["requested"], "3.12");
        assert_eq!(json["node"]["requested"], "22");
        assert_eq!(json["uv"], serde_json::Value::Null);
        assert!(json["platform"]["os"].is_string());
    }

    #[test]
    fn offline_stand_in_refuses_network_and_archives() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("uv.tar.gz");
        assert!(matches!(
            Offline.fetch("https://example.invalid/uv.tar.gz", &dest),
            Err(InstallError::Download { .. })
        ));
        assert!(!dest.exists());
        assert!(matches!(
            Offline.unpack(&dest, ArchiveFormat::TarGz, dir.path()),
            Err(InstallError::ArchiveExtraction { .. })
        ));
    }

    #[test]
    fn collect_works_without_a_network_client() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir.path().join("root"));
        let platform = PlatformId::detect().unwrap();
        let runner = NothingWorks(RefCell::new(Vec::new()));
        let resolver = Resolver::new(platform, &settings.root, &runner, &Offline, &Offline)
            .with_search_path(None);

        let report = collect(&settings, platform, &resolver, &runner, None);
        assert!(report.uv.is_none());
        assert!(report.profile.is_none());
    }
}
