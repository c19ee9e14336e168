//! Activation scripts written into the install root.
//!
//! Both files are regenerated on every install. Each is written to a temp
//! file in the root and renamed over the old one, so a shell sourcing it
//! concurrently sees either the old or the new script, never a partial one.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::InstallRoot;
use crate::error::InstallError;

const ROOT_PLACEHOLDER: &str = "@AGENT_ENV_HOME@";

const POSIX_TEMPLATE: &str = r#"# Generated by agent-env. Re-run `agent-env install` to regenerate.
AGENT_ENV_HOME="@AGENT_ENV_HOME@"
export AGENT_ENV_HOME
export UV_PYTHON_INSTALL_DIR="$AGENT_ENV_HOME/python"
export FNM_DIR="$AGENT_ENV_HOME/fnm"
export VIRTUAL_ENV="$AGENT_ENV_HOME/venv"
case ":${PATH}:" in
    *":$VIRTUAL_ENV/bin:"*) ;;
    *) export PATH="$VIRTUAL_ENV/bin:$PATH" ;;
esac
case ":${PATH}:" in
    *":$AGENT_ENV_HOME/bin:"*) ;;
    *) export PATH="$AGENT_ENV_HOME/bin:$PATH" ;;
esac
if command -v fnm >/dev/null 2>&1; then
    eval "$(fnm env --shell bash)"
fi
"#;

const POWERSHELL_TEMPLATE: &str = r#"# Generated by agent-env. Re-run `agent-env install` to regenerate.
$env:AGENT_ENV_HOME = '@AGENT_ENV_HOME@'
$env:UV_PYTHON_INSTALL_DIR = Join-Path $env:AGENT_ENV_HOME 'python'
$env:FNM_DIR = Join-Path $env:AGENT_ENV_HOME 'fnm'
$env:VIRTUAL_ENV = Join-Path $env:AGENT_ENV_HOME 'venv'
foreach ($agentEnvDir in @((Join-Path $env:VIRTUAL_ENV 'Scripts'), (Join-Path $env:AGENT_ENV_HOME 'bin'))) {
    if (-not (($env:PATH -split [IO.Path]::PathSeparator) -contains $agentEnvDir)) {
        $env:PATH = $agentEnvDir + [IO.Path]::PathSeparator + $env:PATH
    }
}
if (Get-Command fnm -ErrorAction SilentlyContinue) {
    fnm env --shell powershell | Out-String | Invoke-Expression
}
"#;

/// Escape a path for use inside a double-quoted POSIX shell string.
pub(crate) fn posix_quote(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('$', "\\$")
        .replace('`', "\\`")
        .replace('"', "\\\"")
}

/// Escape a path for use inside a single-quoted PowerShell string.
pub(crate) fn powershell_quote(path: &Path) -> String {
    path.display().to_string().replace('\'', "''")
}

pub fn posix_script(root: &InstallRoot) -> String {
    POSIX_TEMPLATE.replace(ROOT_PLACEHOLDER, &posix_quote(root.path()))
}

pub fn powershell_script(root: &InstallRoot) -> String {
    POWERSHELL_TEMPLATE.replace(ROOT_PLACEHOLDER, &powershell_quote(root.path()))
}

/// Write both activation scripts, returning their paths.
pub fn materialize(root: &InstallRoot) -> Result<Vec<PathBuf>, InstallError> {
    root.ensure_dir(root.path())?;
    let files = [
        (root.env_file(), posix_script(root)),
        (root.env_ps1_file(), powershell_script(root)),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (path, contents) in files {
        write_atomic(root.path(), &path, &contents)?;
        written.push(path);
    }
    Ok(written)
}

fn write_atomic(dir: &Path, path: &Path, contents: &str) -> Result<(), InstallError> {
    let context = || format!("failed to write {}", path.display());
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| InstallError::io(context(), e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| InstallError::io(context(), e))?;
    tmp.persist(path)
        .map_err(|e| InstallError::io(context(), e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_script_embeds_root() {
        let root = InstallRoot::new("/home/dev/.agent-env");
        let script = posix_script(&root);
        assert!(script.contains("AGENT_ENV_HOME=\"/home/dev/.agent-env\""));
        assert!(script.contains("export FNM_DIR=\"$AGENT_ENV_HOME/fnm\""));
        assert!(!script.contains(ROOT_PLACEHOLDER));
    }

    #[test]
    fn posix_script_escapes_special_characters() {
        let root = InstallRoot::new("/tmp/my $dir/\"q\"");
        let script = posix_script(&root);
        assert!(script.contains(r#"AGENT_ENV_HOME="/tmp/my \$dir/\"q\"""#));
    }

    #[test]
    fn powershell_script_doubles_single_quotes() {
        let root = InstallRoot::new("C:/Users/o'brien/.agent-env");
        let script = powershell_script(&root);
        assert!(script.contains("$env:AGENT_ENV_HOME = 'C:/Users/o''brien/.agent-env'"));
    }

    #[test]
    fn path_entries_are_guarded_separately() {
        let root = InstallRoot::new("/home/dev/.agent-env");
        let posix = posix_script(&root);
        assert!(posix.contains(r#"*":$VIRTUAL_ENV/bin:"*) ;;"#));
        assert!(posix.contains(r#"*":$AGENT_ENV_HOME/bin:"*) ;;"#));

        let ps = powershell_script(&root);
        assert_eq!(ps.matches("-contains $agentEnvDir").count(), 1);
        assert!(ps.contains("(Join-Path $env:VIRTUAL_ENV 'Scripts'), (Join-Path $env:AGENT_ENV_HOME 'bin')"));
    }

    #[cfg(unix)]
    #[test]
    fn sourcing_adds_venv_even_when_bin_is_on_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path().join("root"));
        materialize(&root).unwrap();

        let bin = root.bin_dir().display().to_string();
        let venv_bin = root.venv_dir().join("bin").display().to_string();
        let output = std::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(format!(". \"{}\"; printf '%s' \"$PATH\"", root.env_file().display()))
            .env("PATH", format!("{bin}:/usr/bin:/bin"))
            .output()
            .unwrap();
        let path = String::from_utf8(output.stdout).unwrap();
        let entries: Vec<&str> = path.split(':').collect();

        assert!(entries.contains(&venv_bin.as_str()), "{path}");
        assert_eq!(entries.iter().filter(|e| **e == bin).count(), 1, "{path}");
    }

    #[test]
    fn materialize_writes_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path().join("root"));

        let written = materialize(&root).unwrap();
        assert_eq!(written, vec![root.env_file(), root.env_ps1_file()]);

        std::fs::write(root.env_file(), "stale").unwrap();
        materialize(&root).unwrap();
        assert_eq!(
            std::fs::read_to_string(root.env_file()).unwrap(),
            posix_script(&root)
        );

        // no temp files left behind
        let names: Vec<_> = std::fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2, "{names:?}");
    }
}
