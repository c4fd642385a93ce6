use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::{parse_flags, Cli, Cmd, Shell};
use crate::config::BuildConfig;
use crate::env::EnvOverlay;
use crate::host::HostOs;
use crate::orchestrator::{BuildRequest, Orchestrator};
use crate::prepare::{default_workspace_root, enter_workspace, pin_workspace, Preparer};
use crate::probe::HostFs;
use crate::process::HostRunner;
use crate::stage::{stage, CopyManifest};
use crate::toolchain::Resolver;

/// Returns the process exit code. Flag errors yield a negative code; every
/// other failure is an `Err`.
pub fn run(cli: Cli) -> Result<i32> {
    match cli.cmd {
        None => build(cli.workspace, &cli.flags),
        Some(Cmd::Toolchain) => toolchain(),
        Some(Cmd::Env { shell }) => env(cli.workspace, shell),
        Some(Cmd::Stage {
            manifest,
            source,
            dest,
        }) => {
            let manifest = CopyManifest::load(&manifest)?;
            stage(&manifest, &source, &dest)?;
            Ok(0)
        }
    }
}

fn workspace_root(requested: Option<PathBuf>) -> Result<PathBuf> {
    let root = match requested {
        Some(root) => root,
        None => default_workspace_root().context("cannot locate the workspace root")?,
    };
    Ok(enter_workspace(&root)?)
}

fn build(workspace: Option<PathBuf>, flags: &[String]) -> Result<i32> {
    let (target, platform) = match parse_flags(flags) {
        Ok(parsed) => parsed,
        Err(err) => {
            println!("{err}");
            return Ok(-1);
        }
    };

    let root = workspace_root(workspace)?;
    let config = BuildConfig::load(&root)?;
    let os = HostOs::current();
    let mut env = EnvOverlay::inherit();

    let toolchain = Preparer {
        os,
        runner: &HostRunner,
        fs: &HostFs,
        tool_defaults: &config.tools,
    }
    .prepare(&root, &mut env)?;
    println!("Using {}, Version {}", toolchain.identifier, toolchain.version);

    let request = BuildRequest {
        target,
        platform,
        toolchain,
    };
    Orchestrator {
        os,
        runner: &HostRunner,
        fs: &HostFs,
        build: &config.build,
    }
    .run(&request, &root, &mut env)?;

    Ok(0)
}

fn toolchain() -> Result<i32> {
    let os = HostOs::current();
    let env = EnvOverlay::inherit();
    let found = Resolver {
        os,
        env: &env,
        runner: &HostRunner,
        fs: &HostFs,
    }
    .resolve()?;

    if !found.is_resolved() {
        println!("[FAIL] no supported toolchain found on {os}");
        return Ok(1);
    }

    println!("[OK] {} (version {})", found.identifier, found.version);
    if let Some(install) = &found.installation {
        println!("     {}={}", install.prefix_variable, install.path);
    }
    Ok(0)
}

fn env(workspace: Option<PathBuf>, shell: Shell) -> Result<i32> {
    let root = workspace_root(workspace)?;
    let config = BuildConfig::load(&root)?;
    let inherited = EnvOverlay::inherit();
    let mut env = inherited.clone();

    let toolchain = Preparer {
        os: HostOs::current(),
        runner: &HostRunner,
        fs: &HostFs,
        tool_defaults: &config.tools,
    }
    .prepare(&root, &mut env)?;
    pin_workspace(&root, &mut env);

    let comment = if shell == Shell::Cmd { "rem" } else { "#" };
    println!("{comment} {} {}", toolchain.identifier, toolchain.version);
    // Pure exports so the output can be `eval`ed.
    for (name, value) in env.changes_since(&inherited) {
        println!(
            "{}",
            export_line(shell, &name.to_string_lossy(), &value.to_string_lossy())
        );
    }
    Ok(0)
}

/// One assignment in `shell` syntax. POSIX values are single-quoted; `cmd`
/// values have `%` doubled, as a batch file expects.
fn export_line(shell: Shell, name: &str, value: &str) -> String {
    match shell {
        Shell::Bash | Shell::Sh => format!("export {name}='{}'", value.replace('\'', r"'\''")),
        Shell::Cmd => format!("set \"{name}={}\"", value.replace('%', "%%")),
    }
}
