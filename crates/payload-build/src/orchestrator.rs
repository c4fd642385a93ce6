//! Prebuild, Build and Postbuild phases.
//!
//! The phases run strictly in order and the first failure ends the run.

use std::fmt;
use std::path::Path;

use log::debug;

use crate::basetools::BaseTools;
use crate::config::BuildSection;
use crate::conf;
use crate::env::EnvOverlay;
use crate::error::{BuildError, Result};
use crate::host::HostOs;
use crate::prepare::{pin_workspace, WORKSPACE};
use crate::probe::FileProbe;
use crate::process::{RunOptions, Runner};
use crate::toolchain::ToolchainDescriptor;

/// Build configuration variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    Debug,
    Release,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Debug => "DEBUG",
            Target::Release => "RELEASE",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware the payload is built for, passed to the build as `PLATFORM_TYPE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlatformVariant {
    #[default]
    Real,
    Qemu,
}

impl PlatformVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformVariant::Real => "REAL",
            PlatformVariant::Qemu => "QEMU",
        }
    }
}

impl fmt::Display for PlatformVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build, fixed once the toolchain is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildRequest {
    pub target: Target,
    pub platform: PlatformVariant,
    pub toolchain: ToolchainDescriptor,
}

impl BuildRequest {
    /// Name of the report file the build system writes.
    pub fn report_file(&self) -> String {
        format!("Report{}.log", self.target)
    }
}

pub struct Orchestrator<'a> {
    pub os: HostOs,
    pub runner: &'a dyn Runner,
    pub fs: &'a dyn FileProbe,
    pub build: &'a BuildSection,
}

impl Orchestrator<'_> {
    /// Run all three phases in `workspace`, which also becomes `WORKSPACE`
    /// for every phase.
    pub fn run(&self, request: &BuildRequest, workspace: &Path, env: &mut EnvOverlay) -> Result<()> {
        pin_workspace(workspace, env);
        self.prebuild(workspace, env)?;
        self.build(request, env)?;
        self.postbuild(request);
        Ok(())
    }

    /// Make sure BaseTools are built and the configuration directory is
    /// populated.
    pub fn prebuild(&self, workspace: &Path, env: &mut EnvOverlay) -> Result<()> {
        BaseTools {
            os: self.os,
            runner: self.runner,
            fs: self.fs,
        }
        .ensure_built(env)?;

        let conf_root = env.get_os(WORKSPACE).map_or_else(|| workspace.to_path_buf(), Into::into);
        let seeded = conf::seed(&conf_root)?;
        if !seeded.is_empty() {
            debug!("seeded configuration: {}", seeded.join(", "));
        }

        println!("End of PreBuild...");
        Ok(())
    }

    /// Command line for the external build system.
    pub fn build_command(&self, request: &BuildRequest) -> Vec<String> {
        let program = if self.os == HostOs::Windows { "build.bat" } else { "build" };
        vec![
            program.to_string(),
            "-p".to_string(),
            self.build.platform.clone(),
            "-a".to_string(),
            self.build.arch.clone(),
            "-b".to_string(),
            request.target.to_string(),
            "-t".to_string(),
            request.toolchain.identifier.clone(),
            format!("-DPLATFORM_TYPE={}", request.platform),
            "-y".to_string(),
            request.report_file(),
        ]
    }

    /// Invoke the external build. Its output streams straight to the console.
    pub fn build(&self, request: &BuildRequest, env: &EnvOverlay) -> Result<()> {
        let cmd = self.build_command(request);
        match self.runner.run(&cmd, env, RunOptions::ECHO) {
            Ok(_) => {}
            Err(err @ BuildError::CommandFailed { .. }) => {
                return Err(BuildError::PayloadBuild {
                    source: Box::new(err),
                });
            }
            Err(err) => return Err(err),
        }
        println!("End of Build...");
        Ok(())
    }

    /// Nothing to do after a successful build yet.
    pub fn postbuild(&self, request: &BuildRequest) {
        println!("Start of PostBuild ...");
        debug!("postbuild {} {}", request.target, request.toolchain.identifier);
        println!("End of PostBuild...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFs, FakeRunner, Reply};
    use tempfile::TempDir;

    fn request(target: Target, platform: PlatformVariant, toolchain: &str) -> BuildRequest {
        BuildRequest {
            target,
            platform,
            toolchain: ToolchainDescriptor::new(toolchain, "x"),
        }
    }

    #[test]
    fn test_release_qemu_command() {
        let runner = FakeRunner::new();
        let fs = FakeFs::new();
        let section = BuildSection::default();
        let orch = Orchestrator { os: HostOs::Posix, runner: &runner, fs: &fs, build: &section };

        let cmd = orch.build_command(&request(Target::Release, PlatformVariant::Qemu, "GCC5"));

        assert_eq!(
            cmd.join(" "),
            "build -p SmmPayloadPkg/SmmPayloadPkg.dsc -a X64 -b RELEASE -t GCC5 -DPLATFORM_TYPE=QEMU -y ReportRELEASE.log"
        );
        assert_eq!(
            cmd[5..].join(" "),
            "-b RELEASE -t GCC5 -DPLATFORM_TYPE=QEMU -y ReportRELEASE.log"
        );
    }

    #[test]
    fn test_windows_uses_batch_entry() {
        let runner = FakeRunner::new();
        let fs = FakeFs::new();
        let section = BuildSection::default();
        let orch = Orchestrator { os: HostOs::Windows, runner: &runner, fs: &fs, build: &section };

        let cmd = orch.build_command(&request(Target::Debug, PlatformVariant::Real, "VS2019"));

        assert_eq!(cmd[0], "build.bat");
        assert!(cmd.contains(&"-DPLATFORM_TYPE=REAL".to_string()));
        assert_eq!(cmd.last().map(String::as_str), Some("ReportDEBUG.log"));
    }

    #[test]
    fn test_build_is_echoed_and_streamed() {
        let runner = FakeRunner::new();
        let fs = FakeFs::new();
        let section = BuildSection::default();
        let orch = Orchestrator { os: HostOs::Posix, runner: &runner, fs: &fs, build: &section };

        orch.build(&request(Target::Debug, PlatformVariant::Real, "GCC49"), &EnvOverlay::new())
            .unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, RunOptions::ECHO);
    }

    #[test]
    fn test_build_failure_is_fatal() {
        let runner = FakeRunner::new().reply(
            "build -p SmmPayloadPkg/SmmPayloadPkg.dsc -a X64 -b DEBUG -t GCC5 -DPLATFORM_TYPE=REAL -y ReportDEBUG.log",
            Reply::Exit(1),
        );
        let fs = FakeFs::new();
        let section = BuildSection::default();
        let orch = Orchestrator { os: HostOs::Posix, runner: &runner, fs: &fs, build: &section };

        let err = orch
            .build(&request(Target::Debug, PlatformVariant::Real, "GCC5"), &EnvOverlay::new())
            .unwrap_err();

        assert!(matches!(err, BuildError::PayloadBuild { .. }));
        assert_eq!(err.to_string(), "Failed to do Build SMM Payload!");
    }

    #[test]
    fn test_failed_prebuild_skips_build() {
        let tmp = TempDir::new().unwrap();
        let runner = FakeRunner::new().reply("make -C BaseTools", Reply::Exit(2));
        let fs = FakeFs::new();
        let section = BuildSection::default();
        let orch = Orchestrator { os: HostOs::Posix, runner: &runner, fs: &fs, build: &section };
        let mut env = EnvOverlay::new();
        env.set(WORKSPACE, tmp.path().display().to_string());

        let err = orch
            .run(&request(Target::Debug, PlatformVariant::Real, "GCC5"), tmp.path(), &mut env)
            .unwrap_err();

        assert!(matches!(err, BuildError::BaseToolsRebuild { .. }));
        assert!(runner.lines().iter().all(|l| !l.starts_with("build ")));
        assert!(!tmp.path().join("Conf").exists());
    }

    #[test]
    fn test_run_uses_workspace_over_stale_external() {
        let tmp = TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let fs = FakeFs::new();
        let section = BuildSection::default();
        let orch = Orchestrator { os: HostOs::Posix, runner: &runner, fs: &fs, build: &section };
        let mut env: EnvOverlay = [(WORKSPACE, "/stale/edk2")].into_iter().collect();

        // No templates in the temp workspace, so seeding fails, but only
        // after the rebuild ran against the pinned root.
        let err = orch
            .run(&request(Target::Debug, PlatformVariant::Real, "GCC5"), tmp.path(), &mut env)
            .unwrap_err();

        assert_eq!(env.get_os(WORKSPACE), Some(tmp.path().as_os_str()));
        match err {
            BuildError::Io { path, .. } => assert!(path.starts_with(tmp.path())),
            other => panic!("unexpected error: {other}"),
        }
    }
}
