//! Prebuilt auxiliary tools (BaseTools).
//!
//! The build system needs a handful of native image and compression
//! utilities. They are built once and cached under the workspace; a run that
//! finds them all present does nothing here.

use log::{debug, info};

use crate::env::EnvOverlay;
use crate::error::{BuildError, Result};
use crate::host::HostOs;
use crate::prepare::{BASE_TOOLS, WORKSPACE};
use crate::probe::FileProbe;
use crate::process::{argv, RunOptions, Runner};

/// Utilities that must exist before the build system is invoked.
pub const REQUIRED_TOOLS: [&str; 5] = ["GenFfs", "GenFv", "GenFw", "GenSec", "LzmaCompress"];

pub const PYTHON_COMMAND: &str = "PYTHON_COMMAND";
const PYTHON: &str = "python3";
const PYTHON_FALLBACK: &str = "python";
const PYTHON_PROBE: &str =
    "import sys, platform; print(', '.join([sys.executable, platform.python_version()]))";

pub struct BaseTools<'a> {
    pub os: HostOs,
    pub runner: &'a dyn Runner,
    pub fs: &'a dyn FileProbe,
}

impl BaseTools<'_> {
    /// Directory the prebuilt binaries live in.
    pub fn bin_dir(&self, workspace: &str) -> String {
        match self.os {
            HostOs::Windows => self.os.join(workspace, &[BASE_TOOLS, "Bin", "Win32"]),
            _ => self.os.join(workspace, &[BASE_TOOLS, "Source", "C", "bin"]),
        }
    }

    /// Required tools with no binary in [`Self::bin_dir`].
    pub fn missing(&self, workspace: &str) -> Vec<&'static str> {
        let dir = self.bin_dir(workspace);
        REQUIRED_TOOLS
            .into_iter()
            .filter(|tool| {
                let exe = format!("{tool}{}", self.os.exe_suffix());
                !self.fs.exists(&self.os.join(&dir, &[exe.as_str()]))
            })
            .collect()
    }

    /// Make sure every required tool exists, rebuilding BaseTools if not.
    /// Returns whether a rebuild was run.
    pub fn ensure_built(&self, env: &mut EnvOverlay) -> Result<bool> {
        if self.os.is_posix_like() {
            self.detect_python(env)?;
        }

        let workspace = env.get(WORKSPACE).unwrap_or(".").to_string();
        let missing = self.missing(&workspace);
        if missing.is_empty() {
            debug!("BaseTools binaries present in {}", self.bin_dir(&workspace));
            return Ok(false);
        }
        info!("missing BaseTools binaries: {}", missing.join(", "));

        let rebuild = if self.os == HostOs::Windows {
            println!("Could not find pre-built BaseTools binaries, try to rebuild BaseTools ...");
            argv(["BaseTools\\toolsetup.bat", "forcerebuild"])
        } else {
            argv(["make", "-C", BASE_TOOLS])
        };

        match self.runner.run(&rebuild, env, RunOptions::default()) {
            Ok(_) => Ok(true),
            Err(err @ BuildError::CommandFailed { .. }) => Err(BuildError::BaseToolsRebuild {
                source: Box::new(err),
            }),
            Err(err) => Err(err),
        }
    }

    /// Record which Python the BaseTools wrappers should run.
    fn detect_python(&self, env: &mut EnvOverlay) -> Result<()> {
        let out = self
            .runner
            .run(&argv([PYTHON, "-c", PYTHON_PROBE]), env, RunOptions::CAPTURE)?;

        match parse_python_probe(&out) {
            Some((exe, version)) => {
                env.set(PYTHON_COMMAND, exe);
                println!("Using {exe}, Version {version}");
            }
            None => env.set(PYTHON_COMMAND, PYTHON_FALLBACK),
        }
        Ok(())
    }
}

/// Split `"<executable>, <version>"` as printed by the interpreter probe.
fn parse_python_probe(out: &str) -> Option<(&str, &str)> {
    let (exe, version) = out.split_once(',')?;
    let exe = exe.trim();
    if exe.is_empty() {
        return None;
    }
    Some((exe, version.trim()))
}
