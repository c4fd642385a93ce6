//! Workspace and environment preparation.
//!
//! This is the only place the environment overlay is written during setup.
//! Every change either appends, fills in a missing value, or sets one of the
//! workspace variables the build system reads; inherited entries are never
//! removed.

use std::path::{Path, PathBuf};

use log::debug;

use crate::config::ToolDefaults;
use crate::env::EnvOverlay;
use crate::error::{BuildError, Result};
use crate::host::HostOs;
use crate::probe::FileProbe;
use crate::process::Runner;
use crate::toolchain::{Resolver, ToolchainDescriptor};

pub const WORKSPACE: &str = "WORKSPACE";
pub const EDK_TOOLS_PATH: &str = "EDK_TOOLS_PATH";
pub const BASE_TOOLS_PATH: &str = "BASE_TOOLS_PATH";
pub const CONF_PATH: &str = "CONF_PATH";
pub const TOOL_CHAIN: &str = "TOOL_CHAIN";
pub const PYTHONPATH: &str = "PYTHONPATH";
pub const NASM_PREFIX: &str = "NASM_PREFIX";
pub const OPENSSL_PATH: &str = "OPENSSL_PATH";
pub const IASL_PREFIX: &str = "IASL_PREFIX";

/// Directory holding the auxiliary tools, relative to the workspace.
pub const BASE_TOOLS: &str = "BaseTools";

/// Repository that contains this crate (`<repo>/crates/payload-build`).
pub fn default_workspace_root() -> Option<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
}

/// Absolute form of `root`. Symlinks are left alone and no `\\?\` prefix
/// is added, so the result is usable as a working directory for `cmd.exe`.
pub fn workspace_path(root: &Path) -> Result<PathBuf> {
    std::path::absolute(root).map_err(|e| BuildError::io("cannot open workspace", root, e))
}

/// Make `root` the working directory; relative paths used later in the run
/// resolve against it.
pub fn enter_workspace(root: &Path) -> Result<PathBuf> {
    let root = workspace_path(root)?;
    std::env::set_current_dir(&root).map_err(|e| BuildError::io("cannot enter workspace", &root, e))?;
    debug!("workspace: {}", root.display());
    Ok(root)
}

/// Point `WORKSPACE` at the root the build actually runs in. Called after
/// [`Preparer::prepare`], so `CONF_PATH` still reflects any external value.
pub fn pin_workspace(root: &Path, env: &mut EnvOverlay) {
    env.set(WORKSPACE, root.as_os_str());
}

pub struct Preparer<'a> {
    pub os: HostOs,
    pub runner: &'a dyn Runner,
    pub fs: &'a dyn FileProbe,
    pub tool_defaults: &'a ToolDefaults,
}

impl Preparer<'_> {
    /// Detect the toolchain for `root` and wire `env` up for the build.
    pub fn prepare(&self, root: &Path, env: &mut EnvOverlay) -> Result<ToolchainDescriptor> {
        let os = self.os;
        env.set_host(os);
        let root = root.display().to_string();

        let toolchain = Resolver {
            os,
            env: &*env,
            runner: self.runner,
            fs: self.fs,
        }
        .resolve()?;

        match os {
            HostOs::MacOs | HostOs::Posix => {
                env.append_path(os, &os.join(&root, &[BASE_TOOLS, "BinWrappers", "PosixLike"]));
            }
            HostOs::Windows => {
                env.append_path(os, &os.join(&root, &[BASE_TOOLS, "Bin", "Win32"]));
                env.append_path(os, &os.join(&root, &[BASE_TOOLS, "BinWrappers", "WindowsLike"]));
                env.set(PYTHONPATH, os.join(&root, &[BASE_TOOLS, "Source", "Python"]));

                let Some(install) = toolchain.installation.as_ref() else {
                    return Err(BuildError::VisualStudioNotFound);
                };
                env.set(&install.prefix_variable, install.path.as_str());
                env.set_default(NASM_PREFIX, self.tool_defaults.nasm_prefix.as_str());
                env.set_default(OPENSSL_PATH, self.tool_defaults.openssl_path.as_str());
                env.set_default(IASL_PREFIX, self.tool_defaults.iasl_prefix.as_str());
            }
            HostOs::Unsupported => return Err(BuildError::UnsupportedOs(os)),
        }

        if !toolchain.is_resolved() {
            return Err(BuildError::UnsupportedOs(os));
        }

        let base_tools = os.join(&root, &[BASE_TOOLS]);
        env.set(EDK_TOOLS_PATH, base_tools.as_str());
        env.set(BASE_TOOLS_PATH, base_tools);
        env.set_default(WORKSPACE, root.as_str());
        let conf = os.join(env.get(WORKSPACE).unwrap_or(&root), &["Conf"]);
        env.set(CONF_PATH, conf);
        env.set(TOOL_CHAIN, toolchain.identifier.as_str());

        Ok(toolchain)
    }
}
