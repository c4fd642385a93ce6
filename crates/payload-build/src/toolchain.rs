//! Native toolchain detection.
//!
//! Resolution is a function of the host family, the environment overlay and
//! what the filesystem probe reports. It never mutates anything; exporting
//! the result is the preparer's job.

use log::debug;

use crate::env::EnvOverlay;
use crate::error::{BuildError, Result};
use crate::host::HostOs;
use crate::probe::FileProbe;
use crate::process::{argv, RunOptions, Runner};

pub const XCODE5: &str = "XCODE5";
pub const GCC49: &str = "GCC49";
pub const GCC5: &str = "GCC5";

/// Newest GCC major version still served by the GCC49 tool definitions.
const GCC49_MAX_MAJOR: u32 = 4;

const VSWHERE: &str = "Microsoft Visual Studio/Installer/vswhere.exe";
const VC_TOOLS_VERSION_FILE: &str = "VC\\Auxiliary\\Build\\Microsoft.VCToolsVersion.default.txt";
/// Release years located through vswhere, newest first.
const VSWHERE_YEARS: [&str; 2] = ["2019", "2017"];
/// Older releases only discoverable through their common-tools variable.
const LEGACY_VS: [(&str, &str); 2] = [("2015", "VS140COMNTOOLS"), ("2013", "VS120COMNTOOLS")];
const VS_PRODUCT_PREFIX: &str = "Microsoft Visual Studio ";

/// Where an IDE-based toolchain is installed, and the variable the build
/// system reads that location from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Installation {
    pub prefix_variable: String,
    pub path: String,
}

/// Outcome of toolchain resolution. An empty identifier means nothing usable
/// was found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolchainDescriptor {
    pub identifier: String,
    pub version: String,
    pub installation: Option<Installation>,
}

impl ToolchainDescriptor {
    pub fn new(identifier: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            version: version.into(),
            installation: None,
        }
    }

    /// Nothing was found.
    pub fn unresolved() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn installed_at(mut self, prefix_variable: impl Into<String>, path: impl Into<String>) -> Self {
        self.installation = Some(Installation {
            prefix_variable: prefix_variable.into(),
            path: path.into(),
        });
        self
    }

    pub fn is_resolved(&self) -> bool {
        !self.identifier.is_empty()
    }

    pub fn installation_path(&self) -> Option<&str> {
        self.installation.as_ref().map(|i| i.path.as_str())
    }

    pub fn prefix_variable(&self) -> Option<&str> {
        self.installation.as_ref().map(|i| i.prefix_variable.as_str())
    }
}

/// Everything resolution is allowed to look at.
pub struct Resolver<'a> {
    pub os: HostOs,
    pub env: &'a EnvOverlay,
    pub runner: &'a dyn Runner,
    pub fs: &'a dyn FileProbe,
}

impl Resolver<'_> {
    pub fn resolve(&self) -> Result<ToolchainDescriptor> {
        let found = match self.os {
            HostOs::MacOs => self.xcode()?,
            HostOs::Posix => self.gcc()?,
            HostOs::Windows => self.visual_studio()?,
            HostOs::Unsupported => ToolchainDescriptor::unresolved(),
        };
        debug!("{} toolchain: {found:?}", self.os);
        Ok(found)
    }

    fn capture(&self, args: &[&str]) -> Result<String> {
        self.runner
            .run(&argv(args.iter().copied()), self.env, RunOptions::CAPTURE)
    }

    fn xcode(&self) -> Result<ToolchainDescriptor> {
        let version = self.capture(&["clang", "-dumpversion"])?;
        Ok(ToolchainDescriptor::new(XCODE5, version.trim()))
    }

    fn gcc(&self) -> Result<ToolchainDescriptor> {
        let output = self.capture(&["gcc", "-dumpversion"])?;
        let major = gcc_major(&output);
        let number: u32 = major.parse().map_err(|_| BuildError::CompilerVersion {
            output: output.trim().to_string(),
        })?;
        let identifier = if number > GCC49_MAX_MAJOR { GCC5 } else { GCC49 };
        Ok(ToolchainDescriptor::new(identifier, major))
    }

    fn visual_studio(&self) -> Result<ToolchainDescriptor> {
        if let Some(found) = self.vswhere_install()? {
            return Ok(found);
        }
        Ok(self.legacy_install())
    }

    /// Visual Studio 2017 and newer, located through vswhere.
    fn vswhere_install(&self) -> Result<Option<ToolchainDescriptor>> {
        let Some(program_files) = self.env.get("ProgramFiles(x86)") else {
            return Ok(None);
        };
        let vswhere = format!("{program_files}/{VSWHERE}");
        if !self.fs.exists(&vswhere) {
            debug!("vswhere not found at {vswhere}");
            return Ok(None);
        }

        let listing = self.capture(&[vswhere.as_str(), "-all", "-property", "installationPath"])?;
        // Later entries win when several editions are installed side by side.
        let Some(install) = listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && self.fs.is_dir(line))
            .last()
        else {
            return Ok(None);
        };

        let version_file = HostOs::Windows.join(install, &[VC_TOOLS_VERSION_FILE]);
        if !self.fs.exists(&version_file) {
            return Ok(None);
        }

        for year in VSWHERE_YEARS {
            if !install.contains(&format!("\\Microsoft Visual Studio\\{year}\\")) {
                continue;
            }
            let version = self
                .fs
                .read_to_string(&version_file)
                .map_err(|e| BuildError::io("failed to read", &version_file, e))?;
            let version = version.trim();
            let tools = HostOs::Windows.join(install, &["VC", "Tools", "MSVC", version]) + "\\";
            return Ok(Some(
                ToolchainDescriptor::new(format!("VS{year}"), version)
                    .installed_at(format!("VS{year}_PREFIX"), tools),
            ));
        }
        Ok(None)
    }

    /// Visual Studio 2015 and 2013, known only by their common-tools variable.
    fn legacy_install(&self) -> ToolchainDescriptor {
        for (year, variable) in LEGACY_VS {
            let Some(common_tools) = self.env.get(variable) else {
                continue;
            };
            let version = legacy_vs_version(common_tools).unwrap_or(year);
            let root = HostOs::Windows.join(common_tools, &["..", ".."]) + "\\";
            return ToolchainDescriptor::new(format!("VS{year}x86"), version)
                .installed_at(format!("VS{year}_PREFIX"), root);
        }
        ToolchainDescriptor::unresolved()
    }
}

/// Leading major version of `gcc -dumpversion` output: everything before
/// the first period.
pub fn gcc_major(dump: &str) -> &str {
    let dump = dump.trim();
    dump.split_once('.').map_or(dump, |(major, _)| major)
}

/// Version embedded in a legacy Visual Studio path, e.g. `14.0` from
/// `C:\Program Files (x86)\Microsoft Visual Studio 14.0\Common7\Tools\`.
///
/// When several components carry the product prefix the last one wins.
/// Returns `None` when no component does.
pub fn legacy_vs_version(path: &str) -> Option<&str> {
    path.split('\\')
        .filter_map(|part| part.strip_prefix(VS_PRODUCT_PREFIX))
        .last()
}
