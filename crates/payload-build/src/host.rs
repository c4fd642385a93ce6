//! Host operating system family.
//!
//! Toolchain discovery, search-path wiring and binary naming all branch on
//! the host family. The family is a plain value so every branch can be
//! exercised on any machine.

use std::fmt;

/// Host operating system family, as far as the build front end cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostOs {
    /// macOS: Xcode clang toolchain.
    MacOs,
    /// Any other POSIX-like system: GCC toolchain.
    Posix,
    /// Windows: Visual Studio toolchain.
    Windows,
    /// Anything else. Resolution always fails here.
    Unsupported,
}

impl HostOs {
    /// Family of the machine this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else if cfg!(windows) {
            HostOs::Windows
        } else if cfg!(unix) {
            HostOs::Posix
        } else {
            HostOs::Unsupported
        }
    }

    /// POSIX-like hosts (macOS included) share the make-based tool flow.
    pub fn is_posix_like(self) -> bool {
        matches!(self, HostOs::MacOs | HostOs::Posix)
    }

    /// Separator between entries of `PATH`.
    pub fn path_list_separator(self) -> char {
        if self == HostOs::Windows { ';' } else { ':' }
    }

    /// Separator between path components.
    pub fn dir_separator(self) -> char {
        if self == HostOs::Windows { '\\' } else { '/' }
    }

    /// Suffix of native executables.
    pub fn exe_suffix(self) -> &'static str {
        if self == HostOs::Windows { ".exe" } else { "" }
    }

    /// Join path components with this host's separator.
    ///
    /// Paths are composed as strings rather than `PathBuf`s so that Windows
    /// layouts can be computed (and tested) on a POSIX machine.
    pub fn join(self, base: &str, parts: &[&str]) -> String {
        let sep = self.dir_separator();
        let mut out = base.trim_end_matches(sep).to_string();
        for part in parts {
            out.push(sep);
            out.push_str(part.trim_matches(sep));
        }
        out
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostOs::MacOs => "macos",
            HostOs::Posix => "posix",
            HostOs::Windows => "windows",
            HostOs::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}
