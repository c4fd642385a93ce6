//! Optional `payload-build.toml` in the workspace root.
//!
//! Every setting has a default, so a workspace without the file builds the
//! SMM payload with the stock parameters.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{BuildError, Result};

pub const CONFIG_FILE: &str = "payload-build.toml";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub tools: ToolDefaults,
}

/// Parameters handed to the external build system.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Platform description file, relative to the workspace.
    #[serde(default = "default_platform")]
    pub platform: String,

    #[serde(default = "default_arch")]
    pub arch: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        BuildSection {
            platform: default_platform(),
            arch: default_arch(),
        }
    }
}

/// Fallback locations for auxiliary tools on Windows hosts. Used only when
/// the corresponding variable is absent from the environment.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolDefaults {
    #[serde(default = "default_nasm")]
    pub nasm_prefix: String,

    #[serde(default = "default_openssl")]
    pub openssl_path: String,

    #[serde(default = "default_iasl")]
    pub iasl_prefix: String,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        ToolDefaults {
            nasm_prefix: default_nasm(),
            openssl_path: default_openssl(),
            iasl_prefix: default_iasl(),
        }
    }
}

fn default_platform() -> String {
    "SmmPayloadPkg/SmmPayloadPkg.dsc".to_string()
}
fn default_arch() -> String {
    "X64".to_string()
}
fn default_nasm() -> String {
    "C:\\Nasm\\".to_string()
}
fn default_openssl() -> String {
    "C:\\Openssl\\".to_string()
}
fn default_iasl() -> String {
    "C:\\ASL\\".to_string()
}

impl BuildConfig {
    /// Load `payload-build.toml` from `root`, or defaults if there is none.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(BuildConfig::default());
        }

        let content =
            fs::read_to_string(&path).map_err(|e| BuildError::io("failed to read", &path, e))?;
        toml::from_str(&content).map_err(|source| BuildError::Config { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = BuildConfig::load(tmp.path()).unwrap();
        assert_eq!(config.build.platform, "SmmPayloadPkg/SmmPayloadPkg.dsc");
        assert_eq!(config.build.arch, "X64");
        assert_eq!(config.tools.nasm_prefix, "C:\\Nasm\\");
    }

    #[test]
    fn test_partial_override() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "[build]\narch = \"IA32\"\n\n[tools]\nopenssl_path = 'D:\\ssl\\'\n",
        )
        .unwrap();

        let config = BuildConfig::load(tmp.path()).unwrap();
        assert_eq!(config.build.arch, "IA32");
        assert_eq!(config.build.platform, "SmmPayloadPkg/SmmPayloadPkg.dsc");
        assert_eq!(config.tools.openssl_path, "D:\\ssl\\");
        assert_eq!(config.tools.iasl_prefix, "C:\\ASL\\");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[build]\narchitecture = 3\n").unwrap();
        let err = BuildConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(err, BuildError::Config { .. }));
    }
}
