//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::expect_used)]

use std::fs;
use std::path::Path;

use payload_build::basetools::REQUIRED_TOOLS;
use payload_build::conf::CONF_FILES;
use tempfile::TempDir;

/// A workspace with BaseTools configuration templates but no built tools.
pub fn workspace() -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    let templates = tmp.path().join("BaseTools/Conf");
    fs::create_dir_all(&templates).expect("templates dir");
    for name in CONF_FILES {
        fs::write(templates.join(format!("{name}.template")), format!("# {name} template\n"))
            .expect("template");
    }
    tmp
}

/// Drop empty stand-ins for the prebuilt POSIX BaseTools binaries.
pub fn install_posix_tools(root: &Path) {
    let bin = root.join("BaseTools/Source/C/bin");
    fs::create_dir_all(&bin).expect("bin dir");
    for tool in REQUIRED_TOOLS {
        fs::write(bin.join(tool), "").expect("tool");
    }
}
