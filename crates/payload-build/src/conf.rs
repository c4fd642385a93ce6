//! Build system configuration directory (`Conf/`).
//!
//! Missing configuration files are seeded from the templates BaseTools ships.
//! Existing ones are never touched, so local edits survive every run.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{BuildError, Result};

pub const CONF_DIR: &str = "Conf";
pub const CONF_FILES: [&str; 3] = ["target", "tools_def", "build_rule"];

/// Create `<workspace>/Conf` and copy in any missing configuration file.
/// Returns the names that were seeded.
pub fn seed(workspace: &Path) -> Result<Vec<&'static str>> {
    let conf = workspace.join(CONF_DIR);
    fs::create_dir_all(&conf).map_err(|e| BuildError::io("failed to create", &conf, e))?;

    let mut seeded = Vec::new();
    for name in CONF_FILES {
        let txt = conf.join(format!("{name}.txt"));
        if txt.exists() {
            continue;
        }
        let template = workspace.join(format!("BaseTools/Conf/{name}.template"));
        fs::copy(&template, &txt).map_err(|e| BuildError::io("failed to copy", &template, e))?;
        debug!("seeded {} from {}", txt.display(), template.display());
        seeded.push(name);
    }
    Ok(seeded)
}
