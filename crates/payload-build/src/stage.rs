//! Copying build outputs into a second source tree.
//!
//! Entries are applied in manifest order. A failure stops the copy; files
//! already copied stay where they are.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BuildError, Result};

/// One file to copy, both paths relative to their tree roots.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CopyEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Ordered list of files to stage. Duplicate destinations are allowed; the
/// later entry wins.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CopyManifest {
    pub entries: Vec<CopyEntry>,
}

impl CopyManifest {
    /// Parse a JSON array of `{ "source": ..., "destination": ... }` objects.
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).map_err(|e| BuildError::io("failed to read", path, e))?;
        serde_json::from_str(&text).map_err(|source| BuildError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Copy every manifest entry from `source_root` into `dest_root`, creating
/// destination directories as needed and overwriting existing files.
pub fn stage(manifest: &CopyManifest, source_root: &Path, dest_root: &Path) -> Result<()> {
    println!("Copy build outputs into {} ...", dest_root.display());
    for entry in &manifest.entries {
        let src = absolute(&source_root.join(&entry.source));
        let dst = absolute(&dest_root.join(&entry.destination));
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io("failed to create", parent, e))?;
        }
        println!("Copy:  {}\n  To:  {}", src.display(), dst.display());
        fs::copy(&src, &dst).map_err(|e| BuildError::io("failed to copy", &src, e))?;
    }
    println!("Done\n");
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
