//! Filesystem queries used while detecting toolchains and prebuilt tools.

use std::io;
use std::path::Path;

/// Read-only view of the host filesystem.
pub trait FileProbe {
    fn exists(&self, path: &str) -> bool;
    fn is_dir(&self, path: &str) -> bool;
    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// The real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostFs;

impl FileProbe for HostFs {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn is_dir(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
