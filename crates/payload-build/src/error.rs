//! Error taxonomy for the build front end.
//!
//! Every failure is fatal to the run. Inner components return these values
//! and only the binary's `main` turns them into an exit code.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::host::HostOs;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Unsupported operating system ({0}) !")]
    UnsupportedOs(HostOs),

    #[error("Could not find supported Visual Studio version !")]
    VisualStudioNotFound,

    #[error("Unknown target {0} !")]
    UnknownFlag(String),

    #[error("could not parse compiler version from `{output}`")]
    CompilerVersion { output: String },

    /// The process could not be started at all.
    #[error("failed to launch `{command}`")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("Build BaseTools failed, please check required build environment and utilities !")]
    BaseToolsRebuild {
        #[source]
        source: Box<BuildError>,
    },

    #[error("Failed to do Build SMM Payload!")]
    PayloadBuild {
        #[source]
        source: Box<BuildError>,
    },

    #[error("{action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid copy manifest {}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration file {}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl BuildError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
