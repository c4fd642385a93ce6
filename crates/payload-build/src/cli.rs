use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::error::BuildError;
use crate::orchestrator::{PlatformVariant, Target};

#[derive(Parser)]
#[command(name = "payload-build")]
#[command(about = "Detect the host toolchain and build the SMM payload")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Cmd>,

    /// Workspace root (defaults to the repository containing this tool).
    #[arg(long, short = 'C', global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Show debug logging (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Build flags: `/r` release, `/d` debug (default), `/qemu` QEMU platform.
    #[arg(value_name = "FLAG", allow_hyphen_values = true)]
    pub flags: Vec<String>,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Print the toolchain detected on this host.
    Toolchain,

    /// Print the environment the build runs with, as shell exports.
    ///
    /// Usage:
    ///   eval "$(payload-build env bash)"
    Env {
        #[arg(value_enum, default_value_t = Shell::Bash)]
        shell: Shell,
    },

    /// Copy built files into another source tree.
    Stage {
        /// JSON list of `{ "source", "destination" }` pairs.
        #[arg(long)]
        manifest: PathBuf,

        /// Tree the `source` paths are relative to.
        #[arg(long)]
        source: PathBuf,

        /// Tree the `destination` paths are relative to.
        #[arg(long)]
        dest: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Sh,
    Cmd,
}

/// Interpret the build flags. Order does not matter; later flags override
/// earlier ones.
pub fn parse_flags<S: AsRef<str>>(tokens: &[S]) -> Result<(Target, PlatformVariant), BuildError> {
    let mut target = Target::Debug;
    let mut platform = PlatformVariant::Real;
    for token in tokens {
        match token.as_ref() {
            "/r" => target = Target::Release,
            "/d" => target = Target::Debug,
            "/qemu" => platform = PlatformVariant::Qemu,
            other => return Err(BuildError::UnknownFlag(other.to_string())),
        }
    }
    Ok((target, platform))
}
