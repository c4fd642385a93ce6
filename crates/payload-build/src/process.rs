//! Running external commands.
//!
//! Every child process gets the [`EnvOverlay`] as its complete environment.
//! A launch failure and a nonzero exit are reported as distinct errors; the
//! caller decides whether either one ends the run.

use std::io::Write;
use std::process::{Command, Stdio};

use log::trace;

use crate::env::EnvOverlay;
use crate::error::{BuildError, Result};

/// How a command should be run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Print the command line before running it.
    pub echo: bool,
    /// Capture standard output and return it. Otherwise the child inherits
    /// this process's streams.
    pub capture: bool,
}

impl RunOptions {
    pub const CAPTURE: RunOptions = RunOptions {
        echo: false,
        capture: true,
    };
    pub const ECHO: RunOptions = RunOptions {
        echo: true,
        capture: false,
    };
}

/// Blocking command execution. There is no timeout: a child that never exits
/// blocks the caller forever.
pub trait Runner {
    /// Run `argv` (executable first) with `env` as its environment.
    ///
    /// Returns captured standard output when `opts.capture` is set, an empty
    /// string otherwise.
    fn run(&self, argv: &[String], env: &EnvOverlay, opts: RunOptions) -> Result<String>;
}

/// Runs commands on the real host.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostRunner;

impl Runner for HostRunner {
    fn run(&self, argv: &[String], env: &EnvOverlay, opts: RunOptions) -> Result<String> {
        let line = argv.join(" ");
        // Keep our own output ahead of whatever the child prints.
        let _ = std::io::stdout().flush();
        if opts.echo {
            println!("{line}");
        }

        let Some((program, args)) = argv.split_first() else {
            return Err(BuildError::Launch {
                command: line,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        let mut cmd = Command::new(program);
        cmd.args(args).env_clear().envs(env.iter());
        trace!("spawning {line}");

        let outcome = if opts.capture {
            cmd.stderr(Stdio::inherit())
                .output()
                .map(|out| (out.status, String::from_utf8_lossy(&out.stdout).into_owned()))
        } else {
            cmd.status().map(|status| (status, String::new()))
        };

        let result = match outcome {
            Ok((status, _)) if !status.success() => Err(BuildError::CommandFailed {
                command: line.clone(),
                status,
            }),
            Ok((_, stdout)) => Ok(stdout),
            Err(source) => Err(BuildError::Launch {
                command: line.clone(),
                source,
            }),
        };

        if result.is_err() && !opts.echo {
            println!("Error in running process:\n  {line}");
        }
        result
    }
}

/// Convenience for building an owned argument vector.
pub fn argv<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn host_env() -> EnvOverlay {
        EnvOverlay::inherit()
    }

    #[test]
    fn test_capture_returns_stdout() {
        let out = HostRunner
            .run(&argv(["echo", "hello"]), &host_env(), RunOptions::CAPTURE)
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_inherited_run_returns_empty() {
        let out = HostRunner
            .run(&argv(["true"]), &host_env(), RunOptions::default())
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_nonzero_exit_is_command_failed() {
        let err = HostRunner
            .run(&argv(["false"]), &host_env(), RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, BuildError::CommandFailed { .. }));
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let err = HostRunner
            .run(
                &argv(["this-tool-definitely-does-not-exist-12345"]),
                &host_env(),
                RunOptions::CAPTURE,
            )
            .unwrap_err();
        match err {
            BuildError::Launch { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_child_sees_overlay_only() {
        let mut env = host_env();
        env.set("PAYLOAD_BUILD_MARKER", "42");
        let out = HostRunner
            .run(
                &argv(["sh", "-c", "echo $PAYLOAD_BUILD_MARKER"]),
                &env,
                RunOptions::CAPTURE,
            )
            .unwrap();
        assert_eq!(out.trim(), "42");
    }

    #[test]
    fn test_child_keeps_non_unicode_variables() {
        use std::os::unix::ffi::OsStrExt;

        let mut env = host_env();
        env.set(
            "PAYLOAD_BUILD_LATIN1",
            std::ffi::OsStr::from_bytes(b"caf\xe9"),
        );
        let out = HostRunner
            .run(
                &argv(["sh", "-c", "printf %s \"${PAYLOAD_BUILD_LATIN1-UNSET}\""]),
                &env,
                RunOptions::CAPTURE,
            )
            .unwrap();
        assert_eq!(out, "caf\u{fffd}");
    }
}
