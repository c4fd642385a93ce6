//! # payload-build
//!
//! Build front end for the SMM payload firmware.
//!
//! ```bash
//! payload-build                  # DEBUG build for real hardware
//! payload-build /r /qemu         # RELEASE build for QEMU
//! payload-build toolchain        # Show the detected toolchain
//! payload-build env bash         # Print the build environment
//! payload-build stage --manifest files.json --source . --dest ../sbl
//! ```
//!
//! A build run enters the workspace, detects the native toolchain, wires up
//! the environment, makes sure BaseTools are built, seeds `Conf/` and then
//! hands over to the external `build` command.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod app;
pub mod basetools;
pub mod cli;
pub mod conf;
pub mod config;
pub mod env;
pub mod error;
pub mod host;
pub mod orchestrator;
pub mod prepare;
pub mod probe;
pub mod process;
pub mod stage;
pub mod toolchain;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{BuildError, Result};
