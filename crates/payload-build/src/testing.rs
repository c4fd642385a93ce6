//! Scripted stand-ins for the process runner and filesystem probe.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::process::ExitStatus;

use crate::env::EnvOverlay;
use crate::error::{BuildError, Result};
use crate::probe::FileProbe;
use crate::process::{RunOptions, Runner};

#[derive(Clone, Debug)]
pub enum Reply {
    Output(String),
    Exit(i32),
    NotFound,
}

/// Replies are keyed by the full command line; anything unscripted succeeds
/// with empty output.
#[derive(Default)]
pub struct FakeRunner {
    replies: HashMap<String, Reply>,
    pub calls: RefCell<Vec<(Vec<String>, RunOptions)>>,
    pub envs: RefCell<Vec<EnvOverlay>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, line: &str, reply: Reply) -> Self {
        self.replies.insert(line.to_string(), reply);
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(a, _)| a.join(" ")).collect()
    }
}

pub fn exit_status(code: i32) -> ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code as u32)
    }
}

impl Runner for FakeRunner {
    fn run(&self, argv: &[String], env: &EnvOverlay, opts: RunOptions) -> Result<String> {
        let line = argv.join(" ");
        self.calls.borrow_mut().push((argv.to_vec(), opts));
        self.envs.borrow_mut().push(env.clone());
        match self.replies.get(&line) {
            None => Ok(String::new()),
            Some(Reply::Output(text)) => Ok(text.clone()),
            Some(Reply::Exit(code)) => Err(BuildError::CommandFailed {
                command: line,
                status: exit_status(*code),
            }),
            Some(Reply::NotFound) => Err(BuildError::Launch {
                command: line,
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeFs {
    files: HashMap<String, String>,
    dirs: HashSet<String>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.dirs.insert(path.to_string());
        self
    }
}

impl FileProbe for FakeFs {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains(path)
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}
