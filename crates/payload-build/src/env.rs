//! Environment overlay handed to every child process.
//!
//! The overlay starts as a snapshot of the inherited environment. The
//! preparation phase mutates it; after that it is only read, and each spawned
//! process receives exactly this set of variables.
//!
//! Values are kept as OS strings so inherited variables that are not valid
//! Unicode reach the children untouched. On Windows hosts names match without
//! regard to case and an existing name keeps its spelling (`Path` stays
//! `Path`).

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

use log::debug;

use crate::host::HostOs;

/// Name of the executable search variable.
pub const PATH: &str = "PATH";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<OsString, OsString>,
    ignore_case: bool,
}

impl EnvOverlay {
    /// Empty overlay, mostly useful in tests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn inherit() -> Self {
        let mut env: Self = std::env::vars_os().collect();
        env.set_host(HostOs::current());
        env
    }

    /// Apply the variable naming rules of `os`.
    pub fn set_host(&mut self, os: HostOs) {
        self.ignore_case = os == HostOs::Windows;
    }

    /// Stored spelling of `name`, if present.
    fn key(&self, name: &str) -> Option<&OsString> {
        if self.ignore_case {
            self.vars
                .keys()
                .find(|k| k.to_str().is_some_and(|k| k.eq_ignore_ascii_case(name)))
        } else {
            self.vars.get_key_value(OsStr::new(name)).map(|(k, _)| k)
        }
    }

    /// Value of `name` as text. A value that is not valid Unicode reads as
    /// absent here; see [`Self::get_os`].
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_os(name)?.to_str()
    }

    pub fn get_os(&self, name: &str) -> Option<&OsStr> {
        let key = self.key(name)?;
        self.vars.get(key).map(OsString::as_os_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.key(name).is_some()
    }

    /// Set or replace a variable.
    pub fn set(&mut self, name: &str, value: impl Into<OsString>) {
        let value = value.into();
        debug!("env: {name}={}", value.to_string_lossy());
        let key = self.key(name).cloned().unwrap_or_else(|| name.into());
        self.vars.insert(key, value);
    }

    /// Set a variable only if it is not already present. Returns whether the
    /// default was applied.
    pub fn set_default(&mut self, name: &str, value: impl Into<OsString>) -> bool {
        if self.contains(name) {
            debug!("env: keeping external {name}");
            return false;
        }
        self.set(name, value);
        true
    }

    /// Append a directory to the end of `PATH`.
    ///
    /// Inherited entries and their order are untouched. A directory that is
    /// already listed is not added again, so repeating the same sequence of
    /// appends leaves the variable unchanged.
    pub fn append_path(&mut self, os: HostOs, dir: &str) {
        let sep = os.path_list_separator();
        let mut updated = self.get_os(PATH).map(OsStr::to_os_string).unwrap_or_default();
        if updated.to_string_lossy().split(sep).any(|entry| entry == dir) {
            return;
        }
        if !updated.is_empty() {
            updated.push(sep.to_string());
        }
        updated.push(dir);
        self.set(PATH, updated);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    /// Variables that were added or changed relative to `base`.
    pub fn changes_since<'a>(&'a self, base: &EnvOverlay) -> Vec<(&'a OsStr, &'a OsStr)> {
        self.iter()
            .filter(|(k, v)| base.vars.get(*k).map(OsString::as_os_str) != Some(*v))
            .collect()
    }
}

impl<K: Into<OsString>, V: Into<OsString>> FromIterator<(K, V)> for EnvOverlay {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ignore_case: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_inherited_order() {
        let mut env: EnvOverlay = [("PATH", "/usr/bin:/bin")].into_iter().collect();
        env.append_path(HostOs::Posix, "/ws/BaseTools/BinWrappers/PosixLike");
        assert_eq!(
            env.get(PATH),
            Some("/usr/bin:/bin:/ws/BaseTools/BinWrappers/PosixLike")
        );
    }

    #[test]
    fn test_append_twice_is_stable() {
        let mut env: EnvOverlay = [("PATH", "C:\\Windows")].into_iter().collect();
        env.append_path(HostOs::Windows, "C:\\ws\\Bin");
        env.append_path(HostOs::Windows, "C:\\ws\\Wrappers");
        let once = env.clone();
        env.append_path(HostOs::Windows, "C:\\ws\\Bin");
        env.append_path(HostOs::Windows, "C:\\ws\\Wrappers");
        assert_eq!(env, once);
        assert_eq!(env.get(PATH), Some("C:\\Windows;C:\\ws\\Bin;C:\\ws\\Wrappers"));
    }

    #[test]
    fn test_append_to_missing_path() {
        let mut env = EnvOverlay::new();
        env.append_path(HostOs::Posix, "/tools");
        assert_eq!(env.get(PATH), Some("/tools"));
    }

    #[test]
    fn test_windows_path_spelling_is_kept() {
        let mut env: EnvOverlay = [("Path", "C:\\Windows;C:\\Tools")].into_iter().collect();
        env.set_host(HostOs::Windows);
        let base = env.clone();

        env.append_path(HostOs::Windows, "C:\\ws\\BaseTools\\Bin\\Win32");

        assert_eq!(env.get("Path"), Some("C:\\Windows;C:\\Tools;C:\\ws\\BaseTools\\Bin\\Win32"));
        assert_eq!(env.get(PATH), env.get("Path"));
        assert_eq!(env.iter().count(), 1);
        assert_eq!(
            env.changes_since(&base),
            vec![(
                OsStr::new("Path"),
                OsStr::new("C:\\Windows;C:\\Tools;C:\\ws\\BaseTools\\Bin\\Win32")
            )]
        );
    }

    #[test]
    fn test_windows_defaults_ignore_case() {
        let mut env: EnvOverlay = [("Openssl_Path", "D:\\ssl")].into_iter().collect();
        env.set_host(HostOs::Windows);
        assert!(!env.set_default("OPENSSL_PATH", "C:\\Openssl\\"));
        assert_eq!(env.get("OPENSSL_PATH"), Some("D:\\ssl"));
    }

    #[test]
    fn test_posix_names_are_case_sensitive() {
        let mut env: EnvOverlay = [("Path", "/x")].into_iter().collect();
        env.set_host(HostOs::Posix);
        assert!(!env.contains(PATH));
    }

    #[test]
    fn test_set_default_keeps_existing() {
        let mut env: EnvOverlay = [("OPENSSL_PATH", "D:\\ssl")].into_iter().collect();
        assert!(!env.set_default("OPENSSL_PATH", "C:\\Openssl\\"));
        assert_eq!(env.get("OPENSSL_PATH"), Some("D:\\ssl"));
        assert!(env.set_default("NASM_PREFIX", "C:\\Nasm\\"));
        assert_eq!(env.get("NASM_PREFIX"), Some("C:\\Nasm\\"));
    }

    #[test]
    fn test_changes_since() {
        let base: EnvOverlay = [("A", "1"), ("B", "2")].into_iter().collect();
        let mut env = base.clone();
        env.set("B", "3");
        env.set("C", "4");
        assert_eq!(
            env.changes_since(&base),
            vec![
                (OsStr::new("B"), OsStr::new("3")),
                (OsStr::new("C"), OsStr::new("4")),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_values_survive() {
        use std::os::unix::ffi::OsStringExt;

        let latin1 = OsString::from_vec(b"caf\xe9".to_vec());
        let mut env: EnvOverlay = [(OsString::from("LANG_NAME"), latin1.clone())]
            .into_iter()
            .collect();
        env.append_path(HostOs::Posix, "/tools");

        assert_eq!(env.get("LANG_NAME"), None);
        assert_eq!(env.get_os("LANG_NAME"), Some(latin1.as_os_str()));
        assert!(env.iter().any(|(k, v)| k == "LANG_NAME" && v == latin1.as_os_str()));
    }
}
