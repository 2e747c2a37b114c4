//! Common test utilities and helpers
//!
//! Every command runs with `HOME` pointed at a temporary directory so a
//! developer's global configuration never leaks into the tests.

#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test command builder for the quick-clinic-push binary
pub struct TestCommand {
    cmd: Command,
}

impl TestCommand {
    pub fn new() -> Self {
        let cmd = Command::cargo_bin("quick-clinic-push").expect("Failed to find quick-clinic-push binary");
        Self { cmd }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.cmd.arg(arg.as_ref());
        }
        self
    }

    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg.as_ref());
        self
    }

    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.cmd.env(key.as_ref(), val.as_ref());
        self
    }

    pub fn stdin<S: AsRef<str>>(mut self, input: S) -> Self {
        self.cmd.write_stdin(input.as_ref());
        self
    }

    pub fn expect_success(mut self) -> TestAssertion {
        let assert = self.cmd.assert().success();
        TestAssertion { assert }
    }

    pub fn expect_failure(mut self) -> TestAssertion {
        let assert = self.cmd.assert().failure();
        TestAssertion { assert }
    }
}

impl Default for TestCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Test assertion wrapper with convenient methods
pub struct TestAssertion {
    assert: assert_cmd::assert::Assert,
}

impl TestAssertion {
    pub fn stdout_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    pub fn stdout_contains_all<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.assert = self.assert.stdout(predicate::str::contains(pattern.as_ref()));
        }
        Self { assert: self.assert }
    }

    pub fn stdout_lacks<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()).not());
        Self { assert }
    }

    pub fn stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stderr(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    pub fn done(self) -> assert_cmd::assert::Assert {
        self.assert
    }
}

/// Isolated project and home directories
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub home_dir: TempDir,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let home_dir = TempDir::new().expect("Failed to create home directory");
        let config_path = temp_dir.path().join(".quick-clinic/push/config.toml");

        Self {
            temp_dir,
            home_dir,
            config_path,
        }
    }

    pub fn init_config(&self) -> TestAssertion {
        self.command().arg("init").expect_success()
    }

    pub fn project_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A command bound to this environment's project and home
    pub fn command(&self) -> TestCommand {
        TestCommand::new()
            .env("HOME", self.home_dir.path().to_string_lossy())
            .arg("--project")
            .arg(self.project_path().to_string_lossy())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.command()
            .args(["config", "set", key, value])
            .expect_success()
            .done();
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

pub mod assertions {
    pub fn assert_path_exists<P: AsRef<std::path::Path>>(path: P) {
        assert!(
            path.as_ref().exists(),
            "Path should exist: {}",
            path.as_ref().display()
        );
    }
}
