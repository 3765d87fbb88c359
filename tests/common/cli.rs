//! Runner for the `sde` binary with fluent assertions.

use std::path::Path;
use std::process::Output;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Runs `sde` with an isolated config directory and no ambient settings.
pub struct CliRunner {
    home: TempDir,
    socket: Option<String>,
    envs: Vec<(String, String)>,
    timeout: Duration,
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CliRunner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp home"),
            socket: None,
            envs: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point the binary at a daemon socket.
    #[must_use]
    pub fn with_socket(mut self, path: &Path) -> Self {
        self.socket = Some(path.display().to_string());
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute with the given arguments.
    ///
    /// # Panics
    ///
    /// Panics if the binary cannot be started.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> CliResult {
        let mut cmd = Command::cargo_bin("sde").expect("sde binary not built");
        cmd.args(args)
            .env_remove("SDE_SOCKET")
            .env_remove("SDE_CONFIG")
            .env_remove("SDE_DEVICE")
            .env_remove("SDE_FORMAT")
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join("config"))
            .env("XDG_RUNTIME_DIR", self.home.path().join("run"))
            .env("RUST_LOG", "off")
            .timeout(self.timeout);
        if let Some(socket) = &self.socket {
            cmd.env("SDE_SOCKET", socket);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        let start = Instant::now();
        let output = cmd.output().expect("Failed to execute command");
        CliResult::from_output(&output, start.elapsed(), args)
    }

    /// Execute with `--robot` in front.
    #[must_use]
    pub fn run_robot(&self, args: &[&str]) -> CliResult {
        let mut full = vec!["--robot"];
        full.extend(args);
        self.run(&full)
    }
}

/// Captured output of one run.
#[derive(Debug, Clone)]
pub struct CliResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
    pub args: Vec<String>,
}

impl CliResult {
    fn from_output(output: &Output, duration: Duration, args: &[&str]) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration,
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success(),
            "Command {:?} failed with exit code {}: {}",
            self.args,
            self.exit_code,
            self.stderr
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(!self.success(), "Command {:?} unexpectedly succeeded", self.args);
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "stdout does not contain \"{text}\"\nActual stdout:\n{}",
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "stderr does not contain \"{text}\"\nActual stderr:\n{}",
            self.stderr
        );
        self
    }

    /// Parse stdout as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(self.stdout.trim())
            .unwrap_or_else(|_| panic!("Failed to parse JSON from stdout:\n{}", self.stdout))
    }

    /// Parse stderr as the robot-mode error object.
    #[must_use]
    pub fn error_json(&self) -> Value {
        serde_json::from_str(self.stderr.trim())
            .unwrap_or_else(|_| panic!("Failed to parse JSON from stderr:\n{}", self.stderr))
    }

    /// Assert a JSON field (JSON pointer syntax) of stdout.
    pub fn assert_json_field(&self, pointer: &str, expected: &Value) -> &Self {
        let json = self.json();
        let actual = json
            .pointer(pointer)
            .unwrap_or_else(|| panic!("JSON path {pointer} not found in:\n{json:#}"));
        assert_eq!(actual, expected, "JSON field {pointer} mismatch");
        self
    }
}
