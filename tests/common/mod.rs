//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Environment the binary reads that must not leak in from the host.
const SCRUBBED_ENV: [&str; 9] = [
    "JOBSCOUT_DATA_DIR",
    "JOBSCOUT_LM_COMMAND",
    "JOBSCOUT_MODEL",
    "FREELANCER_API_KEY",
    "FREELANCER_OAUTH_TOKEN",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_CHEAP_MODEL",
    "OPENAI_EXPENSIVE_MODEL",
];

/// A private data directory plus helpers to drive the `jobscout` binary.
pub struct Fixture {
    root: TempDir,
    lm_command: Option<String>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        fs::create_dir_all(root.path().join("data")).expect("create data dir");
        Self {
            root,
            lm_command: None,
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join("seen_projects.json")
    }

    pub fn write_json(&self, path: &Path, value: &Value) {
        let text = serde_json::to_string_pretty(value).expect("serialize fixture");
        fs::write(path, text).expect("write fixture");
    }

    pub fn read_json(&self, path: &Path) -> Value {
        let text = fs::read_to_string(path)
            .unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
        serde_json::from_str(&text).expect("parse json")
    }

    /// Use a shell model backend that ignores the prompt and answers with
    /// the contents of `reply`.
    pub fn answer_with(&mut self, reply: &str) {
        let path = self.path("model_reply.txt");
        fs::write(&path, reply).expect("write model reply");
        self.lm_command = Some(format!(
            "sh -c 'cat >/dev/null; cat \"{}\"'",
            path.display()
        ));
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_jobscout"));
        for key in SCRUBBED_ENV {
            command.env_remove(key);
        }
        command
            .env("RUST_LOG", "jobscout=debug")
            .arg("--data-dir")
            .arg(self.data_dir())
            .args(args)
            .stdin(Stdio::null());
        if let Some(lm_command) = &self.lm_command {
            command.env("JOBSCOUT_LM_COMMAND", lm_command);
        }
        command.output().expect("run jobscout")
    }

    /// Run and require success, returning stdout parsed as JSON.
    pub fn run_json(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "jobscout {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
            panic!(
                "stdout of {args:?} is not JSON ({err}): {}",
                String::from_utf8_lossy(&output.stdout)
            )
        })
    }
}

/// Local model backends need a POSIX shell.
pub fn have_sh() -> bool {
    let present = Command::new("sh")
        .args(["-c", "true"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    if !present {
        eprintln!("Skipping: sh not available");
    }
    present
}
