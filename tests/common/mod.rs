//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Port 9 (discard) refuses connections quickly on loopback.
pub const UNREACHABLE_API: &str = "http://127.0.0.1:9/api";

/// A temporary workspace driven through the compiled `rsbsa` binary.
pub struct TestWorkspace {
    dir: TempDir,
}

/// Captured result of one CLI run.
#[derive(Debug)]
pub struct Run {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl Run {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }
}

impl TestWorkspace {
    /// Fresh workspace with a config pointing at an unreachable backend.
    pub fn new() -> Self {
        let workspace = Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        };
        workspace.ok(&["init", "--api-url", UNREACHABLE_API]);
        workspace
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn run(&self, args: &[&str]) -> Run {
        let output = Command::new(env!("CARGO_BIN_EXE_rsbsa"))
            .arg("--workspace")
            .arg(self.root())
            .args(args)
            .env_remove("RSBSA_API_URL")
            .env_remove("RSBSA_API_TOKEN")
            .env_remove("RUST_LOG")
            .output()
            .expect("run rsbsa");
        Run::from_output(output)
    }

    /// Run a command that must succeed.
    pub fn ok(&self, args: &[&str]) -> Run {
        let run = self.run(args);
        assert!(
            run.success,
            "rsbsa {args:?} failed\nstdout: {}\nstderr: {}",
            run.stdout, run.stderr
        );
        run
    }

    /// Run a command that must fail.
    pub fn fails(&self, args: &[&str]) -> Run {
        let run = self.run(args);
        assert!(
            !run.success,
            "rsbsa {args:?} unexpectedly succeeded\nstdout: {}",
            run.stdout
        );
        run
    }

    pub fn fill_required_details(&self) {
        for (field, value) in [
            ("barangay", "Taboc"),
            ("contact_number", "09171234567"),
            ("birth_date", "1990-01-01"),
            ("sex", "male"),
        ] {
            self.ok(&["set", "beneficiaryDetails", field, value]);
        }
    }
}
