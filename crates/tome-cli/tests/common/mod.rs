#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

#[allow(dead_code)]
pub const META: &str = r#"{
  "Cumsprite": {
    "urls": ["https://www.oglaf.com/cumsprite/", "https://www.oglaf.com/cumsprite/2/"],
    "publishOrder": 0,
    "tags": ["Ivan", "Mistress"],
    "arcs": ["Cumsprite"]
  },
  "Glove": {
    "urls": ["https://www.oglaf.com/glove/"],
    "publishOrder": "1",
    "tags": ["Ivan"]
  }
}"#;

/// Scratch directory with a config file and a snapshot path.
pub struct Workspace {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::write(dir.path().join("config.toml"), "").unwrap();
        Self { dir }
    }

    /// Workspace whose snapshot already holds [`META`].
    pub fn with_snapshot() -> Self {
        let ws = Self::new();
        fs::write(ws.snapshot(), META).unwrap();
        ws
    }

    pub fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn snapshot(&self) -> PathBuf {
        self.dir.path().join("meta.json")
    }

    pub fn write_config(&self, toml: &str) {
        fs::write(self.config(), toml).unwrap();
    }

    pub fn read_snapshot(&self) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(self.snapshot()).unwrap()).unwrap()
    }

    /// `tome` pointed at this workspace's config and snapshot.
    pub fn cmd(&self) -> Command {
        tome_cmd(&self.config(), &self.snapshot(), self.dir.path())
    }
}

/// Create a configured `tome` command suitable for integration tests.
pub fn tome_cmd(config: &Path, snapshot: &Path, data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tome"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("TOME_DATA_DIR", data_dir);
    cmd.env_remove("TOME_CONFIG");
    cmd.env_remove("TOME_SNAPSHOT");
    cmd.env("NO_COLOR", "1");
    cmd.arg("--config").arg(config);
    cmd.arg("--snapshot").arg(snapshot);
    cmd
}
