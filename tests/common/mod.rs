//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::initialized();
//!     fixture.cmd().arg("ls").assert().success();
//! }
//! ```

use assert_cmd::Command;
use assert_fs::prelude::*;
use std::path::Path;
use std::process;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::init_git_repo;
    pub use super::TestFixture;
}

/// A temporary workspace root plus a command builder pointed at it.
pub struct TestFixture {
    pub root: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// An empty directory, not yet a workspace.
    pub fn new() -> Self {
        Self {
            root: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// A directory on which `sourcepipe init` already ran.
    pub fn initialized() -> Self {
        let fixture = Self::new();
        fixture.cmd().arg("init").assert().success();
        fixture
    }

    /// The binary with `--root` set and colors and logging quiet.
    pub fn cmd(&self) -> Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sourcepipe");
        cmd.arg("--root")
            .arg(self.root.path())
            .arg("--color")
            .arg("never")
            .env_remove("SOURCEPIPE_ROOT")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run `sourcepipe add` for every URL and expect success.
    pub fn add(&self, urls: &[&str]) -> &Self {
        self.cmd().arg("add").args(urls).assert().success();
        self
    }

    /// Contents of a workspace file.
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.root.path().join(relative))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative, e))
    }

    pub fn path(&self, relative: &str) -> std::path::PathBuf {
        self.root.path().join(relative)
    }
}

/// Create a git repository with `files` committed on `main`.
#[allow(dead_code)]
pub fn init_git_repo(dir: &Path, files: &[(&str, &str)]) {
    let git = |args: &[&str]| {
        let status = process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("Failed to run git");
        assert!(
            status.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&status.stderr)
        );
    };

    std::fs::create_dir_all(dir).expect("Failed to create repo directory");
    git(&["init", "-q", "-b", "main"]);
    git(&["config", "user.email", "test@example.com"]);
    git(&["config", "user.name", "Test User"]);
    git(&["config", "commit.gpgsign", "false"]);

    let child = assert_fs::fixture::ChildPath::new(dir);
    for (path, content) in files {
        child.child(path).write_str(content).expect("Failed to write file");
    }

    git(&["add", "-A"]);
    git(&["commit", "-q", "-m", "Initial commit"]);
}
