use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::Error;

/// Clone a repository with full history into `target_dir`.
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Personal access tokens
/// - Any authentication configured in ~/.gitconfig
pub fn clone(url: &str, target_dir: &Path) -> Result<(), Error> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let output = Command::new("git")
        .args(["clone", "--quiet", "--", url])
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Provide helpful error message for common auth failures
        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository.\n\
                For private repos, ensure you have:\n\
                - SSH key added to ssh-agent\n\
                - Git credentials configured\n\
                - Personal access token set up\n\
                Error: {}",
                stderr.trim()
            )
        } else {
            stderr.trim().to_string()
        };

        // Don't leave a half-populated folder behind; it would be mistaken
        // for a finished clone on retry.
        if target_dir.exists() {
            let _ = fs::remove_dir_all(target_dir);
        }

        return Err(Error::GitClone {
            url: url.to_string(),
            message,
        });
    }

    Ok(())
}

/// Run `git <args>` inside `repo_dir` and return trimmed stdout.
pub fn run(repo_dir: &Path, args: &[&str]) -> Result<String, Error> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_dir)
        .args(args)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            path: repo_dir.display().to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: args.join(" "),
            path: repo_dir.display().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Check that `path` is the top level of a git working tree.
pub fn is_work_tree(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    match (
        run(path, &["rev-parse", "--show-toplevel"]),
        fs::canonicalize(path),
    ) {
        (Ok(top), Ok(canonical)) => fs::canonicalize(top).is_ok_and(|top| top == canonical),
        _ => false,
    }
}

/// The commit HEAD points at, or `None` for a repository without commits.
pub fn head_commit(repo_dir: &Path) -> Option<String> {
    run(repo_dir, &["rev-parse", "--verify", "--quiet", "HEAD"]).ok()
}

/// Number of commits reachable from HEAD.
pub fn commit_count(repo_dir: &Path) -> Result<u64, Error> {
    let count = run(repo_dir, &["rev-list", "--count", "HEAD"])?;
    count.parse().map_err(|_| Error::GitCommand {
        command: "rev-list --count HEAD".to_string(),
        path: repo_dir.display().to_string(),
        stderr: format!("unexpected output '{}'", count),
    })
}
