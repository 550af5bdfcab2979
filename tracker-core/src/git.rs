//! Git collaborator.
//!
//! Thin wrappers over `git` subprocesses. Any failure (binary missing, not a
//! repository, timeout) surfaces as `ExternalTool`; [`Git::info`] absorbs it
//! and returns `None` so callers can carry on without Git data.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde::Serialize;

use crate::commit::CommitInfo;
use crate::error::{Result, TrackerError};
use crate::models::short_hash;
use crate::process::run_bounded;

/// Branch recorded when Git cannot name the current branch.
pub const UNKNOWN_BRANCH: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitInfo {
    pub branch: String,
    /// Short hash of HEAD.
    pub commit: String,
    /// Number of entries in `git status --porcelain`.
    pub changes: usize,
}

impl GitInfo {
    pub fn has_changes(&self) -> bool {
        self.changes > 0
    }
}

#[derive(Debug, Clone)]
pub struct Git {
    timeout: Duration,
}

impl Default for Git {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

impl Git {
    /// Run `git <args>` in `dir` and return trimmed stdout.
    pub fn run(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.current_dir(dir).args(args);
        let output = run_bounded(cmd, self.timeout)?;
        if !output.success() {
            return Err(TrackerError::external(
                format!("git {}", args.join(" ")),
                output.stderr.trim().to_string(),
            ));
        }
        Ok(output.stdout.trim().to_string())
    }

    pub fn toplevel(&self, dir: &Path) -> Result<PathBuf> {
        self.run(dir, &["rev-parse", "--show-toplevel"])
            .map(PathBuf::from)
    }

    pub fn head(&self, dir: &Path) -> Result<String> {
        self.run(dir, &["rev-parse", "HEAD"])
    }

    pub fn current_branch(&self, dir: &Path) -> Result<String> {
        self.run(dir, &["branch", "--show-current"])
    }

    /// Lines of `git status --porcelain`; empty when the tree is clean.
    pub fn changed_files(&self, dir: &Path) -> Result<Vec<String>> {
        let out = self.run(dir, &["status", "--porcelain"])?;
        Ok(out.lines().map(str::to_string).collect())
    }

    pub fn last_subject(&self, dir: &Path) -> Result<String> {
        self.run(dir, &["log", "-1", "--pretty=format:%s"])
    }

    /// Branch, short HEAD and dirtiness, or `None` if Git is unavailable.
    pub fn info(&self, dir: &Path) -> Option<GitInfo> {
        let gathered = (|| -> Result<GitInfo> {
            let commit = self.head(dir)?;
            Ok(GitInfo {
                branch: self.current_branch(dir)?,
                commit: short_hash(&commit).to_string(),
                changes: self.changed_files(dir)?.len(),
            })
        })();

        match gathered {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "no git info available");
                None
            }
        }
    }

    /// Hash and subject of HEAD plus the current branch.
    pub fn commit_info(&self, dir: &Path) -> Result<CommitInfo> {
        let hash = self.head(dir)?;
        let subject = self.last_subject(dir)?;
        let branch = match self.current_branch(dir) {
            Ok(branch) if !branch.is_empty() => branch,
            Ok(_) => UNKNOWN_BRANCH.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read branch name");
                UNKNOWN_BRANCH.to_string()
            }
        };
        Ok(CommitInfo {
            hash,
            subject,
            branch,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .current_dir(dir)
            .args(args)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// A repository with one commit, or `None` when git is not installed.
    fn repo_with_commit(subject: &str) -> Option<tempfile::TempDir> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path();
        let ok = git(path, &["init", "-q", "-b", "main"])
            && git(path, &["config", "user.email", "dev@example.com"])
            && git(path, &["config", "user.name", "Dev"])
            && git(path, &["commit", "-q", "--allow-empty", "-m", subject]);
        ok.then_some(dir)
    }

    #[test]
    fn non_repository_has_no_info() {
        let dir = tempfile::tempdir().unwrap();
        let git = Git::default();
        assert!(git.info(dir.path()).is_none());
        assert!(matches!(
            git.toplevel(dir.path()),
            Err(TrackerError::ExternalTool { .. })
        ));
    }

    #[test]
    fn reads_commit_info_from_repository() {
        let Some(repo) = repo_with_commit("pt:3 done") else {
            return;
        };
        let git = Git::default();

        let info = git.commit_info(repo.path()).unwrap();
        assert_eq!(info.subject, "pt:3 done");
        assert_eq!(info.branch, "main");
        assert_eq!(info.hash.len(), 40);

        let summary = git.info(repo.path()).unwrap();
        assert_eq!(summary.commit.len(), 8);
        assert!(!summary.has_changes());

        std::fs::write(repo.path().join("new.txt"), "x").unwrap();
        assert_eq!(git.info(repo.path()).unwrap().changes, 1);
    }
}
