//! The directory holding one checkout per repository for a run.
//!
//! Checkouts live at `<root>/<org>/<repo>`. A temporary workspace is removed
//! when dropped; a caller-supplied directory is kept, and checkouts already
//! present in it are reused instead of re-cloned.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};

use super::client::GitClient;
use super::remote_url::{derive_git_remote_url, RepoRef};
use crate::config::AppConfig;
use crate::errors::GitError;

/// Outcome of [`Workspace::prepare`].
#[derive(Debug, Default)]
pub struct PrepareSummary {
    pub cloned: Vec<RepoRef>,
    pub reused: Vec<RepoRef>,
    pub failed: Vec<(RepoRef, String)>,
}

pub struct Workspace {
    root: PathBuf,
    // Held for its Drop, which deletes the directory.
    _temp: Option<TempDir>,
}

impl Workspace {
    /// A fresh temporary directory, removed when the workspace is dropped.
    pub fn temporary() -> Result<Self, GitError> {
        let temp = tempfile::Builder::new().prefix("ownerscount").tempdir()?;
        info!(path = %temp.path().display(), "created temporary workspace");
        Ok(Self {
            root: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// A persistent workspace at `path`, created if missing.
    pub fn at<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        info!(path = %path.display(), "using persistent workspace");
        Ok(Self {
            root: path.to_path_buf(),
            _temp: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn checkout_dir(&self, repo: &RepoRef) -> PathBuf {
        repo.checkout_dir(&self.root)
    }

    pub fn has_checkout(&self, repo: &RepoRef) -> bool {
        self.checkout_dir(repo).is_dir()
    }

    /// Make sure every repository in `repos` has a checkout. Repositories
    /// already present are reused; clone failures are collected, not raised.
    pub fn prepare(&self, repos: &[RepoRef], config: &AppConfig) -> PrepareSummary {
        let mut summary = PrepareSummary::default();
        for repo in repos {
            let dest = self.checkout_dir(repo);
            if dest.is_dir() {
                info!(repo = %repo, "reusing existing checkout");
                summary.reused.push(repo.clone());
                continue;
            }
            let url = derive_git_remote_url(
                &config.github.api_url,
                config.github.git_base_url.as_deref(),
                repo,
            );
            match GitClient::clone_shallow(
                &url,
                &dest,
                config.repos.clone_depth,
                config.github.token.as_deref(),
            ) {
                Ok(_) => summary.cloned.push(repo.clone()),
                Err(e) => {
                    warn!(repo = %repo, error = %e, "clone failed, repository will be skipped");
                    if dest.exists() {
                        let _ = std::fs::remove_dir_all(&dest);
                    }
                    summary.failed.push((repo.clone(), e.to_string()));
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_workspace_removed_on_drop() {
        let ws = Workspace::temporary().unwrap();
        let root = ws.root().to_path_buf();
        assert!(root.is_dir());
        drop(ws);
        assert!(!root.exists());
    }

    #[test]
    fn test_persistent_workspace_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkouts");
        let ws = Workspace::at(&path).unwrap();
        drop(ws);
        assert!(path.is_dir());
    }

    #[test]
    fn test_prepare_reuses_existing_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::at(dir.path()).unwrap();
        let repo = RepoRef::new("acme", "tool");
        std::fs::create_dir_all(ws.checkout_dir(&repo)).unwrap();

        let summary = ws.prepare(&[repo.clone()], &AppConfig::default());
        assert_eq!(summary.reused, vec![repo]);
        assert!(summary.cloned.is_empty());
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn test_prepare_collects_clone_failures() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::at(dir.path().join("ws")).unwrap();
        let mut config = AppConfig::default();
        config.github.git_base_url = Some(format!("file://{}/missing", dir.path().display()));
        let repo = RepoRef::new("acme", "tool");

        let summary = ws.prepare(&[repo.clone()], &config);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, repo);
        assert!(!ws.has_checkout(&repo));
    }
}
