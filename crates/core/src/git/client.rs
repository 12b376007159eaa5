//! Local checkouts via `git2`.

use std::path::{Path, PathBuf};

use git2::{Cred, FetchOptions, RemoteCallbacks, Repository};
use tracing::{debug, info, instrument};

use crate::errors::GitError;

/// Thin wrapper around a checked-out `git2::Repository`.
pub struct GitClient {
    repo: Repository,
    repo_path: PathBuf,
}

impl GitClient {
    /// Open an existing checkout at `repo_path`.
    pub fn open<P: AsRef<Path>>(repo_path: P) -> Result<Self, GitError> {
        let path = repo_path.as_ref();
        debug!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path)?;
        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    /// Clone `url` into `path`, fetching only the last `depth` commits.
    #[instrument(skip(token), fields(url = %url, path = %path.display()))]
    pub fn clone_shallow(
        url: &str,
        path: &Path,
        depth: u32,
        token: Option<&str>,
    ) -> Result<Self, GitError> {
        info!("cloning git repository");
        let mut callbacks = RemoteCallbacks::new();
        if let Some(tok) = token {
            let tok = tok.to_string();
            callbacks.credentials(move |_url, _username, _allowed| {
                Cred::userpass_plaintext("x-access-token", &tok)
            });
        }
        let mut fetch_opts = FetchOptions::new();
        fetch_opts.remote_callbacks(callbacks);
        fetch_opts.depth(i32::try_from(depth).unwrap_or(i32::MAX));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch_opts);
        let repo = builder.clone(url, path).map_err(|e| GitError::CloneFailed {
            url: url.to_string(),
            detail: e.message().to_string(),
        })?;
        info!("clone completed");
        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// SHA of the checked-out HEAD commit.
    pub fn head_sha(&self) -> Result<String, GitError> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo_with_commit(path: &Path) -> String {
        let repo = Repository::init(path).unwrap();
        std::fs::write(path.join("OWNERS"), "approvers:\n- alice\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("OWNERS")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();
        oid.to_string()
    }

    #[test]
    fn test_open_and_head_sha() {
        let dir = tempfile::tempdir().unwrap();
        let sha = init_repo_with_commit(dir.path());
        let client = GitClient::open(dir.path()).unwrap();
        assert_eq!(client.head_sha().unwrap(), sha);
        assert_eq!(client.repo_path(), dir.path());
    }

    #[test]
    fn test_open_missing_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GitClient::open(dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_clone_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = GitClient::clone_shallow(
            "file:///nonexistent/repo.git",
            &dir.path().join("acme").join("tool"),
            1,
            None,
        );
        assert!(matches!(result, Err(GitError::CloneFailed { .. })));
    }
}
