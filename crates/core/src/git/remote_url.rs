//! Owners URL parsing and host-aware Git remote URL derivation.
//!
//! The registry points at `OWNERS` files by URL, either through
//! `raw.githubusercontent.com` or through a `github.com` blob/tree link.
//! [`OwnersUrl`] splits such a URL into the repository it lives in and the
//! directory it roots; [`derive_git_remote_url`] turns that repository into
//! an HTTPS clone URL, honouring GitHub Enterprise API URLs.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::Regex;

use crate::errors::GitError;

const RAW_GITHUB_URL: &str =
    r"^https://raw\.githubusercontent\.com/([^/]+)/([^/]+)/([^/]+)/(.+)$";
const GITHUB_URL: &str = r"^https://github\.com/([^/]+)/([^/]+)/(blob|tree)/([^/]+)/(.+)$";

fn raw_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(RAW_GITHUB_URL).expect("valid raw URL regex"))
}

fn github_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GITHUB_URL).expect("valid github URL regex"))
}

/// An org or repository name usable as a single directory name.
fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

/// A relative path that cannot leave the directory it is joined onto.
fn stays_inside(path: &str) -> bool {
    !path.contains('\\')
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// A GitHub repository, identified by organization and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoRef {
    pub org: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(org: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            name: name.into(),
        }
    }

    /// Parse an `org/repo` slug.
    pub fn from_slug(slug: &str) -> Option<Self> {
        let mut parts = slug.trim().split('/').filter(|s| !s.is_empty());
        let org = parts.next()?;
        let name = parts.next()?.trim_end_matches(".git");
        if parts.next().is_some() || !is_plain_segment(org) || !is_plain_segment(name) {
            return None;
        }
        Some(Self::new(org, name))
    }

    /// `org/repo`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.org, self.name)
    }

    /// Case-insensitive comparison against an `org/repo` slug.
    pub fn is(&self, slug: &str) -> bool {
        Self::from_slug(slug).is_some_and(|other| {
            other.org.eq_ignore_ascii_case(&self.org) && other.name.eq_ignore_ascii_case(&self.name)
        })
    }

    /// Where this repository is checked out beneath `base`.
    pub fn checkout_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.org).join(&self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}

/// A parsed registry `owners` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnersUrl {
    /// The URL as written in the registry.
    pub url: String,
    pub repo: RepoRef,
    pub branch: String,
    /// Path inside the repository, e.g. `pkg/kubelet/OWNERS`.
    pub path: String,
    /// `true` for `github.com/.../tree/...` links, whose path is a directory.
    pub is_tree: bool,
}

impl OwnersUrl {
    /// Parse a raw-content or blob/tree GitHub URL.
    ///
    /// The org, repository and in-repo path must stay inside the checkout
    /// they map onto: `.`/`..` names, `..` path components and absolute
    /// paths are rejected.
    pub fn parse(url: &str) -> Result<Self, GitError> {
        let trimmed = url.trim();
        let unrecognized = || GitError::UnrecognizedUrl(trimmed.to_string());

        let (org, name, branch, path, is_tree) =
            if let Some(caps) = raw_url_regex().captures(trimmed) {
                (
                    caps[1].to_string(),
                    caps[2].to_string(),
                    caps[3].to_string(),
                    caps[4].to_string(),
                    false,
                )
            } else if let Some(caps) = github_url_regex().captures(trimmed) {
                (
                    caps[1].to_string(),
                    caps[2].to_string(),
                    caps[4].to_string(),
                    caps[5].to_string(),
                    &caps[3] == "tree",
                )
            } else {
                return Err(unrecognized());
            };

        let path = path.trim_end_matches('/').to_string();
        if !is_plain_segment(&org) || !is_plain_segment(&name) || !stays_inside(&path) {
            return Err(unrecognized());
        }
        Ok(Self {
            url: trimmed.to_string(),
            repo: RepoRef::new(org, name),
            branch,
            path,
            is_tree,
        })
    }

    /// Directory (relative to the repository root) that bounds the walk for
    /// this owners root. Empty means the repository root.
    pub fn root_dir(&self) -> PathBuf {
        let path = Path::new(&self.path);
        if self.is_tree {
            return path.to_path_buf();
        }
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    }
}

/// Derive the HTTPS clone URL for a GitHub repository.
///
/// Resolution order:
/// 1. If `git_base_url` is `Some(non-empty)`, use it as the base.
/// 2. Otherwise derive from `api_url`:
///    - `https://api.github.com` → `https://github.com`
///    - `https://<host>/api/v3`  → `https://<host>`
///    - Anything else            → strip trailing slash, use as-is
pub fn derive_git_remote_url(api_url: &str, git_base_url: Option<&str>, repo: &RepoRef) -> String {
    let base = derive_git_base_url(api_url, git_base_url);
    format!("{}/{}.git", base, repo.slug())
}

/// Derive just the Git base URL (without repo path).
///
/// See [`derive_git_remote_url`] for resolution rules.
pub fn derive_git_base_url(api_url: &str, git_base_url: Option<&str>) -> String {
    if let Some(explicit) = git_base_url {
        let trimmed = explicit.trim();
        if !trimmed.is_empty() {
            return trimmed.trim_end_matches('/').to_string();
        }
    }

    let url = api_url.trim().trim_end_matches('/');

    if url.eq_ignore_ascii_case("https://api.github.com") {
        return "https://github.com".to_string();
    }

    if let Some(base) = url.strip_suffix("/api/v3") {
        return base.to_string();
    }

    url.to_string()
}
