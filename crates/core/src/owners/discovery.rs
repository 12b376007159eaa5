//! Locating `OWNERS` and `OWNERS_ALIASES` files inside a checkout.

use std::path::{Component, Path, PathBuf};

use glob_match::glob_match;
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::OwnersConfig;
use crate::errors::OwnersError;

/// Repository-relative path with `/` separators, for glob matching.
fn relative_slash_path(repo_root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(repo_root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_excluded(rel: &str, exclude: &[String]) -> bool {
    exclude.iter().any(|pattern| glob_match(pattern, rel))
}

/// `root_dir` is relative and never climbs above where it is joined.
fn is_contained(root_dir: &Path) -> bool {
    root_dir
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// A regular file, or a symlink to a regular file that resolves inside
/// `repo_root`. Symlinked directories are not descended into.
fn is_counted_file(entry: &DirEntry, repo_root: &Path) -> bool {
    if entry.file_type().is_file() {
        return true;
    }
    if !entry.path_is_symlink() {
        return false;
    }
    let (Ok(target), Ok(root)) = (
        std::fs::canonicalize(entry.path()),
        std::fs::canonicalize(repo_root),
    ) else {
        debug!(path = %entry.path().display(), "dangling symlink");
        return false;
    };
    if !target.starts_with(&root) {
        warn!(
            path = %entry.path().display(),
            target = %target.display(),
            "symlink leaves the checkout, ignoring"
        );
        return false;
    }
    target.is_file()
}

/// Every ownership file beneath `repo_root/root_dir`, sorted by path.
///
/// `.git` directories are never entered, and files whose repository-relative
/// path matches an `exclude` glob are dropped. Entries that cannot be read
/// are logged and skipped; the rest of the walk continues.
pub fn find_owners_files(
    repo_root: &Path,
    root_dir: &Path,
    config: &OwnersConfig,
) -> Result<Vec<PathBuf>, OwnersError> {
    let start = repo_root.join(root_dir);
    if !is_contained(root_dir) || !start.is_dir() {
        return Err(OwnersError::RootNotFound(root_dir.display().to_string()));
    }

    let mut matches = Vec::new();
    let walker = WalkDir::new(&start)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == ".git"));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let err = OwnersError::WalkFailed {
                    path: e.path().unwrap_or(start.as_path()).display().to_string(),
                    detail: e.to_string(),
                };
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_name() != config.owners_file.as_str() || !is_counted_file(&entry, repo_root)
        {
            continue;
        }
        let rel = relative_slash_path(repo_root, entry.path());
        if is_excluded(&rel, &config.exclude) {
            trace!(path = %rel, "excluded");
            continue;
        }
        matches.push(entry.into_path());
    }

    debug!(root = %start.display(), count = matches.len(), "found ownership files");
    Ok(matches)
}

/// The alias file governing `root_dir`: the first one found walking from
/// `root_dir` up to the repository root.
pub fn find_local_aliases(
    repo_root: &Path,
    root_dir: &Path,
    config: &OwnersConfig,
) -> Option<PathBuf> {
    if !is_contained(root_dir) {
        return None;
    }
    root_dir
        .ancestors()
        .map(|dir| repo_root.join(dir).join(&config.aliases_file))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "approvers: []\n").unwrap();
    }

    fn rels(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files.iter().map(|f| relative_slash_path(root, f)).collect()
    }

    #[test]
    fn test_walk_whole_repo() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "OWNERS");
        touch(root, "pkg/kubelet/OWNERS");
        touch(root, "pkg/kubelet/cm/OWNERS");
        touch(root, "pkg/kubelet/cm/OWNERS.bak");
        touch(root, "docs/README.md");

        let files = find_owners_files(root, Path::new(""), &OwnersConfig::default()).unwrap();
        assert_eq!(
            rels(root, &files),
            vec!["OWNERS", "pkg/kubelet/OWNERS", "pkg/kubelet/cm/OWNERS"]
        );
    }

    #[test]
    fn test_walk_is_bounded_by_root_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "OWNERS");
        touch(root, "pkg/kubelet/OWNERS");
        touch(root, "pkg/proxy/OWNERS");

        let files =
            find_owners_files(root, Path::new("pkg/kubelet"), &OwnersConfig::default()).unwrap();
        assert_eq!(rels(root, &files), vec!["pkg/kubelet/OWNERS"]);
    }

    #[test]
    fn test_vendor_and_git_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "OWNERS");
        touch(root, "vendor/github.com/foo/OWNERS");
        touch(root, "staging/src/k8s.io/api/vendor/x/OWNERS");
        touch(root, ".git/OWNERS");

        let files = find_owners_files(root, Path::new(""), &OwnersConfig::default()).unwrap();
        assert_eq!(rels(root, &files), vec!["OWNERS"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_owners_file_inside_checkout_counts() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("repo");
        touch(&root, "shared/OWNERS.common");
        std::fs::create_dir_all(root.join("pkg")).unwrap();
        std::os::unix::fs::symlink(root.join("shared/OWNERS.common"), root.join("pkg/OWNERS"))
            .unwrap();

        // Outside the checkout, or pointing nowhere: ignored.
        touch(outer.path(), "elsewhere/OWNERS");
        std::fs::create_dir_all(root.join("cmd")).unwrap();
        std::os::unix::fs::symlink(outer.path().join("elsewhere/OWNERS"), root.join("cmd/OWNERS"))
            .unwrap();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::os::unix::fs::symlink(root.join("missing"), root.join("docs/OWNERS")).unwrap();

        let files = find_owners_files(&root, Path::new(""), &OwnersConfig::default()).unwrap();
        assert_eq!(rels(&root, &files), vec!["pkg/OWNERS"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_not_descended() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("repo");
        touch(&root, "OWNERS");
        touch(outer.path(), "elsewhere/OWNERS");
        std::os::unix::fs::symlink(outer.path().join("elsewhere"), root.join("linked")).unwrap();

        let files = find_owners_files(&root, Path::new(""), &OwnersConfig::default()).unwrap();
        assert_eq!(rels(&root, &files), vec!["OWNERS"]);
    }

    #[test]
    fn test_root_climbing_out_is_not_found() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("repo");
        touch(&root, "OWNERS");
        touch(outer.path(), "outside/OWNERS");
        touch(outer.path(), "outside/OWNERS_ALIASES");
        let config = OwnersConfig::default();

        let result = find_owners_files(&root, Path::new("../outside"), &config);
        assert!(matches!(result, Err(OwnersError::RootNotFound(_))));
        assert_eq!(find_local_aliases(&root, Path::new("../outside"), &config), None);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = find_owners_files(dir.path(), Path::new("nope"), &OwnersConfig::default());
        assert!(matches!(result, Err(OwnersError::RootNotFound(_))));
    }

    #[test]
    fn test_nearest_alias_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let config = OwnersConfig::default();
        touch(root, "OWNERS_ALIASES");
        touch(root, "staging/OWNERS_ALIASES");

        assert_eq!(
            find_local_aliases(root, Path::new("staging/src/k8s.io/api"), &config),
            Some(root.join("staging").join("OWNERS_ALIASES"))
        );
        assert_eq!(
            find_local_aliases(root, Path::new("pkg/kubelet"), &config),
            Some(root.join("OWNERS_ALIASES"))
        );
        assert_eq!(
            find_local_aliases(root, Path::new(""), &config),
            Some(root.join("OWNERS_ALIASES"))
        );
    }

    #[test]
    fn test_no_alias_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            find_local_aliases(dir.path(), Path::new("pkg"), &OwnersConfig::default()),
            None
        );
    }
}
