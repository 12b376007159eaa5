//! Run orchestration: from registry owners URLs to a membership report.
//!
//! The [`OwnersCounter`] processes each owners root in turn:
//!
//! 1. Locate the repository checkout and the declared root directory.
//! 2. Discover every `OWNERS` file beneath the root.
//! 3. Load the local alias table and pick the fallback table.
//! 4. Parse the files and fold them into the running membership sets.
//!
//! Failures are contained to the smallest unit they affect: a missing
//! checkout or root skips that owners root, a bad file skips that file, and
//! an invalid entity is only recorded as a diagnostic.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, OwnersConfig};
use crate::errors::{ConfigError, CoreError, GitError};
use crate::git::{GitClient, OwnersUrl, RepoRef};
use crate::identity::{IdentityValidator, UserLookup};
use crate::owners::{find_local_aliases, find_owners_files, AliasTable, OwnersFile};
use crate::resolve::{AliasResolver, Membership, MembershipAggregator};

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Parse registry owners URLs, dropping (and logging) any that do not point
/// into a GitHub repository.
pub fn plan(urls: &[String]) -> Vec<OwnersUrl> {
    urls.iter()
        .filter_map(|url| match OwnersUrl::parse(url) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(url = %url, error = %e, "skipping owners URL");
                None
            }
        })
        .collect()
}

/// Distinct repositories behind `roots`, in first-seen order, with
/// `extra` (normally the canonical repository) appended if not present.
pub fn repositories(roots: &[OwnersUrl], extra: Option<&RepoRef>) -> Vec<RepoRef> {
    let mut seen = HashSet::new();
    let mut repos = Vec::new();
    for repo in roots.iter().map(|r| &r.repo).chain(extra) {
        if seen.insert(repo.slug().to_ascii_lowercase()) {
            repos.push(repo.clone());
        }
    }
    repos
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// An owners root that contributed nothing, and why.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRoot {
    pub url: String,
    pub reason: String,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CountReport {
    pub membership: Membership,
    pub roots_processed: usize,
    pub roots_skipped: Vec<SkippedRoot>,
    pub files_processed: usize,
    pub files_skipped: usize,
    /// External identity checks performed (one per distinct literal name).
    pub identity_checks: usize,
    /// HEAD commit of each checkout that was counted.
    pub commits: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

/// Drives one counting run over checkouts in a workspace directory.
pub struct OwnersCounter<L> {
    owners: OwnersConfig,
    canonical: RepoRef,
    validator: IdentityValidator<L>,
    aggregator: MembershipAggregator,
    report: CountReport,
}

impl<L: UserLookup> OwnersCounter<L> {
    pub fn new(config: &AppConfig, validator: IdentityValidator<L>) -> Result<Self, ConfigError> {
        let canonical =
            RepoRef::from_slug(&config.repos.canonical).ok_or_else(|| ConfigError::InvalidValue {
                field: "repos.canonical".into(),
                detail: "canonical repo must be in 'org/repo' format".into(),
            })?;
        info!(canonical = %canonical, "initializing owners counter");
        Ok(Self {
            owners: config.owners.clone(),
            canonical,
            validator,
            aggregator: MembershipAggregator::new(),
            report: CountReport::default(),
        })
    }

    /// Count every owners root against checkouts beneath `workspace`.
    pub async fn run(mut self, roots: &[OwnersUrl], workspace: &Path) -> CountReport {
        let canonical_aliases = self.load_canonical_aliases(workspace);

        for root in roots {
            if let Err(e) = self.count_root(root, workspace, &canonical_aliases).await {
                warn!(url = %root.url, error = %e, "skipping owners root");
                self.report.roots_skipped.push(SkippedRoot {
                    url: root.url.clone(),
                    reason: e.to_string(),
                });
            }
        }

        self.report.identity_checks = self.validator.checks_performed();
        self.report.membership = self.aggregator.into_membership();
        info!(
            reviewers = self.report.membership.reviewer_count(),
            approvers = self.report.membership.approver_count(),
            roots = self.report.roots_processed,
            files = self.report.files_processed,
            identity_checks = self.report.identity_checks,
            "count complete"
        );
        self.report
    }

    /// The canonical repository's root alias table, or an empty table when
    /// there is no checkout or no usable alias file.
    fn load_canonical_aliases(&self, workspace: &Path) -> AliasTable {
        let dir = self.canonical.checkout_dir(workspace);
        if !dir.is_dir() {
            info!(canonical = %self.canonical, "no canonical checkout, fallback aliases empty");
            return AliasTable::default();
        }
        let path = dir.join(&self.owners.aliases_file);
        let table = AliasTable::load_or_empty(path.is_file().then_some(path.as_path()));
        info!(canonical = %self.canonical, count = table.len(), "loaded canonical aliases");
        table
    }

    async fn count_root(
        &mut self,
        root: &OwnersUrl,
        workspace: &Path,
        canonical_aliases: &AliasTable,
    ) -> Result<(), CoreError> {
        let repo_dir = root.repo.checkout_dir(workspace);
        if !repo_dir.is_dir() {
            return Err(GitError::CheckoutMissing(root.repo.slug()).into());
        }
        self.note_commit(&root.repo, &repo_dir);

        let root_dir = root.root_dir();
        let files = find_owners_files(&repo_dir, &root_dir, &self.owners)?;

        let local = AliasTable::load_or_empty(
            find_local_aliases(&repo_dir, &root_dir, &self.owners).as_deref(),
        );
        let fallback = if root.repo.is(&self.canonical.slug()) {
            &local
        } else {
            canonical_aliases
        };
        let resolver = AliasResolver::new(&local, Some(fallback));

        info!(repo = %root.repo, root = %root_dir.display(), files = files.len(), "processing owners root");
        let mut declarations = Vec::with_capacity(files.len());
        for file in &files {
            match OwnersFile::load(file) {
                Ok(declaration) => declarations.push(declaration),
                Err(e) => {
                    warn!(error = %e, "skipping ownership file");
                    self.report.files_skipped += 1;
                }
            }
        }

        self.aggregator
            .aggregate(&declarations, &resolver, &mut self.validator)
            .await;
        self.report.files_processed += declarations.len();
        self.report.roots_processed += 1;
        Ok(())
    }

    fn note_commit(&mut self, repo: &RepoRef, repo_dir: &Path) {
        let slug = repo.slug();
        if self.report.commits.contains_key(&slug) {
            return;
        }
        match GitClient::open(repo_dir).and_then(|client| client.head_sha()) {
            Ok(sha) => {
                info!(repo = %repo, sha = %sha, "counting checkout");
                self.report.commits.insert(slug, sha);
            }
            Err(e) => debug!(repo = %repo, error = %e, "checkout has no readable HEAD"),
        }
    }
}
