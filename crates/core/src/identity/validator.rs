//! Memoized account-existence checks.
//!
//! [`IdentityValidator`] owns the run's validation cache. It is created empty
//! at the start of a run and dropped at the end; nothing is persisted. Each
//! distinct name costs at most one external check, whatever its outcome.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::GitHubError;

/// External existence check for an account name.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// `Ok(true)` if the account exists, `Ok(false)` if it definitely does
    /// not, `Err` if the check itself failed.
    async fn user_exists(&self, login: &str) -> Result<bool, GitHubError>;
}

/// Outcome of one identity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStatus {
    Exists,
    Missing,
    /// The check could not be completed; counts as invalid.
    CheckFailed(String),
}

impl UserStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Exists)
    }
}

/// Per-run cache of identity checks in front of a [`UserLookup`].
pub struct IdentityValidator<L> {
    lookup: L,
    cache: HashMap<String, UserStatus>,
    checks: usize,
}

impl<L: UserLookup> IdentityValidator<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            cache: HashMap::new(),
            checks: 0,
        }
    }

    /// Full outcome for `name`, checking externally only on a cache miss.
    pub async fn status(&mut self, name: &str) -> UserStatus {
        if let Some(status) = self.cache.get(name) {
            debug!(name, ?status, "identity cache hit");
            return status.clone();
        }

        self.checks += 1;
        let status = match self.lookup.user_exists(name).await {
            Ok(true) => UserStatus::Exists,
            Ok(false) => UserStatus::Missing,
            Err(e) => {
                warn!(name, error = %e, "identity check failed, treating as invalid");
                UserStatus::CheckFailed(e.to_string())
            }
        };
        debug!(name, ?status, "identity checked");
        self.cache.insert(name.to_string(), status.clone());
        status
    }

    /// Whether `name` is a currently existing account.
    pub async fn is_valid(&mut self, name: &str) -> bool {
        self.status(name).await.is_valid()
    }

    /// Cached outcome, without triggering a check.
    pub fn cached(&self, name: &str) -> Option<&UserStatus> {
        self.cache.get(name)
    }

    /// Number of external checks performed so far.
    pub fn checks_performed(&self) -> usize {
        self.checks
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}
